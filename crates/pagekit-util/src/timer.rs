//! [§ 8.6 Timers](https://html.spec.whatwg.org/multipage/timers-and-user-prompts.html#timers)
//!
//! Only `setInterval`/`clearInterval` are modelled, against a virtual clock
//! owned by the [`Window`](crate::Window). Nothing runs until the clock is
//! advanced with [`Window::advance_by`](crate::Window::advance_by).

use std::fmt;
use std::time::Duration;

use pagekit_dom::DomTree;
use tracing::trace;

/// Handle returned by [`Window::set_interval`](crate::Window::set_interval).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What an interval wants after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Run again after another interval.
    Continue,
    /// Equivalent of calling `clearInterval` from inside the handler.
    Cancel,
}

/// Interval handler.
pub type IntervalCallback = Box<dyn FnMut(&DomTree) -> TimerAction>;

struct ScheduledInterval {
    id: TimerId,
    due_at: Duration,
    order: u64,
    interval: Duration,
    callback: IntervalCallback,
}

/// Pending intervals, ordered by due time and then by scheduling order.
#[derive(Default)]
pub(crate) struct TimerQueue {
    tasks: Vec<ScheduledInterval>,
    next_id: u64,
    next_order: u64,
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tasks.iter().map(|task| (task.id, task.due_at)))
            .finish()
    }
}

impl TimerQueue {
    pub(crate) fn schedule(&mut self, now: Duration, interval: Duration, callback: IntervalCallback) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let order = self.bump_order();
        self.tasks.push(ScheduledInterval {
            id,
            due_at: now.saturating_add(interval),
            order,
            interval,
            callback,
        });
        id
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Remove and return the earliest interval due at or before `limit`.
    fn pop_due(&mut self, limit: Duration) -> Option<ScheduledInterval> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due_at <= limit)
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(index, _)| index)?;
        Some(self.tasks.remove(index))
    }

    /// Run the earliest interval due at or before `limit` against `tree`.
    ///
    /// Returns the time it was due, or `None` if nothing is due. An interval
    /// whose next tick would fall past the end of the clock is dropped.
    pub(crate) fn run_next_due(&mut self, limit: Duration, tree: &DomTree) -> Option<Duration> {
        let mut task = self.pop_due(limit)?;
        let ran_at = task.due_at;
        if (task.callback)(tree) == TimerAction::Continue {
            match task.due_at.checked_add(task.interval) {
                Some(next) => {
                    task.due_at = next;
                    task.order = self.bump_order();
                    self.tasks.push(task);
                }
                None => trace!(id = ?task.id, "interval ran past the end of the clock"),
            }
        }
        Some(ran_at)
    }

    fn bump_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }
}

impl TimerId {
    /// Raw numeric handle, as `setInterval` would return it.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

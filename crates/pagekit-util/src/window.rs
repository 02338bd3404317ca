//! The document and the event loop that drives it.
//!
//! [§ 8.1.7 Event loops](https://html.spec.whatwg.org/multipage/webappapis.html#event-loops)
//!
//! A [`Window`] owns one [`DomTree`] and runs work against it as tasks.
//! After every task it performs a microtask checkpoint, which is where
//! queued mutation records reach their observers. Timers run on a virtual
//! clock that only moves when [`Window::advance_by`] is called, so tests
//! decide exactly when polling waits get a chance to run.

use std::time::Duration;

use pagekit_dom::{DocumentReadyState, DomTree, NodeId};
use tracing::trace;

use crate::config::HostConfig;
use crate::platform::Platform;
use crate::timer::{TimerAction, TimerId, TimerQueue};

/// A document plus its event loop.
#[derive(Debug)]
pub struct Window {
    document: DomTree,
    platform: Platform,
    timers: TimerQueue,
    now: Duration,
    /// Detached `div` that [`create`](crate::create) parses into.
    scratch: NodeId,
}

impl Window {
    /// A window around a fresh, still-loading document with no children.
    #[must_use]
    pub fn new(config: &HostConfig) -> Self {
        Self::with_document(DomTree::new(), config)
    }

    /// A window around an existing document.
    #[must_use]
    pub fn with_document(mut document: DomTree, config: &HostConfig) -> Self {
        let scratch = document.create_element("div");
        Self {
            document,
            platform: config.platform(),
            timers: TimerQueue::default(),
            now: Duration::ZERO,
            scratch,
        }
    }

    /// Read access to the document.
    #[must_use]
    pub const fn document(&self) -> &DomTree {
        &self.document
    }

    /// The strategies chosen when the window was created.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Time elapsed on the virtual clock.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Run `task` against the document, then perform a microtask checkpoint.
    pub fn run_task<R>(&mut self, task: impl FnOnce(&mut DomTree) -> R) -> R {
        let result = task(&mut self.document);
        self.perform_microtask_checkpoint();
        result
    }

    /// [§ 8.1.7.3 Perform a microtask checkpoint](https://html.spec.whatwg.org/multipage/webappapis.html#perform-a-microtask-checkpoint)
    ///
    /// Delivers queued mutation records until none are left.
    pub fn perform_microtask_checkpoint(&mut self) {
        while self.document.has_pending_mutations() {
            self.document.deliver_mutation_records();
        }
    }

    /// Update the document's readiness, dispatching `readystatechange`
    /// listeners synchronously, then perform a microtask checkpoint.
    pub fn set_ready_state(&mut self, state: DocumentReadyState) {
        trace!(%state, "readystatechange");
        self.run_task(|tree| tree.set_ready_state(state));
    }

    /// `setInterval(callback, interval)`. The first tick is one interval
    /// from now. A zero interval is clamped to one millisecond.
    pub fn set_interval<F>(&mut self, interval: Duration, callback: F) -> TimerId
    where
        F: FnMut(&DomTree) -> TimerAction + 'static,
    {
        let interval = interval.max(Duration::from_millis(1));
        self.timers.schedule(self.now, interval, Box::new(callback))
    }

    /// `clearInterval(id)`. Returns `false` if the timer was not pending.
    pub fn clear_interval(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Move the virtual clock forward by `delta`, running every interval
    /// that falls due along the way in due order. Each tick is its own task
    /// and is followed by a microtask checkpoint.
    ///
    /// The clock saturates at [`Duration::MAX`]. Returns the number of
    /// ticks run.
    pub fn advance_by(&mut self, delta: Duration) -> usize {
        let target = self.now.saturating_add(delta);
        let mut ran = 0;
        while let Some(due_at) = self.timers.run_next_due(target, &self.document) {
            self.now = self.now.max(due_at);
            ran += 1;
            self.perform_microtask_checkpoint();
        }
        self.now = target;
        trace!(?delta, ran, "advanced virtual clock");
        ran
    }

    /// Live mutation observer registrations on the document.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.document.observer_count()
    }

    /// Intervals still scheduled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Registered `readystatechange` listeners.
    #[must_use]
    pub fn ready_state_listener_count(&self) -> usize {
        self.document.ready_state_listener_count()
    }

    pub(crate) const fn document_mut(&mut self) -> &mut DomTree {
        &mut self.document
    }

    pub(crate) const fn scratch(&self) -> NodeId {
        self.scratch
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(&HostConfig::default())
    }
}

//! Integration tests for the window's virtual clock and interval timers.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use pagekit_dom::DomTree;
use pagekit_util::{TimerAction, Window};

const MS: Duration = Duration::from_millis(1);

/// An interval callback that counts its ticks and cancels itself after `limit`.
fn ticking(limit: usize) -> (Rc<Cell<usize>>, impl FnMut(&DomTree) -> TimerAction) {
    let ticks = Rc::new(Cell::new(0));
    let handle = Rc::clone(&ticks);
    let callback = move |_: &DomTree| {
        handle.set(handle.get() + 1);
        if handle.get() == limit {
            TimerAction::Cancel
        } else {
            TimerAction::Continue
        }
    };
    (ticks, callback)
}

#[test]
fn test_clock_moves_only_when_advanced() {
    let mut window = Window::default();
    assert_eq!(window.now(), Duration::ZERO);
    assert_eq!(window.advance_by(5 * MS), 0);
    assert_eq!(window.now(), 5 * MS);
}

#[test]
fn test_interval_ticks_until_cancelled() {
    let mut window = Window::default();
    let (ticks, callback) = ticking(3);
    let _ = window.set_interval(2 * MS, callback);
    assert_eq!(window.advance_by(3 * MS), 1);
    assert_eq!(window.advance_by(10 * MS), 2);
    assert_eq!(ticks.get(), 3);
    assert_eq!(window.pending_timers(), 0);
}

#[test]
fn test_clear_interval() {
    let mut window = Window::default();
    let (ticks, callback) = ticking(usize::MAX);
    let first = window.set_interval(MS, callback);
    let second = window.set_interval(MS, |_| TimerAction::Continue);
    assert_ne!(first, second);
    assert_eq!(second.as_u64(), first.as_u64() + 1);
    assert_eq!(window.pending_timers(), 2);

    assert!(window.clear_interval(first));
    assert!(!window.clear_interval(first));
    assert_eq!(window.pending_timers(), 1);
    let _ = window.advance_by(4 * MS);
    assert_eq!(ticks.get(), 0);

    assert!(window.clear_interval(second));
    assert_eq!(window.pending_timers(), 0);
}

#[test]
fn test_advance_saturates_at_end_of_clock() {
    let mut window = Window::default();
    let (ticks, callback) = ticking(3);
    let id = window.set_interval(MS, callback);
    assert_eq!(window.advance_by(MS), 1);
    assert_eq!(window.advance_by(Duration::MAX), 2);
    assert_eq!(ticks.get(), 3);
    assert_eq!(window.now(), Duration::MAX);
    assert!(!window.clear_interval(id));

    // Scheduled at the end of the clock: it ticks once, then has nowhere left to go.
    let late = window.set_interval(MS, |_| TimerAction::Continue);
    assert_eq!(window.advance_by(Duration::from_secs(1)), 1);
    assert_eq!(window.now(), Duration::MAX);
    assert_eq!(window.pending_timers(), 0);
    assert!(!window.clear_interval(late));
}

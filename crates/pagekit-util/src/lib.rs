//! DOM helpers and condition waiters for PageKit components.
//!
//! Everything here runs against a [`Window`]: a document plus the event
//! loop that drives it (tasks, microtask checkpoints, interval timers and
//! `readystatechange` dispatch). Host differences are captured once, when
//! the window is created, as a [`Platform`].
//!
//! # Waiters
//!
//! [`wait_until`] and its derived helpers run a completion action exactly
//! once, the first time a predicate over the tree holds:
//!
//! ```ignore
//! let mut window = Window::new(&HostConfig::default());
//! let body = wait_for_body(&mut window);
//! window.run_task(|tree| { /* build html + body */ });
//! assert!(body.now_or_never().is_some());
//! ```
//!
//! # DOM helpers
//!
//! [`matches`], [`closest`], [`closest_to`], [`contains`], [`create`],
//! [`insert`], [`is_framework_element`] and [`is_element_node`] mirror the
//! utilities page components use on the live document.

/// Host configuration loaded from JSON.
pub mod config;
/// Selector, containment and fragment helpers.
pub mod dom;
/// Capabilities and the strategies derived from them.
pub mod platform;
/// Interval timers driven by the window's virtual clock.
pub mod timer;
/// Condition and document-state waiters.
pub mod wait;
/// The document and its event loop.
pub mod window;

pub use config::{ConfigError, HostConfig};
pub use dom::{
    Created, FRAMEWORK_TAG_PREFIX, closest, closest_to, contains, create, insert,
    is_element_node, is_framework_element, matches,
};
pub use platform::{Capabilities, DEFAULT_POLL_INTERVAL, LookupStrategy, ObservationStrategy, Platform};
pub use timer::{TimerAction, TimerId};
#[allow(deprecated)]
pub use wait::wait_document_ready;
pub use wait::{
    CompletionGate, Deferred, WaitError, wait_for_body, wait_for_child, wait_for_child_callback,
    wait_until, when_body_available, when_document_interactive, when_document_state,
};
pub use window::Window;

//! Host capabilities and the strategies chosen from them.
//!
//! Older hosts lack mutation observers or native selector/containment
//! methods. Rather than probing on every call, a [`Platform`] is derived
//! from the [`Capabilities`] once, when a [`Window`](crate::Window) is
//! created, and every helper consults the stored choice.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

/// Interval between predicate checks when waits fall back to polling.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// What the host environment provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// `MutationObserver` is available.
    pub mutation_observer: bool,
    /// `Element.prototype.matches` (or a prefixed variant) is available.
    pub native_matches: bool,
    /// `Element.prototype.closest` is available.
    pub native_closest: bool,
    /// `Node.prototype.contains` is available.
    pub native_contains: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            mutation_observer: true,
            native_matches: true,
            native_closest: true,
            native_contains: true,
        }
    }
}

impl Capabilities {
    /// A host with none of the optional capabilities.
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            mutation_observer: false,
            native_matches: false,
            native_closest: false,
            native_contains: false,
        }
    }
}

/// How waits learn about tree changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationStrategy {
    /// Child-list mutation observer on the target's subtree.
    Mutation,
    /// Repeating timer that re-checks the predicate.
    Polling {
        /// Time between checks.
        interval: Duration,
    },
}

/// Whether a lookup uses the host's built-in method or a tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// Use the built-in method.
    Native,
    /// Walk the tree by hand.
    Fallback,
}

impl LookupStrategy {
    const fn from_capability(available: bool) -> Self {
        if available { Self::Native } else { Self::Fallback }
    }
}

/// Strategies fixed for the lifetime of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Used by [`wait_until`](crate::wait_until) and friends.
    pub observation: ObservationStrategy,
    /// Used by [`matches`](crate::matches).
    pub matches: LookupStrategy,
    /// Used by [`closest`](crate::closest).
    pub closest: LookupStrategy,
    /// Used by [`contains`](crate::contains) and [`insert`](crate::insert).
    pub contains: LookupStrategy,
}

impl Platform {
    /// Pick a strategy for every capability.
    ///
    /// A zero `poll_interval` is treated as one millisecond so a polling
    /// wait can never spin without the clock moving.
    #[must_use]
    pub fn select(capabilities: Capabilities, poll_interval: Duration) -> Self {
        let observation = if capabilities.mutation_observer {
            ObservationStrategy::Mutation
        } else {
            ObservationStrategy::Polling {
                interval: poll_interval.max(Duration::from_millis(1)),
            }
        };
        let platform = Self {
            observation,
            matches: LookupStrategy::from_capability(capabilities.native_matches),
            closest: LookupStrategy::from_capability(capabilities.native_closest),
            contains: LookupStrategy::from_capability(capabilities.native_contains),
        };
        debug!(?platform, "selected platform strategies");
        platform
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::select(Capabilities::default(), DEFAULT_POLL_INTERVAL)
    }
}

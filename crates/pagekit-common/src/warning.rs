//! Warnings with colored terminal output.
//!
//! Provides deduplication so that a page which repeats the same unsupported
//! construct a thousand times only reports it once.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use owo_colors::OwoColorize;

/// Global set of warnings we've already printed (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Record `key` and report whether it was new.
fn first_occurrence(key: String) -> bool {
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key)
}

/// Warn about an unsupported construct (prints once per unique message).
///
/// Returns `true` if the warning was printed, `false` if an identical
/// warning had already been reported.
///
/// # Example
/// ```ignore
/// let _ = warn_once("Selector", "unsupported pseudo-class ':hover'");
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let should_print = first_occurrence(format!("[{component}] {message}"));

    if should_print {
        eprintln!("{}", format!("[PageKit {component}] ⚠ {message}").yellow());
    }
    should_print
}

/// Clear all recorded warnings (call when switching to a new document)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_deduplicates() {
        assert!(warn_once("Test", "dedup probe message"));
        assert!(!warn_once("Test", "dedup probe message"));
        assert!(warn_once("Other", "dedup probe message"));
    }
}

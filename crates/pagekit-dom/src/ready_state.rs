//! Document readiness and `readystatechange` listeners.
//!
//! [§ 3.1.2 Current document readiness](https://html.spec.whatwg.org/multipage/dom.html#current-document-readiness)

use std::fmt;

use strum_macros::{AsRefStr, Display, EnumString};

use crate::DomTree;

/// [§ 3.1.2 `DocumentReadyState`](https://html.spec.whatwg.org/multipage/dom.html#documentreadystate)
///
/// "Each Document has a current document readiness, a string, initially
/// "complete"." Trees built incrementally start in `Loading` instead, the
/// state a parser-created document is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DocumentReadyState {
    /// The document is still being parsed.
    #[default]
    Loading,
    /// Parsing finished, sub-resources may still be loading.
    Interactive,
    /// The document and all its sub-resources finished loading.
    Complete,
}

/// Identifies one `readystatechange` listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What a listener wants after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    /// Stay subscribed.
    Keep,
    /// Equivalent of `removeEventListener` from inside the handler.
    Remove,
}

/// `readystatechange` handler.
pub type ReadyStateCallback = Box<dyn FnMut(&DomTree) -> ListenerAction>;

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(ListenerId, ReadyStateCallback)>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}

impl DomTree {
    /// [§ 3.1.3 readyState](https://html.spec.whatwg.org/multipage/dom.html#dom-document-readystate)
    #[must_use]
    pub const fn ready_state(&self) -> DocumentReadyState {
        self.ready_state
    }

    /// [§ 3.1.2 Update the current document readiness](https://html.spec.whatwg.org/multipage/dom.html#update-the-current-document-readiness)
    ///
    /// STEP 1: "If document's current document readiness equals
    ///          readinessValue, then return."
    /// STEP 2: "Set document's current document readiness to readinessValue."
    /// STEP 3: "Fire an event named readystatechange at document."
    ///
    /// Listeners run synchronously, in the order they were added.
    pub fn set_ready_state(&mut self, state: DocumentReadyState) {
        if self.ready_state == state {
            return;
        }
        self.ready_state = state;

        let mut listeners = std::mem::take(&mut self.ready_state_listeners.entries);
        let tree: &Self = self;
        listeners.retain_mut(|(_, callback)| callback(tree) == ListenerAction::Keep);
        listeners.append(&mut self.ready_state_listeners.entries);
        self.ready_state_listeners.entries = listeners;
    }

    /// `document.addEventListener("readystatechange", ...)`.
    pub fn add_ready_state_listener<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&Self) -> ListenerAction + 'static,
    {
        let registry = &mut self.ready_state_listeners;
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.entries.push((id, Box::new(callback)));
        id
    }

    /// `document.removeEventListener("readystatechange", ...)`.
    ///
    /// Returns `false` if no such listener was registered.
    pub fn remove_ready_state_listener(&mut self, id: ListenerId) -> bool {
        let entries = &mut self.ready_state_listeners.entries;
        let before = entries.len();
        entries.retain(|(listener, _)| *listener != id);
        entries.len() != before
    }

    /// Number of registered `readystatechange` listeners.
    #[must_use]
    pub fn ready_state_listener_count(&self) -> usize {
        self.ready_state_listeners.entries.len()
    }
}

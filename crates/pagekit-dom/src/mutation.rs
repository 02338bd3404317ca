//! Child-list mutation observation.
//!
//! [§ 4.3 Mutation observers](https://dom.spec.whatwg.org/#mutation-observers)
//!
//! Only the `childList` half of the standard is modelled: attribute and
//! character-data records are never produced. Records are queued on the
//! tree while it is mutated and handed to the observers' callbacks when the
//! owner of the tree performs a microtask checkpoint
//! ([`DomTree::deliver_mutation_records`]).

use std::fmt;

use crate::{DomTree, NodeId};

/// Identifies one observer registration on a [`DomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// [§ 4.3.1 Interface MutationObserver](https://dom.spec.whatwg.org/#dictdef-mutationobserverinit)
///
/// The subset of `MutationObserverInit` that this tree understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationObserverInit {
    /// "Set to true if mutations to target's children are to be observed."
    pub child_list: bool,
    /// "Set to true if mutations to not just target, but also target's
    /// descendants are to be observed."
    pub subtree: bool,
}

impl MutationObserverInit {
    /// Observe the target's own children only.
    #[must_use]
    pub const fn child_list() -> Self {
        Self {
            child_list: true,
            subtree: false,
        }
    }

    /// Observe child-list changes anywhere in the target's subtree.
    #[must_use]
    pub const fn child_list_subtree() -> Self {
        Self {
            child_list: true,
            subtree: true,
        }
    }
}

/// [§ 4.3.3 Interface MutationRecord](https://dom.spec.whatwg.org/#interface-mutationrecord)
///
/// A `childList` record: "target is the parent of the nodes that were
/// added or removed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The node whose children changed.
    pub target: NodeId,
    /// "Returns the nodes added."
    pub added_nodes: Vec<NodeId>,
    /// "Returns the nodes removed."
    pub removed_nodes: Vec<NodeId>,
    /// "Return the previous sibling of the added or removed nodes."
    pub previous_sibling: Option<NodeId>,
    /// "Return the next sibling of the added or removed nodes."
    pub next_sibling: Option<NodeId>,
}

/// What an observer wants after its callback ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverAction {
    /// Keep observing.
    Continue,
    /// Equivalent of calling `observer.disconnect()` from inside the callback.
    Disconnect,
}

/// Observer callback. Receives the batch of records queued since the last
/// delivery and read access to the tree.
pub type MutationCallback = Box<dyn FnMut(&[MutationRecord], &DomTree) -> ObserverAction>;

pub(crate) struct Registration {
    id: ObserverId,
    target: NodeId,
    init: MutationObserverInit,
    pending: Vec<MutationRecord>,
    callback: MutationCallback,
}

/// All observers registered on one tree, in registration order.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    entries: Vec<Registration>,
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|r| (r.id, r.target, r.init)))
            .finish()
    }
}

impl ObserverRegistry {
    pub(crate) fn register(
        &mut self,
        target: NodeId,
        init: MutationObserverInit,
        callback: MutationCallback,
    ) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push(Registration {
            id,
            target,
            init,
            pending: Vec::new(),
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.entries.iter().any(|r| !r.pending.is_empty())
    }

    pub(crate) fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.entries
            .iter_mut()
            .find(|r| r.id == id)
            .map(|r| std::mem::take(&mut r.pending))
            .unwrap_or_default()
    }

    /// [§ 4.3.2 Queue a mutation record](https://dom.spec.whatwg.org/#queue-a-mutation-record)
    ///
    /// `inclusive_ancestors` are the inclusive ancestors of `record.target`;
    /// "if node is not target and options["subtree"] is false, continue".
    pub(crate) fn queue(&mut self, record: &MutationRecord, inclusive_ancestors: &[NodeId]) {
        for reg in &mut self.entries {
            if !reg.init.child_list {
                continue;
            }
            let reaches = reg.target == record.target
                || (reg.init.subtree && inclusive_ancestors.contains(&reg.target));
            if reaches {
                reg.pending.push(record.clone());
            }
        }
    }

    pub(crate) fn take_all(&mut self) -> Vec<Registration> {
        std::mem::take(&mut self.entries)
    }

    /// Put delivered registrations back in front of anything that might
    /// have been registered meanwhile, preserving registration order.
    pub(crate) fn restore(&mut self, mut delivered: Vec<Registration>) {
        delivered.append(&mut self.entries);
        self.entries = delivered;
    }
}

impl DomTree {
    /// [§ 4.3.1 observe()](https://dom.spec.whatwg.org/#dom-mutationobserver-observe)
    ///
    /// Register `callback` for child-list mutations of `target` (and its
    /// descendants when `init.subtree` is set).
    pub fn observe<F>(&mut self, target: NodeId, init: MutationObserverInit, callback: F) -> ObserverId
    where
        F: FnMut(&[MutationRecord], &Self) -> ObserverAction + 'static,
    {
        self.observers.register(target, init, Box::new(callback))
    }

    /// [§ 4.3.1 disconnect()](https://dom.spec.whatwg.org/#dom-mutationobserver-disconnect)
    ///
    /// "The disconnect() method steps are: For each node of this's node list,
    /// remove any registered observer ... Empty this's record queue."
    ///
    /// Returns `false` if the observer was not registered.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// [§ 4.3.1 takeRecords()](https://dom.spec.whatwg.org/#dom-mutationobserver-takerecords)
    ///
    /// "Let records be a clone of this's record queue. Empty this's record
    /// queue. Return records."
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers.take_records(id)
    }

    /// Number of live observer registrations.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Whether any observer has records waiting for delivery.
    #[must_use]
    pub fn has_pending_mutations(&self) -> bool {
        self.observers.has_pending()
    }

    /// [§ 4.3.1 Notify mutation observers](https://dom.spec.whatwg.org/#notify-mutation-observers)
    ///
    /// "For each mo of notifySet: Let records be a clone of mo's record queue.
    /// Empty mo's record queue. ... If records is not empty, then invoke mo's
    /// callback."
    ///
    /// Observers whose callback answers [`ObserverAction::Disconnect`] are
    /// removed before this returns.
    pub fn deliver_mutation_records(&mut self) {
        let mut registrations = self.observers.take_all();
        let tree: &Self = self;
        registrations.retain_mut(|reg| {
            if reg.pending.is_empty() {
                return true;
            }
            let records = std::mem::take(&mut reg.pending);
            (reg.callback)(&records, tree) == ObserverAction::Continue
        });
        self.observers.restore(registrations);
    }

    pub(crate) fn queue_child_list_record(&mut self, record: MutationRecord) {
        if self.observers.len() == 0 {
            return;
        }
        let mut chain = vec![record.target];
        chain.extend(self.ancestors(record.target));
        self.observers.queue(&record, &chain);
    }
}

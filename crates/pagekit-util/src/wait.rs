//! Deferred condition waiters.
//!
//! A wait evaluates a predicate against the tree and runs its completion
//! action the first time the predicate holds, either right away or after a
//! later tree change. Each wait owns one observation session (a mutation
//! observer or an interval timer, per the window's [`Platform`]) and
//! releases it in the same step that completes.
//!
//! There is no cancellation. A predicate that never holds keeps its session
//! alive for the life of the window; dropping the window resolves pending
//! [`Deferred`] values to [`WaitError::Abandoned`].
//!
//! [`Platform`]: crate::Platform

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;
use pagekit_dom::{
    DocumentReadyState, DomTree, ListenerAction, MutationObserverInit, NodeId, ObserverAction,
};
use thiserror::Error;
use tracing::{debug, trace};

use crate::platform::ObservationStrategy;
use crate::timer::TimerAction;
use crate::window::Window;

/// Why a [`Deferred`] will never produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The window running the wait was dropped first.
    #[error("the window was dropped before the wait completed")]
    Abandoned,
}

/// Single-shot result of a wait.
///
/// Resolves once, with the value the wait produced. Already resolved when
/// the condition held at the time the wait started.
#[derive(Debug)]
#[must_use = "a Deferred does nothing unless polled"]
pub struct Deferred<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Deferred<T> {
    fn channel() -> (oneshot::Sender<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, WaitError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver
            .poll_unpin(cx)
            .map(|result| result.map_err(|oneshot::Canceled| WaitError::Abandoned))
    }
}

/// Once-only wrapper around a completion action.
///
/// The first [`take`](Self::take) hands out the action; every later call
/// gets `None`.
#[derive(Debug)]
pub struct CompletionGate<F> {
    action: Option<F>,
}

impl<F> CompletionGate<F> {
    /// Wrap `action`.
    #[must_use]
    pub const fn new(action: F) -> Self {
        Self {
            action: Some(action),
        }
    }

    /// The action, the first time only.
    pub const fn take(&mut self) -> Option<F> {
        self.action.take()
    }

    /// Whether the action has been handed out.
    #[must_use]
    pub const fn is_spent(&self) -> bool {
        self.action.is_none()
    }
}

/// Run `on_satisfied` once, the first time `predicate(tree, target)` holds.
///
/// The predicate is checked immediately; if it already holds,
/// `on_satisfied` runs before this returns and no session is created.
/// Otherwise the window's observation strategy decides when to re-check:
/// after every batch of child-list mutations under `target`, or on every
/// tick of a polling interval.
pub fn wait_until<P, F>(window: &mut Window, target: NodeId, predicate: P, on_satisfied: F)
where
    P: Fn(&DomTree, NodeId) -> bool + 'static,
    F: FnOnce() + 'static,
{
    observe_until(window, target, predicate, move |_| on_satisfied());
}

/// Shared engine of every condition wait. `completion` receives the tree in
/// the state that satisfied the predicate.
fn observe_until<P, F>(window: &mut Window, target: NodeId, predicate: P, completion: F)
where
    P: Fn(&DomTree, NodeId) -> bool + 'static,
    F: FnOnce(&DomTree) + 'static,
{
    if predicate(window.document(), target) {
        trace!(?target, "condition already satisfied");
        completion(window.document());
        return;
    }

    let mut gate = CompletionGate::new(completion);
    match window.platform().observation {
        ObservationStrategy::Mutation => {
            let observer = window.document_mut().observe(
                target,
                MutationObserverInit::child_list_subtree(),
                move |_records, tree| {
                    if !predicate(tree, target) {
                        return ObserverAction::Continue;
                    }
                    debug!(?target, "condition satisfied, disconnecting observer");
                    if let Some(completion) = gate.take() {
                        completion(tree);
                    }
                    ObserverAction::Disconnect
                },
            );
            debug!(?target, ?observer, "waiting on mutations");
        }
        ObservationStrategy::Polling { interval } => {
            let timer = window.set_interval(interval, move |tree| {
                if !predicate(tree, target) {
                    return TimerAction::Continue;
                }
                debug!(?target, "condition satisfied, clearing interval");
                if let Some(completion) = gate.take() {
                    completion(tree);
                }
                TimerAction::Cancel
            });
            debug!(?target, ?timer, ?interval, "polling for condition");
        }
    }
}

/// Callback form of [`wait_for_child`].
pub fn wait_for_child_callback<P, F>(window: &mut Window, parent: NodeId, predicate: P, callback: F)
where
    P: Fn(&DomTree, NodeId) -> bool + 'static,
    F: FnOnce() + 'static,
{
    wait_until(window, parent, predicate, callback);
}

/// Resolves the first time `predicate(tree, parent)` holds.
pub fn wait_for_child<P>(window: &mut Window, parent: NodeId, predicate: P) -> Deferred<()>
where
    P: Fn(&DomTree, NodeId) -> bool + 'static,
{
    let (sender, deferred) = Deferred::channel();
    wait_until(window, parent, predicate, move || {
        let _ = sender.send(());
    });
    deferred
}

fn has_body(tree: &DomTree, _: NodeId) -> bool {
    tree.body().is_some()
}

/// Resolves with the `body` element once the document has one.
pub fn wait_for_body(window: &mut Window) -> Deferred<NodeId> {
    let (sender, deferred) = Deferred::channel();
    observe_until(window, NodeId::ROOT, has_body, move |tree| {
        if let Some(body) = tree.body() {
            let _ = sender.send(body);
        }
    });
    deferred
}

/// Run `callback` once the document has a `body` element.
pub fn when_body_available<F>(window: &mut Window, callback: F)
where
    F: FnOnce() + 'static,
{
    wait_until(window, NodeId::ROOT, has_body, callback);
}

/// Older name of [`when_body_available`].
#[deprecated(note = "use `when_body_available`")]
pub fn wait_document_ready<F>(window: &mut Window, callback: F)
where
    F: FnOnce() + 'static,
{
    when_body_available(window, callback);
}

/// Run `callback` once, the first time `state_fn` accepts the document.
///
/// Checked immediately and then on every `readystatechange`. The listener
/// removes itself when it fires.
pub fn when_document_state<S, F>(window: &mut Window, state_fn: S, callback: F)
where
    S: Fn(&DomTree) -> bool + 'static,
    F: FnOnce(&DomTree) + 'static,
{
    if state_fn(window.document()) {
        callback(window.document());
        return;
    }

    let mut gate = CompletionGate::new(callback);
    let listener = window.document_mut().add_ready_state_listener(move |tree| {
        if !state_fn(tree) {
            return ListenerAction::Keep;
        }
        if let Some(callback) = gate.take() {
            debug!(state = %tree.ready_state(), "document state reached");
            callback(tree);
        }
        ListenerAction::Remove
    });
    debug!(?listener, "waiting for document state");
}

/// Resolves once the document is no longer loading.
pub fn when_document_interactive(window: &mut Window) -> Deferred<()> {
    let (sender, deferred) = Deferred::channel();
    when_document_state(
        window,
        |tree| tree.ready_state() != DocumentReadyState::Loading,
        move |_| {
            let _ = sender.send(());
        },
    );
    deferred
}

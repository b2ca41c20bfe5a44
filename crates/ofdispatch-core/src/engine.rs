//! The decision engine contract.

use crate::message::Decision;

/// A per-packet forwarding decision computation.
///
/// One engine instance lives inline in the dispatcher (single-threaded
/// mode) and one private instance lives inside every worker unit (pooled
/// mode). All instances of the same engine are interchangeable: a worker's
/// replica sees shared state only through [`apply_state`](Self::apply_state)
/// broadcasts and through the work items it processes itself.
pub trait DecisionEngine: Send + 'static {
    /// The work item this engine decides on.
    type Item: Send + 'static;

    /// The broadcast shared-state snapshot this engine consumes.
    ///
    /// Engines that build all their state from observed work items (the
    /// learning switch) use `()` and treat `apply_state` as a no-op.
    type State: Clone + Send + 'static;

    /// Replaces the engine's local state with a full snapshot.
    fn apply_state(&mut self, state: Self::State);

    /// Computes the forwarding decision for one work item.
    ///
    /// Returns `None` when no decision can be made (no route to the
    /// item's target); the caller drops the item and counts it, the
    /// engine must not panic.
    fn decide(&mut self, item: Self::Item) -> Option<Decision>;
}

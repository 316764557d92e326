//! The reconciliation strategy contract.
//!
//! Every algorithm implements [`SyncStrategy`]. The provided
//! [`sync_client`](SyncStrategy::sync_client) and
//! [`sync_server`](SyncStrategy::sync_server) wrap the algorithm-specific
//! exchange so stats and peer counters are always reset first and the byte
//! counts are always recorded afterwards, whether the exchange succeeds or
//! not.

use std::sync::Arc;

use async_trait::async_trait;
use reconcile_core::{Element, StatId, SyncId, SyncParams, SyncStats};

use crate::communicant::Communicant;
use crate::error::Result;
use crate::negotiation;

/// Whether a strategy's index holds a set or a multiset.
///
/// The orchestrator re-adds "peer has, I lack" results through its own add
/// path only for [`Semantics::Set`]; doing so for a multiset would invent
/// duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantics {
    Set,
    Multiset,
}

/// State every strategy carries: its private element index and its stats.
#[derive(Debug, Default)]
pub struct StrategyCore {
    elements: Vec<Arc<Element>>,
    stats: SyncStats,
}

impl StrategyCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Arc<Element>) {
        self.elements.push(element);
    }

    /// Remove the first element equal to `element`. Returns true if one was removed.
    pub fn remove_first(&mut self, element: &Element) -> bool {
        match self.elements.iter().position(|e| **e == *element) {
            Some(idx) => {
                self.elements.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn elements(&self) -> &[Arc<Element>] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }
}

/// A pluggable reconciliation algorithm.
///
/// Implementations provide the exchange for each role plus access to their
/// [`StrategyCore`]; everything else has a default. A strategy instance is a
/// single writer: the `&mut self` receivers keep two attempts from running
/// against it at once.
///
/// Results are *added* to `self_minus_other` (what I have that the peer lacks)
/// and `other_minus_self` (what the peer has that I lack). Existing contents
/// are never cleared.
#[async_trait]
pub trait SyncStrategy: Send + Sync {
    /// Human-readable name of the variant.
    fn name(&self) -> &str;

    /// Protocol variant announced during negotiation.
    fn sync_id(&self) -> SyncId;

    /// Set or multiset semantics of the element index.
    fn semantics(&self) -> Semantics;

    fn core(&self) -> &StrategyCore;

    fn core_mut(&mut self) -> &mut StrategyCore;

    /// Algorithm-specific client exchange. Called by [`SyncStrategy::sync_client`].
    async fn client_exchange(
        &mut self,
        comm: &mut Communicant,
        self_minus_other: &mut Vec<Arc<Element>>,
        other_minus_self: &mut Vec<Arc<Element>>,
    ) -> Result<()>;

    /// Algorithm-specific server exchange. Called by [`SyncStrategy::sync_server`].
    async fn server_exchange(
        &mut self,
        comm: &mut Communicant,
        self_minus_other: &mut Vec<Arc<Element>>,
        other_minus_self: &mut Vec<Arc<Element>>,
    ) -> Result<()>;

    /// Parameters this strategy announces and expects.
    fn sync_params(&self) -> SyncParams {
        SyncParams::new(self.sync_id())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sync entrypoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Connect as a client and compute differences with the peer's index.
    ///
    /// The peer must be running [`SyncStrategy::sync_server`] for the same
    /// variant. Neither index is updated.
    async fn sync_client(
        &mut self,
        comm: &mut Communicant,
        self_minus_other: &mut Vec<Arc<Element>>,
        other_minus_self: &mut Vec<Arc<Element>>,
    ) -> Result<()> {
        self.begin_attempt(comm);
        let result = self
            .client_exchange(comm, self_minus_other, other_minus_self)
            .await;
        self.finish_attempt(comm);
        result
    }

    /// Wait for a client and compute differences with its index.
    async fn sync_server(
        &mut self,
        comm: &mut Communicant,
        self_minus_other: &mut Vec<Arc<Element>>,
        other_minus_self: &mut Vec<Arc<Element>>,
    ) -> Result<()> {
        self.begin_attempt(comm);
        let result = self
            .server_exchange(comm, self_minus_other, other_minus_self)
            .await;
        self.finish_attempt(comm);
        result
    }

    /// Zero the stats and the peer's counters before any byte moves.
    fn begin_attempt(&self, comm: &mut Communicant) {
        self.stats().reset(StatId::All);
        comm.reset_counters();
    }

    /// Copy the peer's byte counts for this attempt into the stats.
    fn finish_attempt(&self, comm: &Communicant) {
        let stats = self.stats();
        stats.increment(StatId::Xmit, comm.xmit_bytes() as f64);
        stats.increment(StatId::Recv, comm.recv_bytes() as f64);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Negotiation
    // ─────────────────────────────────────────────────────────────────────────

    /// Announce [`SyncStrategy::sync_params`] to the peer.
    async fn send_sync_param(&self, comm: &mut Communicant, one_way: bool) -> Result<()> {
        negotiation::send_sync_params(comm, &self.sync_params(), one_way).await
    }

    /// Check the peer's announcement against [`SyncStrategy::sync_params`].
    async fn recv_sync_param(&self, comm: &mut Communicant, one_way: bool) -> Result<()> {
        negotiation::recv_sync_params(comm, &self.sync_params(), one_way).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Element index
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an element to the index. Returns true if it was added.
    fn add_elem(&mut self, element: Arc<Element>) -> bool {
        self.core_mut().push(element);
        true
    }

    /// Remove the first element equal to `element`. Returns true if the index shrank.
    fn del_elem(&mut self, element: &Element) -> bool {
        self.core_mut().remove_first(element)
    }

    fn num_elem(&self) -> usize {
        self.core().len()
    }

    /// Read-only traversal of the index.
    fn elements(&self) -> std::slice::Iter<'_, Arc<Element>> {
        self.core().elements().iter()
    }

    fn stats(&self) -> &SyncStats {
        self.core().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_remove_first_only() {
        let mut core = StrategyCore::new();
        core.push(Arc::new(Element::new("a")));
        core.push(Arc::new(Element::new("b")));
        core.push(Arc::new(Element::new("a")));

        assert!(core.remove_first(&Element::new("a")));
        assert_eq!(core.len(), 2);
        assert_eq!(core.elements()[0].as_str(), "b");
        assert_eq!(core.elements()[1].as_str(), "a");

        assert!(!core.remove_first(&Element::new("zzz")));
        assert_eq!(core.len(), 2);
    }
}

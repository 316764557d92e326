//! The Reconciler: one local collection, many peers, many strategies.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use reconcile_core::{Element, StatsSnapshot};
use reconcile_store::{ElementLog, FileLog};
use reconcile_sync::{Communicant, Semantics, SyncStrategy};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::builder::ReconcilerBuilder;
use crate::error::{ReconcileError, Result};

/// Largest element a single wire frame can carry.
pub const MAX_ELEMENT_LEN: usize = u32::MAX as usize;

/// Configuration for the Reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Elements whose canonical text is longer than this are rejected by
    /// `add_elem` with [`ReconcileError::SizeExceeded`].
    pub max_element_len: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_element_len: MAX_ELEMENT_LEN,
        }
    }
}

/// Stable handle for a registered peer.
///
/// Indices shift when peers are inserted or removed; a `PeerId` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

struct Peer {
    id: PeerId,
    comm: Communicant,
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Client,
    Server,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }
}

/// Coordinates a local element collection with an ordered list of peers
/// through an ordered list of strategies.
///
/// Every element accepted by [`Reconciler::add_elem`] lands in the local
/// store, in every registered strategy, and in the log if one is attached.
pub struct Reconciler {
    elements: Vec<Arc<Element>>,
    peers: Vec<Peer>,
    strategies: Vec<Box<dyn SyncStrategy>>,
    log: Option<Box<dyn ElementLog>>,
    config: ReconcilerConfig,
    created_at: Instant,
    next_peer_id: u64,
}

impl Reconciler {
    /// Start building a Reconciler.
    pub fn builder() -> ReconcilerBuilder {
        ReconcilerBuilder::new()
    }

    /// Create an in-memory Reconciler seeded with `data`.
    pub fn new(
        comms: Vec<Communicant>,
        strategies: Vec<Box<dyn SyncStrategy>>,
        data: Vec<Element>,
    ) -> Result<Self> {
        let mut reconciler = Self::empty(ReconcilerConfig::default());
        for comm in comms {
            reconciler.add_comm(comm, None);
        }
        for strategy in strategies {
            reconciler.add_strategy(strategy, None);
        }
        reconciler.seed(data)?;
        Ok(reconciler)
    }

    /// Create a Reconciler backed by the log file at `path`.
    ///
    /// The file is created if missing; existing lines are replayed into the
    /// store and every strategy without being written again.
    pub fn from_file(
        comms: Vec<Communicant>,
        strategies: Vec<Box<dyn SyncStrategy>>,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self> {
        let log = FileLog::open(path.as_ref()).map_err(|e| {
            ReconcileError::Construction(format!(
                "cannot open {}: {e}",
                path.as_ref().display()
            ))
        })?;

        let mut reconciler = Self::empty(ReconcilerConfig::default());
        for comm in comms {
            reconciler.add_comm(comm, None);
        }
        for strategy in strategies {
            reconciler.add_strategy(strategy, None);
        }
        reconciler.attach_log(Box::new(log))?;
        Ok(reconciler)
    }

    pub(crate) fn empty(config: ReconcilerConfig) -> Self {
        Self {
            elements: Vec::new(),
            peers: Vec::new(),
            strategies: Vec::new(),
            log: None,
            config,
            created_at: Instant::now(),
            next_peer_id: 0,
        }
    }

    /// Replay `log` into the store and strategies, then keep it for appends.
    pub(crate) fn attach_log(&mut self, mut log: Box<dyn ElementLog>) -> Result<()> {
        let replayed = log
            .replay()
            .map_err(|e| ReconcileError::Construction(format!("cannot replay log: {e}")))?;

        debug!(count = replayed.len(), "replaying element log");
        for element in replayed {
            self.insert(Arc::new(element));
        }
        self.log = Some(log);
        Ok(())
    }

    /// Add initial data, reporting oversized elements as construction failures.
    pub(crate) fn seed(&mut self, data: Vec<Element>) -> Result<()> {
        for element in data {
            self.add_elem(element).map_err(|e| match e {
                ReconcileError::SizeExceeded { .. } => {
                    ReconcileError::Construction(format!("initial data rejected: {e}"))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Limits this Reconciler was built with.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// True if accepted elements are appended to a log.
    pub fn is_logged(&self) -> bool {
        self.log.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Element Store
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an element to the store, to every strategy, and to the log.
    ///
    /// Nothing is modified if the element is too large or the log append
    /// fails.
    pub fn add_elem(&mut self, element: impl Into<Arc<Element>>) -> Result<()> {
        self.add_unflushed(element.into())?;
        self.flush_log()
    }

    /// Encode `value` as an element and add it.
    pub fn add_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let element = Element::from_value(value)?;
        self.add_elem(element)
    }

    /// Remove the first stored element equal to `element`.
    ///
    /// The removal cascades to every strategy. Returns true if the store
    /// shrank. Log-backed Reconcilers cannot remove elements, since the log
    /// is append-only.
    pub fn del_elem(&mut self, element: &Element) -> Result<bool> {
        if self.log.is_some() {
            return Err(ReconcileError::Unimplemented(
                "removing elements from a log-backed reconciler",
            ));
        }

        let Some(pos) = self.elements.iter().position(|e| **e == *element) else {
            return Ok(false);
        };
        self.elements.remove(pos);
        for strategy in &mut self.strategies {
            strategy.del_elem(element);
        }
        debug!(element = %element.id(), "element removed");
        Ok(true)
    }

    /// All stored elements, in insertion order.
    pub fn dump_elements(&self) -> &[Arc<Element>] {
        &self.elements
    }

    /// Number of stored elements, duplicates included.
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    fn check_size(&self, element: &Element) -> Result<()> {
        if element.len() > self.config.max_element_len {
            return Err(ReconcileError::SizeExceeded {
                len: element.len(),
                max: self.config.max_element_len,
            });
        }
        Ok(())
    }

    fn add_unflushed(&mut self, element: Arc<Element>) -> Result<()> {
        self.check_size(&element)?;
        if let Some(log) = self.log.as_mut() {
            log.append(&element)?;
        }
        self.insert(element);
        Ok(())
    }

    fn flush_log(&mut self) -> Result<()> {
        if let Some(log) = self.log.as_mut() {
            log.flush()?;
        }
        Ok(())
    }

    fn insert(&mut self, element: Arc<Element>) {
        for strategy in &mut self.strategies {
            strategy.add_elem(Arc::clone(&element));
        }
        self.elements.push(element);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Peers
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a peer at `position` (appended if `None` or past the end).
    pub fn add_comm(&mut self, comm: Communicant, position: Option<usize>) -> PeerId {
        let id = PeerId(self.next_peer_id);
        self.next_peer_id += 1;

        let position = position.map_or(self.peers.len(), |p| p.min(self.peers.len()));
        debug!(%id, position, peer = %comm.describe(), "peer registered");
        self.peers.insert(position, Peer { id, comm });
        id
    }

    /// Remove the peer registered as `id`. Returns false if it is unknown.
    pub fn del_comm(&mut self, id: PeerId) -> bool {
        match self.peer_index(id) {
            Some(index) => {
                self.peers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove and return the peer at `index`.
    pub fn del_comm_at(&mut self, index: usize) -> Option<Communicant> {
        if index < self.peers.len() {
            Some(self.peers.remove(index).comm)
        } else {
            None
        }
    }

    /// Number of registered peers.
    pub fn num_comm(&self) -> usize {
        self.peers.len()
    }

    /// Peer handles in sync order.
    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.iter().map(|p| p.id).collect()
    }

    /// Current index of the peer registered as `id`.
    pub fn peer_index(&self, id: PeerId) -> Option<usize> {
        self.peers.iter().position(|p| p.id == id)
    }

    /// Peer handle at `index`.
    pub fn comm(&self, index: usize) -> Option<&Communicant> {
        self.peers.get(index).map(|p| &p.comm)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Strategies
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a strategy at `position` (appended if `None` or past the end).
    ///
    /// The strategy is seeded with every element currently in the store.
    pub fn add_strategy(&mut self, mut strategy: Box<dyn SyncStrategy>, position: Option<usize>) {
        for element in &self.elements {
            strategy.add_elem(Arc::clone(element));
        }

        let position = position.map_or(self.strategies.len(), |p| p.min(self.strategies.len()));
        debug!(strategy = strategy.name(), position, "strategy registered");
        self.strategies.insert(position, strategy);
    }

    /// Remove and return the strategy at `index`.
    pub fn del_strategy(&mut self, index: usize) -> Option<Box<dyn SyncStrategy>> {
        if index < self.strategies.len() {
            Some(self.strategies.remove(index))
        } else {
            None
        }
    }

    pub fn strategy(&self, index: usize) -> Option<&dyn SyncStrategy> {
        self.strategies.get(index).map(|s| s.as_ref())
    }

    pub fn num_strategies(&self) -> usize {
        self.strategies.len()
    }

    /// Stats of the last attempt run by the strategy at `index`.
    pub fn stats(&self, index: usize) -> Option<StatsSnapshot> {
        self.strategies.get(index).map(|s| s.stats().snapshot())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────────

    /// Reconcile with every peer in order, acting as the client.
    ///
    /// Each peer is attempted even if an earlier one failed. Returns true
    /// only if every attempt succeeded.
    pub async fn start_sync(&mut self, strategy_index: usize) -> Result<bool> {
        self.run_sync(strategy_index, Role::Client).await
    }

    /// Reconcile with every peer in order, acting as the server.
    pub async fn listen_sync(&mut self, strategy_index: usize) -> Result<bool> {
        self.run_sync(strategy_index, Role::Server).await
    }

    async fn run_sync(&mut self, strategy_index: usize, role: Role) -> Result<bool> {
        if strategy_index >= self.strategies.len() {
            return Err(ReconcileError::NoSuchStrategy(strategy_index));
        }

        let mut failed = 0usize;
        let mut merged = 0usize;

        for index in 0..self.peers.len() {
            let mut self_minus_other = Vec::new();
            let mut other_minus_self = Vec::new();

            let strategy = &mut self.strategies[strategy_index];
            let peer = &mut self.peers[index];
            let peer_id = peer.id;

            let outcome = match role {
                Role::Client => {
                    strategy
                        .sync_client(&mut peer.comm, &mut self_minus_other, &mut other_minus_self)
                        .await
                }
                Role::Server => {
                    strategy
                        .sync_server(&mut peer.comm, &mut self_minus_other, &mut other_minus_self)
                        .await
                }
            };

            if let Err(e) = outcome {
                warn!(index, %peer_id, role = role.as_str(), error = %e, "sync attempt failed");
                failed += 1;
                continue;
            }

            debug!(
                index,
                %peer_id,
                role = role.as_str(),
                self_minus_other = self_minus_other.len(),
                other_minus_self = other_minus_self.len(),
                "sync attempt complete"
            );

            let semantics = self.strategies[strategy_index].semantics();
            match self.merge(other_minus_self, semantics) {
                Ok(count) => merged += count,
                Err(e) => {
                    warn!(index, %peer_id, error = %e, "merging peer elements failed");
                    failed += 1;
                }
            }
        }

        info!(
            strategy = self.strategies[strategy_index].name(),
            role = role.as_str(),
            peers = self.peers.len(),
            failed,
            merged,
            "sync round finished"
        );

        Ok(failed == 0)
    }

    /// Fold elements the peer had into local state.
    ///
    /// Set semantics go through the full add path so every strategy learns
    /// them, and the log is flushed once for the whole batch. Multiset
    /// results are left unmerged. Returns how many elements were added.
    fn merge(&mut self, received: Vec<Arc<Element>>, semantics: Semantics) -> Result<usize> {
        match semantics {
            Semantics::Set => {
                let count = received.len();
                let added = received
                    .into_iter()
                    .try_for_each(|element| self.add_unflushed(element));
                // Whatever was appended before a failure still reaches the log.
                self.flush_log()?;
                added?;
                Ok(count)
            }
            Semantics::Multiset => {
                if !received.is_empty() {
                    debug!(count = received.len(), "multiset results left unmerged");
                }
                Ok(0)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-peer counters
    // ─────────────────────────────────────────────────────────────────────────

    /// Bytes sent to the peer at `index` since its last reset.
    pub fn xmit_bytes(&self, index: usize) -> Result<u64> {
        Ok(self.peer(index)?.comm.xmit_bytes())
    }

    /// Bytes received from the peer at `index` since its last reset.
    pub fn recv_bytes(&self, index: usize) -> Result<u64> {
        Ok(self.peer(index)?.comm.recv_bytes())
    }

    /// Seconds since the peer at `index` was last reset, or since this
    /// Reconciler was created if it never was.
    pub fn sync_time(&self, index: usize) -> Result<f64> {
        let since = self.peer(index)?.comm.last_reset().unwrap_or(self.created_at);
        Ok(since.elapsed().as_secs_f64())
    }

    /// Listening port of the peer at `index`, if it has one.
    pub fn port(&self, index: usize) -> Option<u16> {
        self.peers.get(index).and_then(|p| p.comm.port())
    }

    fn peer(&self, index: usize) -> Result<&Peer> {
        self.peers.get(index).ok_or(ReconcileError::NoSuchPeer(index))
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("elements", &self.elements.len())
            .field("peers", &self.peer_ids())
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("logged", &self.log.is_some())
            .field("config", &self.config)
            .finish()
    }
}

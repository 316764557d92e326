//! Full-copy reconciliation.
//!
//! The client ships its whole index; the server computes both halves of the
//! difference and sends them back. Costs O(n) bytes regardless of how small
//! the difference is, which makes it the baseline other strategies are
//! measured against.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reconcile_core::{Element, ElementId, StatId, SyncId};

use crate::communicant::Communicant;
use crate::error::{Result, SyncError};
use crate::strategy::{Semantics, StrategyCore, SyncStrategy};

/// Reconciles by exchanging complete collections.
#[derive(Debug)]
pub struct FullSync {
    core: StrategyCore,
    semantics: Semantics,
    /// Occurrences per element, kept in step with the core index.
    counts: HashMap<ElementId, usize>,
}

impl FullSync {
    /// Set semantics: adding an element already in the index is a no-op.
    pub fn new() -> Self {
        Self::with_semantics(Semantics::Set)
    }

    /// Multiset semantics: duplicates are kept.
    pub fn multiset() -> Self {
        Self::with_semantics(Semantics::Multiset)
    }

    pub fn with_semantics(semantics: Semantics) -> Self {
        Self {
            core: StrategyCore::new(),
            semantics,
            counts: HashMap::new(),
        }
    }
}

impl Default for FullSync {
    fn default() -> Self {
        Self::new()
    }
}

/// Lists the index in insertion order, e.g. `full-sync (set): [a, b]`.
impl fmt::Display for FullSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let semantics = match self.semantics {
            Semantics::Set => "set",
            Semantics::Multiset => "multiset",
        };
        write!(f, "{} ({}): [", self.name(), semantics)?;
        for (i, element) in self.core.elements().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", element)?;
        }
        f.write_str("]")
    }
}

/// Multiset difference in both directions, preserving input order.
///
/// Returns `(mine \ theirs, theirs \ mine)`.
pub fn multiset_difference(
    mine: &[Arc<Element>],
    theirs: &[Arc<Element>],
) -> (Vec<Arc<Element>>, Vec<Arc<Element>>) {
    fn one_way(from: &[Arc<Element>], against: &[Arc<Element>]) -> Vec<Arc<Element>> {
        let mut available: HashMap<&Element, usize> = HashMap::new();
        for e in against {
            let key: &Element = e;
            *available.entry(key).or_default() += 1;
        }

        from.iter()
            .filter(|e| {
                let key: &Element = e;
                match available.get_mut(key) {
                    Some(n) if *n > 0 => {
                        *n -= 1;
                        false
                    }
                    _ => true,
                }
            })
            .cloned()
            .collect()
    }

    (one_way(mine, theirs), one_way(theirs, mine))
}

#[async_trait]
impl SyncStrategy for FullSync {
    fn name(&self) -> &str {
        "full-sync"
    }

    fn sync_id(&self) -> SyncId {
        SyncId::FullSync
    }

    fn semantics(&self) -> Semantics {
        self.semantics
    }

    fn core(&self) -> &StrategyCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StrategyCore {
        &mut self.core
    }

    async fn client_exchange(
        &mut self,
        comm: &mut Communicant,
        self_minus_other: &mut Vec<Arc<Element>>,
        other_minus_self: &mut Vec<Arc<Element>>,
    ) -> Result<()> {
        {
            let _comm_time = self.stats().scoped(StatId::CommTime)?;
            self.send_sync_param(comm, false).await?;
            comm.send_element_list(self.core.elements()).await?;
        }

        // The server answers only after it has computed the difference.
        let server_minus_client = {
            let _idle = self.stats().scoped(StatId::IdleTime)?;
            comm.recv_element_list().await?
        };
        let client_minus_server = {
            let _comm_time = self.stats().scoped(StatId::CommTime)?;
            comm.recv_element_list().await?
        };

        // Whatever the server claims only we hold must be in our index.
        let client_minus_server: Vec<Arc<Element>> =
            client_minus_server.into_iter().map(Arc::new).collect();
        let (unknown, _) = multiset_difference(&client_minus_server, self.core.elements());
        if let Some(first) = unknown.first() {
            return Err(SyncError::Strategy(format!(
                "{} reported {} elements missing from the local index, first {:?}",
                comm.describe(),
                unknown.len(),
                first.as_str()
            )));
        }

        tracing::debug!(
            "{}: client done with {}: {} mine only, {} theirs only",
            self.name(),
            comm.describe(),
            client_minus_server.len(),
            server_minus_client.len()
        );

        self_minus_other.extend(client_minus_server);
        other_minus_self.extend(server_minus_client.into_iter().map(Arc::new));
        Ok(())
    }

    async fn server_exchange(
        &mut self,
        comm: &mut Communicant,
        self_minus_other: &mut Vec<Arc<Element>>,
        other_minus_self: &mut Vec<Arc<Element>>,
    ) -> Result<()> {
        let client_elements: Vec<Arc<Element>> = {
            let _comm_time = self.stats().scoped(StatId::CommTime)?;
            self.recv_sync_param(comm, false).await?;
            comm.recv_element_list()
                .await?
                .into_iter()
                .map(Arc::new)
                .collect()
        };

        let (mine_only, theirs_only) = {
            let _comp_time = self.stats().scoped(StatId::CompTime)?;
            multiset_difference(self.core.elements(), &client_elements)
        };

        {
            let _comm_time = self.stats().scoped(StatId::CommTime)?;
            comm.send_element_list(&mine_only).await?;
            comm.send_element_list(&theirs_only).await?;
        }

        tracing::debug!(
            "{}: server done with {}: {} mine only, {} theirs only",
            self.name(),
            comm.describe(),
            mine_only.len(),
            theirs_only.len()
        );

        self_minus_other.extend(mine_only);
        other_minus_self.extend(theirs_only);
        Ok(())
    }

    fn add_elem(&mut self, element: Arc<Element>) -> bool {
        let count = self.counts.entry(element.id()).or_default();
        if self.semantics == Semantics::Set && *count > 0 {
            return false;
        }
        *count += 1;
        self.core.push(element);
        true
    }

    fn del_elem(&mut self, element: &Element) -> bool {
        if !self.core.remove_first(element) {
            return false;
        }
        let id = element.id();
        if let Some(count) = self.counts.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&id);
            }
        }
        true
    }
}

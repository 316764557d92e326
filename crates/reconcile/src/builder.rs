//! Builder for [`Reconciler`].

use std::path::PathBuf;

use reconcile_core::Element;
use reconcile_store::{ElementLog, FileLog};
use reconcile_sync::{Communicant, SyncStrategy};

use crate::error::{ReconcileError, Result};
use crate::reconciler::{Reconciler, ReconcilerConfig};

/// Assembles a [`Reconciler`] from peers, strategies, initial data and an
/// optional log.
///
/// When both a log and initial elements are given, the log is replayed
/// first and the initial elements are then added (and logged) on top.
#[derive(Default)]
pub struct ReconcilerBuilder {
    comms: Vec<Communicant>,
    strategies: Vec<Box<dyn SyncStrategy>>,
    elements: Vec<Element>,
    file: Option<PathBuf>,
    log: Option<Box<dyn ElementLog>>,
    config: ReconcilerConfig,
}

impl ReconcilerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a peer.
    pub fn comm(mut self, comm: Communicant) -> Self {
        self.comms.push(comm);
        self
    }

    /// Append a strategy.
    pub fn strategy(mut self, strategy: impl SyncStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Append an already boxed strategy.
    pub fn boxed_strategy(mut self, strategy: Box<dyn SyncStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn element(mut self, element: impl Into<Element>) -> Self {
        self.elements.push(element.into());
        self
    }

    pub fn elements<I>(mut self, elements: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        self.elements.extend(elements.into_iter().map(Into::into));
        self
    }

    /// Back the Reconciler with the log file at `path`.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Back the Reconciler with any [`ElementLog`].
    pub fn log(mut self, log: impl ElementLog + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    pub fn config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Reconciler> {
        let log: Option<Box<dyn ElementLog>> = match (self.file, self.log) {
            (Some(_), Some(_)) => {
                return Err(ReconcileError::Construction(
                    "both a log file and a custom log were given".into(),
                ))
            }
            (Some(path), None) => {
                let log = FileLog::open(&path).map_err(|e| {
                    ReconcileError::Construction(format!("cannot open {}: {e}", path.display()))
                })?;
                Some(Box::new(log) as Box<dyn ElementLog>)
            }
            (None, log) => log,
        };

        let mut reconciler = Reconciler::empty(self.config);
        for comm in self.comms {
            reconciler.add_comm(comm, None);
        }
        for strategy in self.strategies {
            reconciler.add_strategy(strategy, None);
        }
        if let Some(log) = log {
            reconciler.attach_log(log)?;
        }
        reconciler.seed(self.elements)?;
        Ok(reconciler)
    }
}

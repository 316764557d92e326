//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Once;

use async_trait::async_trait;
use bytes::Bytes;
use reconcile::Reconciler;
use reconcile_core::Element;
use reconcile_sync::{Communicant, FullSync, MemoryTransport, SyncError, Transport};

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Two peer handles linked in memory.
pub fn linked_pair() -> (Communicant, Communicant) {
    let (a, b) = MemoryTransport::pair();
    (Communicant::new(a), Communicant::new(b))
}

/// Elements from string literals.
pub fn elements(texts: &[&str]) -> Vec<Element> {
    texts.iter().map(|t| Element::new(*t)).collect()
}

/// Stored element texts, sorted.
pub fn sorted_texts(reconciler: &Reconciler) -> Vec<String> {
    let mut texts: Vec<String> = reconciler
        .dump_elements()
        .iter()
        .map(|e| e.as_str().to_string())
        .collect();
    texts.sort();
    texts
}

/// A Reconciler with one peer and one set-semantics [`FullSync`].
pub fn full_sync_reconciler(comm: Communicant, data: &[&str]) -> anyhow::Result<Reconciler> {
    let reconciler = Reconciler::builder()
        .comm(comm)
        .strategy(FullSync::new())
        .elements(elements(data))
        .build()?;
    Ok(reconciler)
}

/// Run one client round and one server round concurrently on strategy `index`.
///
/// Returns `(client_ok, server_ok)`.
pub async fn sync_rounds(
    client: &mut Reconciler,
    server: &mut Reconciler,
    index: usize,
) -> anyhow::Result<(bool, bool)> {
    let (client_ok, server_ok) = tokio::join!(client.start_sync(index), server.listen_sync(index));
    Ok((client_ok?, server_ok?))
}

/// A transport whose every operation fails.
///
/// Stands in for a peer whose connection is already broken.
#[derive(Debug, Default)]
pub struct FaultyTransport {
    label: String,
}

impl FaultyTransport {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[async_trait]
impl Transport for FaultyTransport {
    async fn send_frame(&self, _frame: Bytes) -> reconcile_sync::Result<()> {
        Err(SyncError::Transport(format!("{}: injected send fault", self.label)))
    }

    async fn recv_frame(&self) -> reconcile_sync::Result<Bytes> {
        Err(SyncError::Transport(format!("{}: injected recv fault", self.label)))
    }

    fn describe(&self) -> String {
        format!("faulty({})", self.label)
    }
}

/// A peer handle backed by a [`FaultyTransport`].
pub fn faulty_comm(label: &str) -> Communicant {
    Communicant::new(FaultyTransport::new(label))
}

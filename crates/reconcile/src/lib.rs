//! # Reconcile
//!
//! Reconcile collections held by independent peers with pluggable
//! algorithms, exchanging as little data as the algorithm allows.
//!
//! ## Overview
//!
//! A [`Reconciler`] owns three things:
//!
//! - **Elements**: the local collection, optionally mirrored to an
//!   append-only log
//! - **Peers**: an ordered list of [`Communicant`](sync::Communicant)s
//! - **Strategies**: reconciliation algorithms implementing
//!   [`SyncStrategy`](sync::SyncStrategy), addressed by index
//!
//! [`Reconciler::start_sync`] contacts every peer in order as a client;
//! [`Reconciler::listen_sync`] serves every peer in order. Whatever a peer
//! has that the local side lacks is merged back before the next peer is
//! contacted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reconcile::Reconciler;
//! use reconcile::sync::{Communicant, FullSync, MemoryTransport};
//!
//! async fn example() {
//!     let (here, there) = MemoryTransport::pair();
//!
//!     let mut reconciler = Reconciler::builder()
//!         .comm(Communicant::new(here))
//!         .strategy(FullSync::new())
//!         .element("a1")
//!         .build()
//!         .unwrap();
//!
//!     // `there` is handed to a peer running `listen_sync(0)`.
//!     # drop(there);
//!     let all_ok = reconciler.start_sync(0).await.unwrap();
//!     println!("synced: {all_ok}, now holding {:?}", reconciler.dump_elements());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `reconcile::core` - Elements, stats, negotiation parameters
//! - `reconcile::store` - Element logs
//! - `reconcile::sync` - Peer handles, transports, strategies

pub mod builder;
pub mod error;
pub mod reconciler;

// Re-export component crates
pub use reconcile_core as core;
pub use reconcile_store as store;
pub use reconcile_sync as sync;

// Re-export main types for convenience
pub use builder::ReconcilerBuilder;
pub use error::{ReconcileError, Result};
pub use reconciler::{PeerId, Reconciler, ReconcilerConfig, MAX_ELEMENT_LEN};

pub use reconcile_core::{Element, ElementId, StatId, StatsSnapshot};
pub use reconcile_sync::{Communicant, Semantics, SyncStrategy};

//! # Reconcile Sync
//!
//! The reconciliation protocol contract and the peer handles it runs over.
//!
//! ## Overview
//!
//! A [`SyncStrategy`] reconciles its private element index with the index of
//! a remote strategy of the same variant. One side runs
//! [`SyncStrategy::sync_client`], the other [`SyncStrategy::sync_server`],
//! both against a [`Communicant`] connected to the other side. Every attempt:
//!
//! 1. resets the strategy's [`SyncStats`](reconcile_core::SyncStats) and the
//!    communicant's byte counters,
//! 2. negotiates [`SyncParams`](reconcile_core::SyncParams),
//! 3. runs the variant's exchange,
//! 4. *adds* the differences to the caller's output vectors.
//!
//! ## Message Flow ([`FullSync`])
//!
//! ```text
//! Client                                Server
//!   |-------- SyncParams -------------->|
//!   |<------- OK / FAIL ----------------|
//!   |-------- client elements --------->|
//!   |<------- server \ client ----------|
//!   |<------- client \ server ----------|
//! ```
//!
//! ## Transports
//!
//! A [`Communicant`] wraps any [`Transport`]. [`MemoryTransport::pair`] links
//! two communicants in-process; [`TcpTransport`] carries length-prefixed
//! frames over TCP.

pub mod communicant;
pub mod error;
pub mod full_sync;
pub mod messages;
pub mod negotiation;
pub mod strategy;
pub mod transport;

pub use communicant::{Communicant, CommunicantConfig};
pub use error::{Result, SyncError};
pub use full_sync::FullSync;
pub use messages::{SYNC_FAIL_FLAG, SYNC_OK_FLAG};
pub use negotiation::{recv_sync_params, send_sync_params};
pub use strategy::{Semantics, StrategyCore, SyncStrategy};
pub use transport::{memory::MemoryTransport, tcp::TcpTransport, Transport};

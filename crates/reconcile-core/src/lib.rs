//! # Reconcile Core
//!
//! Pure primitives for set reconciliation: elements, sync statistics and
//! the parameters two peers negotiate before exchanging data.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Element`] - One reconciled item, shared as `Arc<Element>`
//! - [`ElementId`] - Content-addressed identifier (Blake3 of the canonical text)
//! - [`SyncStats`] - Byte and time accounting for one sync attempt
//! - [`ScopedTimer`] - Guard that commits a timer on every exit path
//! - [`SyncParams`] - What a peer announces during negotiation
//!
//! ## Canonical Forms
//!
//! An element has exactly one canonical text. Generic values are serialized
//! with compact JSON; the log line is the JSON string literal of that text and
//! the wire form is CBOR. See [`element`].

pub mod element;
pub mod error;
pub mod params;
pub mod stats;
pub mod types;

pub use element::Element;
pub use error::{CoreError, Result};
pub use params::{SyncId, SyncParams, PROTOCOL_VERSION};
pub use stats::{ScopedTimer, StatId, StatsSnapshot, SyncStats};
pub use types::ElementId;

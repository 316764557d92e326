//! # Reconcile Testkit
//!
//! Testing utilities for Reconcile.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known elements with their expected log and wire encodings
//! - **Generators**: Proptest strategies for element sets split across peers
//! - **Fixtures**: Linked peer handles, a faulty transport, and sync helpers
//!
//! ## Golden Vectors
//!
//! ```rust
//! use reconcile_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, line, wire) in verify_all_vectors() {
//!     println!("{name}: {matches} {line} {wire}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use reconcile_testkit::generators::split_sets;
//!
//! proptest! {
//!     #[test]
//!     fn union_is_reached(split in split_sets(16)) {
//!         // build two reconcilers from split.a() and split.b() ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use reconcile_testkit::fixtures::{full_sync_reconciler, linked_pair};
//!
//! let (a, b) = linked_pair();
//! let client = full_sync_reconciler(a, &["a1", "a2"]).unwrap();
//! let server = full_sync_reconciler(b, &["b1"]).unwrap();
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    elements, faulty_comm, full_sync_reconciler, init_tracing, linked_pair, sorted_texts,
    sync_rounds, FaultyTransport,
};
pub use generators::{random_elements, split_sets, SplitSets};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};

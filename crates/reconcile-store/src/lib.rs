//! # Reconcile Store
//!
//! Persistence for the local element collection. Provides a trait-based
//! interface with an append-only file implementation and an in-memory one.
//!
//! ## Overview
//!
//! The orchestrator never rewrites history: it replays the log once at
//! start-up and appends one line per element added afterwards.
//!
//! ## Key Types
//!
//! - [`ElementLog`] - The trait for replay + append
//! - [`FileLog`] - Line-oriented text file, one element per line
//! - [`MemoryLog`] - In-memory log for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reconcile_core::Element;
//! use reconcile_store::{ElementLog, FileLog};
//!
//! let mut log = FileLog::open("elements.log").unwrap();
//! let existing = log.replay().unwrap();
//! log.append(&Element::new("hello")).unwrap();
//! ```
//!
//! ## Format
//!
//! Each line is [`Element::to_line`](reconcile_core::Element::to_line): a JSON
//! string literal. There is no header and no index; blank lines are skipped
//! on replay.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use file::FileLog;
pub use memory::MemoryLog;
pub use traits::ElementLog;

//! Parameters exchanged during sync negotiation.
//!
//! Before any data moves, the client announces which protocol variant it is
//! running and how that variant is tuned. The server compares the
//! announcement against its own [`SyncParams`]; any difference aborts the
//! attempt on both sides.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Current negotiation format version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Identifies a reconciliation protocol variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncId {
    /// Exchange of complete collections.
    FullSync,
    /// Characteristic-polynomial interpolation.
    Interpolation,
    /// Invertible lookup tables.
    LookupTable,
    /// Any other variant, identified by number.
    Other(u16),
}

impl fmt::Display for SyncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncId::FullSync => f.write_str("full-sync"),
            SyncId::Interpolation => f.write_str("interpolation"),
            SyncId::LookupTable => f.write_str("lookup-table"),
            SyncId::Other(n) => write!(f, "other-{}", n),
        }
    }
}

/// What one side announces during negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncParams {
    pub sync_id: SyncId,
    pub version: u8,
    /// Named tuning knobs (error bounds in bits, set-size estimates, ...).
    pub tunables: BTreeMap<String, i64>,
}

impl SyncParams {
    /// Parameters for `sync_id` with no tunables.
    pub fn new(sync_id: SyncId) -> Self {
        Self {
            sync_id,
            version: PROTOCOL_VERSION,
            tunables: BTreeMap::new(),
        }
    }

    /// Add or replace a tunable.
    pub fn with(mut self, name: impl Into<String>, value: i64) -> Self {
        self.tunables.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.tunables.get(name).copied()
    }

    /// Describe the first difference from `other`, if any.
    pub fn mismatch(&self, other: &SyncParams) -> Option<String> {
        if self.sync_id != other.sync_id {
            return Some(format!("sync id {} != {}", self.sync_id, other.sync_id));
        }
        if self.version != other.version {
            return Some(format!("version {} != {}", self.version, other.version));
        }
        if self.tunables != other.tunables {
            let differing = self
                .tunables
                .keys()
                .chain(other.tunables.keys())
                .find(|k| self.tunables.get(*k) != other.tunables.get(*k))
                .cloned()
                .unwrap_or_default();
            return Some(format!(
                "tunable {:?}: {:?} != {:?}",
                differing,
                self.tunables.get(&differing),
                other.tunables.get(&differing)
            ));
        }
        None
    }

    /// CBOR encoding for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
    }
}

impl fmt::Display for SyncParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.sync_id, self.version)?;
        for (name, value) in &self.tunables {
            write!(f, " {}={}", name, value)?;
        }
        Ok(())
    }
}

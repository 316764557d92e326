//! Parameter negotiation run at the start of every sync attempt.
//!
//! The sending side announces its [`SyncParams`]. In two-way mode the
//! receiving side answers with [`SYNC_OK_FLAG`] or [`SYNC_FAIL_FLAG`] and
//! both sides fail with [`SyncError::ProtocolMismatch`] on a disagreement.
//! In one-way mode nothing is sent back: the sender cannot learn whether the
//! receiver accepted, and only the receiver fails on a mismatch.

use reconcile_core::SyncParams;

use crate::communicant::Communicant;
use crate::error::{Result, SyncError};
use crate::messages::{SYNC_FAIL_FLAG, SYNC_OK_FLAG};

/// Announce `params` to the peer.
pub async fn send_sync_params(
    comm: &mut Communicant,
    params: &SyncParams,
    one_way: bool,
) -> Result<()> {
    tracing::debug!("sending sync params [{}] to {}", params, comm.describe());
    comm.send_params(params).await?;

    if one_way {
        return Ok(());
    }

    match comm.recv_flag().await? {
        SYNC_OK_FLAG => Ok(()),
        SYNC_FAIL_FLAG => Err(SyncError::ProtocolMismatch(format!(
            "{} rejected [{}]",
            comm.describe(),
            params
        ))),
        got => Err(SyncError::UnexpectedFlag { got }),
    }
}

/// Receive the peer's parameters and check them against `expected`.
///
/// Returns the peer's parameters when they match.
pub async fn recv_sync_params(
    comm: &mut Communicant,
    expected: &SyncParams,
    one_way: bool,
) -> Result<SyncParams> {
    let theirs = comm.recv_params().await?;
    let mismatch = expected.mismatch(&theirs);

    if !one_way {
        let flag = if mismatch.is_none() {
            SYNC_OK_FLAG
        } else {
            SYNC_FAIL_FLAG
        };
        comm.send_flag(flag).await?;
    }

    match mismatch {
        None => {
            tracing::debug!("accepted sync params [{}] from {}", theirs, comm.describe());
            Ok(theirs)
        }
        Some(reason) => {
            tracing::warn!("rejecting sync params from {}: {}", comm.describe(), reason);
            Err(SyncError::ProtocolMismatch(reason))
        }
    }
}

//! Peer handles with byte accounting.
//!
//! A [`Communicant`] is one reachable peer. It layers typed send/receive
//! primitives over a [`Transport`] and counts every payload byte in both
//! directions. Counters are reset at the start of each sync attempt; the
//! lifetime totals never go down.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reconcile_core::{Element, SyncParams};

use crate::error::{Result, SyncError};
use crate::messages::limits::MAX_PREALLOC;
use crate::transport::Transport;

/// Configuration for a peer handle.
#[derive(Debug, Clone, Default)]
pub struct CommunicantConfig {
    /// Fail a receive that waits longer than this. `None` waits forever.
    pub recv_timeout: Option<Duration>,
}

/// One reachable peer.
pub struct Communicant {
    transport: Box<dyn Transport>,
    config: CommunicantConfig,
    xmit_bytes: u64,
    recv_bytes: u64,
    total_xmit_bytes: u64,
    total_recv_bytes: u64,
    last_reset: Option<Instant>,
}

impl Communicant {
    /// Create a peer handle over `transport`.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(transport, CommunicantConfig::default())
    }

    pub fn with_config(transport: impl Transport + 'static, config: CommunicantConfig) -> Self {
        Self {
            transport: Box::new(transport),
            config,
            xmit_bytes: 0,
            recv_bytes: 0,
            total_xmit_bytes: 0,
            total_recv_bytes: 0,
            last_reset: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accounting
    // ─────────────────────────────────────────────────────────────────────────

    /// Zero the per-attempt byte counters and remember when that happened.
    pub fn reset_counters(&mut self) {
        self.xmit_bytes = 0;
        self.recv_bytes = 0;
        self.last_reset = Some(Instant::now());
    }

    /// Bytes sent since the last reset.
    pub fn xmit_bytes(&self) -> u64 {
        self.xmit_bytes
    }

    /// Bytes received since the last reset.
    pub fn recv_bytes(&self) -> u64 {
        self.recv_bytes
    }

    /// Bytes sent over the lifetime of this handle.
    pub fn total_xmit_bytes(&self) -> u64 {
        self.total_xmit_bytes
    }

    /// Bytes received over the lifetime of this handle.
    pub fn total_recv_bytes(&self) -> u64 {
        self.total_recv_bytes
    }

    /// When the counters were last reset, if ever.
    pub fn last_reset(&self) -> Option<Instant> {
        self.last_reset
    }

    /// Listening port of the underlying transport, if it is a server.
    pub fn port(&self) -> Option<u16> {
        self.transport.listen_port()
    }

    pub fn describe(&self) -> String {
        self.transport.describe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Raw frames
    // ─────────────────────────────────────────────────────────────────────────

    /// Send one raw frame.
    pub async fn send_frame(&mut self, frame: Bytes) -> Result<()> {
        let len = frame.len() as u64;
        self.transport.send_frame(frame).await?;
        self.xmit_bytes += len;
        self.total_xmit_bytes += len;
        Ok(())
    }

    /// Receive one raw frame, honouring the configured timeout.
    pub async fn recv_frame(&mut self) -> Result<Bytes> {
        let frame = match self.config.recv_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.recv_frame())
                .await
                .map_err(|_| {
                    SyncError::Timeout(format!(
                        "no frame from {} within {:?}",
                        self.transport.describe(),
                        limit
                    ))
                })??,
            None => self.transport.recv_frame().await?,
        };

        let len = frame.len() as u64;
        self.recv_bytes += len;
        self.total_recv_bytes += len;
        Ok(frame)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed primitives
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn send_long(&mut self, value: i64) -> Result<()> {
        self.send_frame(Bytes::copy_from_slice(&value.to_be_bytes()))
            .await
    }

    pub async fn recv_long(&mut self) -> Result<i64> {
        let frame = self.recv_frame().await?;
        let bytes: [u8; 8] = frame.as_ref().try_into().map_err(|_| {
            SyncError::Decode(format!("expected 8-byte integer, got {} bytes", frame.len()))
        })?;
        Ok(i64::from_be_bytes(bytes))
    }

    pub async fn send_flag(&mut self, flag: u8) -> Result<()> {
        self.send_frame(Bytes::copy_from_slice(&[flag])).await
    }

    pub async fn recv_flag(&mut self) -> Result<u8> {
        let frame = self.recv_frame().await?;
        match frame.as_ref() {
            [flag] => Ok(*flag),
            _ => Err(SyncError::Decode(format!(
                "expected 1-byte flag, got {} bytes",
                frame.len()
            ))),
        }
    }

    pub async fn send_string(&mut self, value: &str) -> Result<()> {
        self.send_frame(Bytes::copy_from_slice(value.as_bytes()))
            .await
    }

    pub async fn recv_string(&mut self) -> Result<String> {
        let frame = self.recv_frame().await?;
        String::from_utf8(frame.to_vec()).map_err(|e| SyncError::Decode(e.to_string()))
    }

    /// Send an opaque block of bytes.
    pub async fn send_block(&mut self, value: &[u8]) -> Result<()> {
        self.send_frame(Bytes::copy_from_slice(value)).await
    }

    pub async fn recv_block(&mut self) -> Result<Bytes> {
        self.recv_frame().await
    }

    pub async fn send_element(&mut self, element: &Element) -> Result<()> {
        let wire = element.to_wire()?;
        self.send_frame(Bytes::from(wire)).await
    }

    pub async fn recv_element(&mut self) -> Result<Element> {
        let frame = self.recv_frame().await?;
        Ok(Element::from_wire(&frame)?)
    }

    /// Send a count followed by one frame per element.
    pub async fn send_element_list<'a, I>(&mut self, elements: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Arc<Element>>,
        I::IntoIter: ExactSizeIterator + Send,
    {
        let elements = elements.into_iter();
        self.send_long(elements.len() as i64).await?;
        for element in elements {
            self.send_element(element).await?;
        }
        Ok(())
    }

    pub async fn recv_element_list(&mut self) -> Result<Vec<Element>> {
        let count = self.recv_long().await?;
        let count = usize::try_from(count)
            .map_err(|_| SyncError::Decode(format!("negative element count {}", count)))?;

        let mut elements = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            elements.push(self.recv_element().await?);
        }
        Ok(elements)
    }

    pub async fn send_params(&mut self, params: &SyncParams) -> Result<()> {
        let bytes = params.to_bytes()?;
        self.send_frame(Bytes::from(bytes)).await
    }

    pub async fn recv_params(&mut self) -> Result<SyncParams> {
        let frame = self.recv_frame().await?;
        Ok(SyncParams::from_bytes(&frame)?)
    }
}

impl std::fmt::Debug for Communicant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Communicant")
            .field("transport", &self.transport.describe())
            .field("xmit_bytes", &self.xmit_bytes)
            .field("recv_bytes", &self.recv_bytes)
            .finish()
    }
}

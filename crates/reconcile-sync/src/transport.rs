//! Transport abstraction for peer handles.
//!
//! A transport moves opaque frames between exactly two endpoints. Framing,
//! connection setup and any encryption are the transport's business; byte
//! accounting and typed encoding live in [`Communicant`](crate::Communicant).

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Frame transport between two endpoints.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one frame to the remote endpoint.
    async fn send_frame(&self, frame: Bytes) -> Result<()>;

    /// Receive the next frame from the remote endpoint.
    ///
    /// Blocks until a frame is available or an error occurs.
    async fn recv_frame(&self) -> Result<Bytes>;

    /// Port this endpoint is listening on, if it is a listening server.
    fn listen_port(&self) -> Option<u16> {
        None
    }

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// An in-memory transport for tests and in-process peers.
///
/// Uses channels to link exactly two endpoints.
pub mod memory {
    use super::*;
    use crate::error::SyncError;
    use crate::messages::limits::MEMORY_CHANNEL_CAPACITY;
    use tokio::sync::{mpsc, Mutex};

    /// One end of an in-memory link.
    pub struct MemoryTransport {
        label: String,
        sender: mpsc::Sender<Bytes>,
        receiver: Mutex<mpsc::Receiver<Bytes>>,
    }

    impl MemoryTransport {
        /// Create two linked endpoints.
        pub fn pair() -> (Self, Self) {
            Self::labelled_pair("memory-a", "memory-b")
        }

        /// Create two linked endpoints with names used in logs.
        pub fn labelled_pair(a: &str, b: &str) -> (Self, Self) {
            let (tx_ab, rx_ab) = mpsc::channel(MEMORY_CHANNEL_CAPACITY);
            let (tx_ba, rx_ba) = mpsc::channel(MEMORY_CHANNEL_CAPACITY);

            let end_a = Self {
                label: a.to_string(),
                sender: tx_ab,
                receiver: Mutex::new(rx_ba),
            };
            let end_b = Self {
                label: b.to_string(),
                sender: tx_ba,
                receiver: Mutex::new(rx_ab),
            };
            (end_a, end_b)
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send_frame(&self, frame: Bytes) -> Result<()> {
            self.sender
                .send(frame)
                .await
                .map_err(|_| SyncError::Transport(format!("{}: peer disconnected", self.label)))
        }

        async fn recv_frame(&self) -> Result<Bytes> {
            let mut rx = self.receiver.lock().await;
            rx.recv()
                .await
                .ok_or_else(|| SyncError::Transport(format!("{}: channel closed", self.label)))
        }

        fn describe(&self) -> String {
            self.label.clone()
        }
    }
}

/// A TCP transport carrying big-endian u32 length-prefixed frames.
///
/// Inbound bytes are buffered per connection, so a receive that is dropped
/// part way through a frame (for example by a timeout) loses nothing: the
/// next receive picks up where it stopped.
pub mod tcp {
    use super::*;
    use crate::error::SyncError;
    use crate::messages::limits::{FRAME_HEADER_LEN, MAX_FRAME_LEN, READ_CHUNK_LEN};
    use bytes::{Buf, BytesMut};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
    use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
    use tokio::sync::Mutex;

    struct Connection {
        reader: OwnedReadHalf,
        writer: OwnedWriteHalf,
        /// Bytes read but not yet returned as a frame.
        inbound: BytesMut,
    }

    impl Connection {
        fn new(stream: TcpStream) -> Result<Self> {
            stream.set_nodelay(true)?;
            let (reader, writer) = stream.into_split();
            Ok(Self {
                reader,
                writer,
                inbound: BytesMut::with_capacity(READ_CHUNK_LEN),
            })
        }

        /// Split one complete frame off the inbound buffer, if there is one.
        fn parse_frame(&mut self) -> Option<Bytes> {
            if self.inbound.len() < FRAME_HEADER_LEN {
                return None;
            }
            let mut header = [0u8; FRAME_HEADER_LEN];
            header.copy_from_slice(&self.inbound[..FRAME_HEADER_LEN]);
            let len = u32::from_be_bytes(header) as usize;

            if self.inbound.len() < FRAME_HEADER_LEN + len {
                self.inbound.reserve(FRAME_HEADER_LEN + len - self.inbound.len());
                return None;
            }
            self.inbound.advance(FRAME_HEADER_LEN);
            Some(self.inbound.split_to(len).freeze())
        }
    }

    /// TCP endpoint. A listening endpoint accepts its peer on first use.
    pub struct TcpTransport {
        label: String,
        listener: Option<TcpListener>,
        port: Option<u16>,
        conn: Mutex<Option<Connection>>,
    }

    impl TcpTransport {
        /// Connect to a listening peer.
        pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
            let stream = TcpStream::connect(addr).await?;
            let label = format!("tcp-client:{}", stream.peer_addr()?);

            Ok(Self {
                label,
                listener: None,
                port: None,
                conn: Mutex::new(Some(Connection::new(stream)?)),
            })
        }

        /// Bind a listening endpoint. Port 0 picks a free port.
        pub async fn listen(addr: impl ToSocketAddrs) -> Result<Self> {
            let listener = TcpListener::bind(addr).await?;
            let local = listener.local_addr()?;
            tracing::debug!("listening for a peer on {}", local);

            Ok(Self {
                label: format!("tcp-server:{}", local),
                port: Some(local.port()),
                listener: Some(listener),
                conn: Mutex::new(None),
            })
        }

        async fn connection<'a>(
            &self,
            slot: &'a mut Option<Connection>,
        ) -> Result<&'a mut Connection> {
            if slot.is_none() {
                let listener = self.listener.as_ref().ok_or_else(|| {
                    SyncError::Transport(format!("{}: not connected", self.label))
                })?;
                let (stream, remote) = listener.accept().await?;
                tracing::debug!("{} accepted peer {}", self.label, remote);
                *slot = Some(Connection::new(stream)?);
            }
            slot.as_mut()
                .ok_or_else(|| SyncError::Transport(format!("{}: not connected", self.label)))
        }
    }

    #[async_trait]
    impl Transport for TcpTransport {
        async fn send_frame(&self, frame: Bytes) -> Result<()> {
            let len = u32::try_from(frame.len()).map_err(|_| {
                SyncError::Transport(format!(
                    "frame of {} bytes exceeds {}",
                    frame.len(),
                    MAX_FRAME_LEN
                ))
            })?;

            let mut slot = self.conn.lock().await;
            let conn = self.connection(&mut slot).await?;
            conn.writer.write_all(&len.to_be_bytes()).await?;
            conn.writer.write_all(&frame).await?;
            conn.writer.flush().await?;
            Ok(())
        }

        async fn recv_frame(&self) -> Result<Bytes> {
            let mut slot = self.conn.lock().await;
            let conn = self.connection(&mut slot).await?;

            loop {
                if let Some(frame) = conn.parse_frame() {
                    return Ok(frame);
                }
                // `read_buf` is cancel safe: bytes it has read are already in `inbound`.
                if conn.reader.read_buf(&mut conn.inbound).await? == 0 {
                    return Err(SyncError::Transport(if conn.inbound.is_empty() {
                        format!("{}: peer closed the connection", self.label)
                    } else {
                        format!(
                            "{}: peer closed mid-frame with {} bytes pending",
                            self.label,
                            conn.inbound.len()
                        )
                    }));
                }
            }
        }

        fn listen_port(&self) -> Option<u16> {
            self.port
        }

        fn describe(&self) -> String {
            self.label.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryTransport;
    use super::tcp::TcpTransport;
    use super::*;

    #[tokio::test]
    async fn test_memory_transport_send_recv() {
        let (a, b) = MemoryTransport::pair();

        a.send_frame(Bytes::from_static(b"ping")).await.unwrap();
        b.send_frame(Bytes::from_static(b"pong")).await.unwrap();

        assert_eq!(b.recv_frame().await.unwrap(), Bytes::from_static(b"ping"));
        assert_eq!(a.recv_frame().await.unwrap(), Bytes::from_static(b"pong"));
        assert_eq!(a.listen_port(), None);
    }

    #[tokio::test]
    async fn test_memory_transport_closed_peer() {
        let (a, b) = MemoryTransport::pair();
        drop(b);

        assert!(a.send_frame(Bytes::from_static(b"lost")).await.is_err());
        assert!(a.recv_frame().await.is_err());
    }

    #[tokio::test]
    async fn test_tcp_transport_frames() {
        let server = TcpTransport::listen("127.0.0.1:0").await.unwrap();
        let port = server.listen_port().unwrap();
        assert_ne!(port, 0);

        let server_task = tokio::spawn(async move {
            let frame = server.recv_frame().await.unwrap();
            server.send_frame(frame).await.unwrap();
            server
        });

        let client = TcpTransport::connect(("127.0.0.1", port)).await.unwrap();
        assert_eq!(client.listen_port(), None);
        client.send_frame(Bytes::from_static(b"echo me")).await.unwrap();
        client.send_frame(Bytes::new()).await.unwrap();
        assert_eq!(client.recv_frame().await.unwrap(), Bytes::from_static(b"echo me"));

        let server = server_task.await.unwrap();
        assert!(server.recv_frame().await.unwrap().is_empty());
        assert_eq!(server.listen_port(), Some(port));
    }

    #[tokio::test]
    async fn test_tcp_recv_resumes_after_timeout_mid_frame() {
        use std::time::Duration;
        use tokio::io::AsyncWriteExt;

        let server = TcpTransport::listen("127.0.0.1:0").await.unwrap();
        let port = server.listen_port().unwrap();
        let mut raw = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        raw.write_all(&5u32.to_be_bytes()).await.unwrap();
        raw.write_all(b"he").await.unwrap();
        raw.flush().await.unwrap();

        let early = tokio::time::timeout(Duration::from_millis(50), server.recv_frame()).await;
        assert!(early.is_err());

        raw.write_all(b"llo").await.unwrap();
        raw.write_all(&2u32.to_be_bytes()).await.unwrap();
        raw.write_all(b"ok").await.unwrap();
        raw.flush().await.unwrap();

        assert_eq!(server.recv_frame().await.unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(server.recv_frame().await.unwrap(), Bytes::from_static(b"ok"));
    }

    #[tokio::test]
    async fn test_tcp_peer_closed_mid_frame() {
        use tokio::io::AsyncWriteExt;

        let server = TcpTransport::listen("127.0.0.1:0").await.unwrap();
        let port = server.listen_port().unwrap();
        let mut raw = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        raw.write_all(&9u32.to_be_bytes()).await.unwrap();
        raw.write_all(b"cut").await.unwrap();
        drop(raw);

        let err = server.recv_frame().await.unwrap_err();
        assert!(err.to_string().contains("mid-frame"));
    }
}

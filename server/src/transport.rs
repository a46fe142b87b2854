//! Line-oriented TCP transport, one listening channel per side.
//!
//! Each [`TransportChannel`] owns a listener and at most one live connection.
//! Inbound bytes are accumulated in a private [`LineBuffer`] and handed out
//! one CRLF-terminated line at a time, in arrival order. A line is only ever
//! delivered once; whatever is left in the buffer is discarded when the
//! connection goes away.
//!
//! Every blocking receive is bounded by the channel's idle timeout. When the
//! timeout fires the connection is destroyed and the receive fails; there is
//! no retry at this layer.

use bytes::{Buf, BytesMut};
use chaser_shared::{Side, LINE_DELIMITER};
use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{0} channel is not listening")]
    NotListening(Side),
    #[error("{0} player is not connected")]
    NotConnected(Side),
    #[error("timed out waiting for a message from {0}")]
    Timeout(Side),
    #[error("timed out after {0:?} waiting for both players to connect")]
    PeersTimeout(Duration),
    #[error("connection closed by {0}")]
    ConnectionClosed(Side),
    #[error("failed to listen on {addr}: {source}")]
    BindFailed { addr: String, source: io::Error },
    #[error("i/o error on {side} connection: {source}")]
    Io { side: Side, source: io::Error },
}

/// The per-side connection surface the orchestrator drives.
///
/// Implemented by [`TransportChannel`] for real games; tests substitute
/// scripted links.
#[allow(async_fn_in_trait)]
pub trait PlayerLink {
    /// Resolves once a peer is connected on this link.
    async fn accept_peer(&mut self) -> Result<(), TransportError>;

    /// Sends one message; the line delimiter is added by the link.
    async fn send_line(&mut self, message: &str) -> Result<(), TransportError>;

    /// Returns the next complete inbound line without its delimiter.
    async fn receive_line(&mut self) -> Result<String, TransportError>;
}

/// Pull-based CRLF line decoder over an owned byte accumulator.
#[derive(Debug, Default)]
pub struct LineBuffer {
    bytes: BytesMut,
    /// Offset below which no delimiter can start.
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Removes and returns the first complete line, consuming its delimiter.
    pub fn next_line(&mut self) -> Option<String> {
        let delimiter = LINE_DELIMITER.as_bytes();
        let found = self.bytes[self.scanned..]
            .windows(delimiter.len())
            .position(|window| window == delimiter);

        let Some(offset) = found else {
            self.scanned = self.bytes.len().saturating_sub(delimiter.len() - 1);
            return None;
        };

        let line = self.bytes.split_to(self.scanned + offset);
        self.bytes.advance(delimiter.len());
        self.scanned = 0;
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Returns the next line, reading from `reader` until one is complete.
    ///
    /// Already-buffered lines are returned without touching the reader.
    /// `Ok(None)` means the reader hit end of stream first.
    pub async fn read_line<R>(&mut self, reader: &mut R) -> io::Result<Option<String>>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(line) = self.next_line() {
                return Ok(Some(line));
            }
            if reader.read_buf(&mut self.bytes).await? == 0 {
                return Ok(None);
            }
        }
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.scanned = 0;
    }

    /// Number of buffered bytes not yet returned as lines.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One side's listening endpoint and its active connection.
pub struct TransportChannel {
    side: Side,
    bind_addr: String,
    idle_timeout: Duration,
    listener: Option<TcpListener>,
    connection: Option<(TcpStream, SocketAddr)>,
    buffer: LineBuffer,
}

impl TransportChannel {
    pub fn new(side: Side, bind_addr: impl Into<String>, idle_timeout: Duration) -> Self {
        Self {
            side,
            bind_addr: bind_addr.into(),
            idle_timeout,
            listener: None,
            connection: None,
            buffer: LineBuffer::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Binds the listener. Calling it on a started channel is a no-op.
    pub async fn start(&mut self) -> Result<(), TransportError> {
        if self.listener.is_some() {
            return Ok(());
        }

        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|source| TransportError::BindFailed {
                addr: self.bind_addr.clone(),
                source,
            })?;

        match listener.local_addr() {
            Ok(addr) => info!("{} channel listening on {}", self.side, addr),
            Err(_) => info!("{} channel listening on {}", self.side, self.bind_addr),
        }
        self.listener = Some(listener);
        Ok(())
    }

    /// Closes the connection, then the listener. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        self.disconnect().await;
        if self.listener.take().is_some() {
            info!("{} channel stopped", self.side);
        }
    }

    /// Address the listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.connection.as_ref().map(|(_, peer)| *peer)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Waits for a peer to connect. Returns immediately if one already is.
    pub async fn accept(&mut self) -> Result<SocketAddr, TransportError> {
        let side = self.side;
        if let Some(peer) = self.peer_addr() {
            return Ok(peer);
        }

        let listener = self
            .listener
            .as_ref()
            .ok_or(TransportError::NotListening(side))?;
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|source| TransportError::Io { side, source })?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", side, e);
        }

        info!("{} player connected from {}", side, peer);
        self.buffer.clear();
        self.connection = Some((stream, peer));
        Ok(peer)
    }

    /// Writes `message` followed by CRLF.
    pub async fn send(&mut self, message: &str) -> Result<(), TransportError> {
        let side = self.side;
        let (stream, _) = self
            .connection
            .as_mut()
            .ok_or(TransportError::NotConnected(side))?;

        let mut frame = String::with_capacity(message.len() + LINE_DELIMITER.len());
        frame.push_str(message);
        frame.push_str(LINE_DELIMITER);

        let written = stream.write_all(frame.as_bytes()).await;
        match written {
            Ok(()) => {
                debug!("-> {}: {}", side, message);
                Ok(())
            }
            Err(source) => {
                self.drop_connection();
                Err(TransportError::Io { side, source })
            }
        }
    }

    /// Returns the next complete line, waiting at most the idle timeout.
    pub async fn receive(&mut self) -> Result<String, TransportError> {
        let side = self.side;
        let (stream, _) = self
            .connection
            .as_mut()
            .ok_or(TransportError::NotConnected(side))?;

        let outcome = timeout(self.idle_timeout, self.buffer.read_line(stream)).await;

        match outcome {
            Ok(Ok(Some(line))) => {
                debug!("<- {}: {}", side, line);
                Ok(line)
            }
            Ok(Ok(None)) => {
                warn!("{} closed the connection", side);
                self.drop_connection();
                Err(TransportError::ConnectionClosed(side))
            }
            Ok(Err(source)) => {
                self.drop_connection();
                Err(TransportError::Io { side, source })
            }
            Err(_) => {
                warn!(
                    "{} sent nothing for {:?}, dropping connection",
                    side, self.idle_timeout
                );
                self.drop_connection();
                Err(TransportError::Timeout(side))
            }
        }
    }

    /// Gracefully closes the active connection, if any.
    pub async fn disconnect(&mut self) {
        if let Some((mut stream, peer)) = self.connection.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Shutdown of {} connection failed: {}", self.side, e);
            }
            info!("{} player at {} disconnected", self.side, peer);
        }
        self.buffer.clear();
    }

    fn drop_connection(&mut self) {
        self.connection = None;
        self.buffer.clear();
    }
}

impl PlayerLink for TransportChannel {
    async fn accept_peer(&mut self) -> Result<(), TransportError> {
        self.accept().await.map(|_| ())
    }

    async fn send_line(&mut self, message: &str) -> Result<(), TransportError> {
        self.send(message).await
    }

    async fn receive_line(&mut self) -> Result<String, TransportError> {
        self.receive().await
    }
}

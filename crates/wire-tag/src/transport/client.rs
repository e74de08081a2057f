//! TCP client side of the transport.

use super::Transport;
use super::framing::{Frame, FrameCodec, FrameType, MAX_FRAME_SIZE};
use crate::error::TransportError;
use crate::payload::Payload;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, instrument, warn};

/// Configuration for the TCP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long to wait for the connection to be established.
    pub connect_timeout: Duration,
    /// Maximum frame size.
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

struct Connection {
    framed: Framed<TcpStream, FrameCodec>,
    /// Requests written whose reply has not been read yet.
    outstanding: usize,
}

impl Connection {
    async fn open(addr: SocketAddr, config: &ClientConfig) -> Result<Self, TransportError> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::ConnectTimeout(config.connect_timeout))??;
        stream.set_nodelay(true)?;

        debug!("Connected to {}", addr);

        Ok(Self {
            framed: Framed::new(
                stream,
                FrameCodec::new().with_max_frame_size(config.max_frame_size),
            ),
            outstanding: 0,
        })
    }

    /// Read and drop replies belonging to exchanges that were abandoned
    /// after their request was written.
    async fn discard_stale_replies(&mut self) -> Result<(), TransportError> {
        if self.outstanding == 0 {
            return Ok(());
        }

        // An abandoned exchange may have left its request unflushed
        self.framed.flush().await?;
        while self.outstanding > 0 {
            let frame = self
                .framed
                .next()
                .await
                .ok_or(TransportError::ConnectionClosed)??;
            self.outstanding -= 1;
            debug!("Discarded stale {:?} frame", frame.frame_type);
        }
        Ok(())
    }

    async fn exchange(&mut self, request: &Payload) -> Result<Payload, TransportError> {
        self.discard_stale_replies().await?;

        // Once fed, the frame is buffered and will reach the server even if
        // this exchange is dropped, so it counts as outstanding from here.
        self.framed.feed(Frame::request(request)).await?;
        self.outstanding += 1;
        self.framed.flush().await?;

        let frame = self
            .framed
            .next()
            .await
            .ok_or(TransportError::ConnectionClosed)??;
        self.outstanding -= 1;

        match frame.frame_type {
            FrameType::Response => frame.into_payload(),
            FrameType::Error => Err(TransportError::Remote(
                String::from_utf8_lossy(&frame.payload).into_owned(),
            )),
            FrameType::Empty => Err(TransportError::NoResponse),
            FrameType::Request => {
                warn!("Server sent a request frame");
                Err(TransportError::InvalidFrame(
                    "unexpected request frame from server".to_string(),
                ))
            }
        }
    }
}

/// Errors after which the framed stream can no longer be trusted.
const fn breaks_connection(error: &TransportError) -> bool {
    matches!(
        error,
        TransportError::Io(_)
            | TransportError::ConnectionClosed
            | TransportError::InvalidFrame(_)
            | TransportError::FrameTooLarge { .. }
            | TransportError::ChecksumMismatch { .. }
    )
}

/// A TCP connection carrying one exchange at a time.
///
/// A connection that fails is dropped and a new one is opened on the next
/// exchange. When a reused connection turns out to have been closed by the
/// server (for example after its idle timeout), the request is sent once
/// more on a fresh connection.
pub struct TcpClient {
    addr: SocketAddr,
    config: ClientConfig,
    connection: Mutex<Option<Connection>>,
}

impl TcpClient {
    /// Connect to a server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established in time.
    #[instrument(skip(config))]
    pub async fn connect(addr: SocketAddr, config: ClientConfig) -> Result<Self, TransportError> {
        let connection = Connection::open(addr, &config).await?;

        Ok(Self {
            addr,
            config,
            connection: Mutex::new(Some(connection)),
        })
    }

    /// Address of the server.
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl Transport for TcpClient {
    #[instrument(skip(self, request), fields(addr = %self.addr))]
    async fn request_response(&self, request: Payload) -> Result<Payload, TransportError> {
        let mut slot = self.connection.lock().await;

        let reused = slot.is_some();
        if !reused {
            *slot = Some(Connection::open(self.addr, &self.config).await?);
        }
        let Some(conn) = slot.as_mut() else {
            return Err(TransportError::ConnectionClosed);
        };

        let result = conn.exchange(&request).await;
        let retry = match &result {
            Err(e) if breaks_connection(e) => {
                *slot = None;
                reused && matches!(e, TransportError::ConnectionClosed | TransportError::Io(_))
            }
            _ => false,
        };
        if !retry {
            return result;
        }

        debug!("Connection to {} was closed, reconnecting", self.addr);
        let mut fresh = Connection::open(self.addr, &self.config).await?;
        let retried = fresh.exchange(&request).await;
        if !matches!(&retried, Err(e) if breaks_connection(e)) {
            *slot = Some(fresh);
        }
        retried
    }
}

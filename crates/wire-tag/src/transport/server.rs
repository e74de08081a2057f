//! TCP server side of the transport.

use super::RequestHandler;
use super::framing::{Frame, FrameCodec, FrameType, MAX_FRAME_SIZE};
use crate::error::TransportError;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Configuration for the TCP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// How long a connection may sit idle between requests.
    pub idle_timeout: Duration,
    /// Maximum frame size.
    pub max_frame_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_connections: 100,
            idle_timeout: Duration::from_secs(60),
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

/// Accepts connections and answers each request frame through a
/// [`RequestHandler`].
pub struct TcpServer<H: RequestHandler> {
    listener: TcpListener,
    handler: Arc<H>,
    config: ServerConfig,
}

impl<H: RequestHandler> TcpServer<H> {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(
        addr: SocketAddr,
        handler: H,
        config: ServerConfig,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            std::io::Error::new(e.kind(), format!("Failed to bind to {addr}: {e}"))
        })?;

        Ok(Self {
            listener,
            handler: Arc::new(handler),
            config,
        })
    }

    /// The bound address (useful when binding port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be read.
    #[instrument(skip(self, shutdown))]
    pub async fn serve(self, shutdown: CancellationToken) -> Result<(), TransportError> {
        info!("Wire-tag server listening on {}", self.local_addr()?);

        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                                warn!("Max connections reached, rejecting connection from {}", addr);
                                continue;
                            };

                            let handler = Arc::clone(&self.handler);
                            let config = self.config.clone();
                            tokio::spawn(async move {
                                if let Err(e) = Self::handle_connection(stream, addr, handler, config).await {
                                    error!("Connection error from {}: {}", addr, e);
                                }
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
                () = shutdown.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }
            }
        }

        Ok(())
    }

    #[instrument(skip(stream, handler, config))]
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        handler: Arc<H>,
        config: ServerConfig,
    ) -> Result<(), TransportError> {
        debug!("New connection from {}", addr);

        let mut framed = Framed::new(
            stream,
            FrameCodec::new().with_max_frame_size(config.max_frame_size),
        );

        loop {
            match timeout(config.idle_timeout, framed.next()).await {
                Ok(Some(Ok(frame))) => {
                    if frame.frame_type != FrameType::Request {
                        warn!("Unexpected frame type: {:?}", frame.frame_type);
                        continue;
                    }

                    let reply = Self::handle_request(frame, &handler).await;
                    framed.send(reply).await?;
                }
                Ok(Some(Err(e))) => {
                    return Err(e);
                }
                Ok(None) => {
                    debug!("Connection closed by client");
                    break;
                }
                Err(_) => {
                    debug!("Connection idle for {:?}, closing", config.idle_timeout);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Turn one request frame into exactly one reply frame.
    async fn handle_request(frame: Frame, handler: &H) -> Frame {
        let request = match frame.into_payload() {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejecting unreadable request frame: {}", e);
                return Frame::error(&e.to_string());
            }
        };

        match handler.handle(request).await {
            Ok(Some(reply)) => Frame::response(&reply),
            Ok(None) => Frame::empty(),
            Err(e) => {
                warn!("Request failed: {}", e);
                Frame::error(&e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::payload::Payload;
    use crate::transport::{ClientConfig, TcpClient, Transport};
    use async_trait::async_trait;

    struct MetadataEcho;

    #[async_trait]
    impl RequestHandler for MetadataEcho {
        async fn handle(&self, request: Payload) -> Result<Option<Payload>> {
            if request.metadata().is_empty() {
                Ok(None)
            } else {
                Ok(Some(Payload::new("reply", request.metadata().clone())))
            }
        }
    }

    async fn spawn_server() -> (SocketAddr, CancellationToken) {
        spawn_server_with(ServerConfig::default()).await
    }

    async fn spawn_server_with(config: ServerConfig) -> (SocketAddr, CancellationToken) {
        let server = TcpServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), MetadataEcho, config)
        .await
        .unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        tokio::spawn(server.serve(shutdown.clone()));
        (addr, shutdown)
    }

    #[tokio::test]
    async fn test_request_reply() {
        let _ = tracing_subscriber::fmt::try_init();
        let (addr, shutdown) = spawn_server().await;

        let client = TcpClient::connect(addr, ClientConfig::default()).await.unwrap();
        let reply = client
            .request_response(Payload::new("", vec![0x09]))
            .await
            .unwrap();

        assert_eq!(reply.data().as_ref(), b"reply");
        assert_eq!(reply.metadata().as_ref(), &[0x09]);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_unanswered_request_keeps_connection_usable() {
        let (addr, shutdown) = spawn_server().await;
        let client = TcpClient::connect(addr, ClientConfig::default()).await.unwrap();

        let first = client.request_response(Payload::default()).await;
        assert!(matches!(first, Err(TransportError::NoResponse)));

        let second = client
            .request_response(Payload::new("", vec![0x07]))
            .await
            .unwrap();
        assert_eq!(second.metadata().as_ref(), &[0x07]);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_abandoned_exchange_reply_is_discarded() {
        let (addr, shutdown) = spawn_server().await;
        let client = TcpClient::connect(addr, ClientConfig::default()).await.unwrap();

        // Drop the first exchange right after its request is written
        let abandoned = client.request_response(Payload::new("", vec![0x01]));
        let _ = tokio::time::timeout(Duration::from_millis(0), abandoned).await;

        let reply = client
            .request_response(Payload::new("", vec![0x02]))
            .await
            .unwrap();
        assert_eq!(reply.metadata().as_ref(), &[0x02]);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_client_reconnects_after_idle_close() {
        let _ = tracing_subscriber::fmt::try_init();
        let (addr, shutdown) = spawn_server_with(ServerConfig {
            idle_timeout: Duration::from_millis(100),
            ..ServerConfig::default()
        })
        .await;
        let client = TcpClient::connect(addr, ClientConfig::default()).await.unwrap();

        let first = client
            .request_response(Payload::new("", vec![0x07]))
            .await
            .unwrap();
        assert_eq!(first.metadata().as_ref(), &[0x07]);

        // Outlive the idle timeout so the server drops the connection
        tokio::time::sleep(Duration::from_millis(300)).await;

        for opcode in [0x07, 0x09, 0x07] {
            let reply = client
                .request_response(Payload::new("", vec![opcode]))
                .await
                .unwrap();
            assert_eq!(reply.metadata().as_ref(), &[opcode]);
        }
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_abandoned_exchange_after_idle_close() {
        let (addr, shutdown) = spawn_server_with(ServerConfig {
            idle_timeout: Duration::from_millis(100),
            ..ServerConfig::default()
        })
        .await;
        let client = TcpClient::connect(addr, ClientConfig::default()).await.unwrap();

        let abandoned = client.request_response(Payload::new("", vec![0x01]));
        let _ = tokio::time::timeout(Duration::from_millis(0), abandoned).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        let reply = client
            .request_response(Payload::new("", vec![0x02]))
            .await
            .unwrap();
        assert_eq!(reply.metadata().as_ref(), &[0x02]);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = TcpClient::connect(addr, ClientConfig::default()).await;
        assert!(result.is_err());
    }
}

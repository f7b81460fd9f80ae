use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::sync::watch;

use camlink_core::Publisher;

use crate::error::GatewayError;
use crate::router::build_router;

pub(crate) struct AppState<P> {
    pub publisher: Arc<P>,
}

// Derived Clone would require P: Clone; only the Arc is cloned.
impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            publisher: Arc::clone(&self.publisher),
        }
    }
}

/// HTTP server wrapping the webhook router.
///
/// Listens on all interfaces; webhook sources live on the deploying
/// operator's network and the endpoint carries no authentication.
pub struct GatewayServer<P> {
    addr: SocketAddr,
    publisher: Arc<P>,
    max_body_size: usize,
    shutdown_rx: watch::Receiver<bool>,
}

impl<P: Publisher + 'static> GatewayServer<P> {
    #[must_use]
    pub fn new(port: u16, publisher: Arc<P>, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            publisher,
            max_body_size: 1_048_576,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Start serving webhook requests.
    ///
    /// Runs until the shutdown signal flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal
    /// I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let router = build_router(self.publisher, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("listening for webhooks at http://{}/webhook", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use camlink_core::PublishError;

    use super::*;

    struct NullPublisher;

    impl Publisher for NullPublisher {
        async fn publish(&self, _payload: &[u8]) -> Result<(), PublishError> {
            Ok(())
        }

        fn topic(&self) -> &str {
            "home/alarms/camera"
        }
    }

    #[test]
    fn server_listens_on_all_interfaces() {
        let (_tx, rx) = watch::channel(false);
        let server = GatewayServer::new(5000, Arc::new(NullPublisher), rx);
        assert_eq!(server.addr.to_string(), "0.0.0.0:5000");
        assert_eq!(server.max_body_size, 1_048_576);
    }

    #[test]
    fn server_builder_chain() {
        let (_tx, rx) = watch::channel(false);
        let server = GatewayServer::new(5000, Arc::new(NullPublisher), rx).with_max_body_size(512);
        assert_eq!(server.max_body_size, 512);
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let (_tx, rx) = watch::channel(false);
        let blocker = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = blocker.local_addr().unwrap().port();

        let server = GatewayServer::new(port, Arc::new(NullPublisher), rx);
        let err = server.serve().await.unwrap_err();
        assert!(matches!(err, GatewayError::Bind(_, _)));
    }
}

//! The contract between the webhook gateway and the messaging connector.

use std::future::Future;

use thiserror::Error;

/// Connection lifecycle of the messaging connector.
///
/// `Failed` is terminal only for the initial synchronous connect; the
/// background network loop never enters it and retries indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectorState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single publish attempt. No retry is performed for the
/// affected message.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("not connected to broker")]
    NotConnected,
    #[error("publish timed out")]
    Timeout,
    #[error("broker error: {0}")]
    Broker(String),
}

/// Sink for alarm payloads against a fixed topic.
///
/// The gateway is generic over this trait so tests can substitute a
/// recording fake for the MQTT connector.
pub trait Publisher: Send + Sync {
    /// Send `payload` to the configured topic. At-most-once: success means
    /// the message was handed to the transport, not that it was delivered.
    fn publish(&self, payload: &[u8]) -> impl Future<Output = Result<(), PublishError>> + Send;

    /// The topic this publisher delivers to.
    fn topic(&self) -> &str;
}

use thiserror::Error;

/// Failure to establish the initial broker connection. Fatal: the process
/// must not serve requests after seeing one of these.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("broker handshake failed: {0}")]
    Handshake(#[from] rumqttc::ConnectionError),
    #[error("broker refused connection: {0:?}")]
    Refused(rumqttc::ConnectReturnCode),
    #[error("timed out waiting for broker acknowledgement")]
    Timeout,
}

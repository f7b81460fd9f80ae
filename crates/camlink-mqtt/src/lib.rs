//! MQTT messaging connector built on rumqttc.
//!
//! [`MqttConnector::connect`] performs the initial handshake synchronously;
//! after that a [`ConnectorTask`] keeps the connection alive in the
//! background while the connector handle serves publish calls.

mod connector;
mod error;

pub use connector::{ConnectorTask, MqttConnector};
pub use error::ConnectError;

//! Bridge configuration and the publish contract shared by the webhook
//! gateway and the MQTT connector.

pub mod config;
pub mod publish;

pub use config::BridgeConfig;
pub use publish::{ConnectorState, PublishError, Publisher};

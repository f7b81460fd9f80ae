use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::watch;

use camlink_core::{BridgeConfig, ConnectorState, PublishError, Publisher};

use crate::error::ConnectError;

const CLIENT_ID: &str = "camlink-bridge";
const EVENT_CAPACITY: usize = 64;
const KEEP_ALIVE: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Handle for publishing to the fixed broker topic.
///
/// Cheap to share behind an `Arc`; concurrent publish calls are safe, the
/// underlying client serializes them onto the network task.
pub struct MqttConnector {
    client: AsyncClient,
    topic: String,
    state_rx: watch::Receiver<ConnectorState>,
}

/// Background network loop. Must be spawned after a successful connect;
/// publishes fail with `NotConnected` while it is not being polled.
pub struct ConnectorTask {
    eventloop: EventLoop,
    state_tx: watch::Sender<ConnectorState>,
}

impl MqttConnector {
    /// Establish the initial broker connection.
    ///
    /// Waits for the broker's acknowledgement before returning, bounded by
    /// a 60 second timeout. Dropped connections after this point are
    /// handled by [`ConnectorTask::run`]; a failure here is fatal and the
    /// caller must exit without serving requests.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] when the transport fails, the broker
    /// refuses the session, or no acknowledgement arrives in time.
    pub async fn connect(config: &BridgeConfig) -> Result<(Self, ConnectorTask), ConnectError> {
        let (client, mut eventloop) = AsyncClient::new(mqtt_options(config), EVENT_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectorState::Connecting);

        let code = match tokio::time::timeout(CONNECT_TIMEOUT, wait_for_connack(&mut eventloop))
            .await
        {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => {
                state_tx.send_replace(ConnectorState::Failed);
                return Err(e);
            }
            Err(_) => {
                state_tx.send_replace(ConnectorState::Failed);
                return Err(ConnectError::Timeout);
            }
        };
        if code != ConnectReturnCode::Success {
            state_tx.send_replace(ConnectorState::Failed);
            return Err(ConnectError::Refused(code));
        }

        state_tx.send_replace(ConnectorState::Connected);
        tracing::info!(
            broker = %config.mqtt_host,
            port = config.mqtt_port,
            "connected to MQTT broker"
        );

        Ok((
            Self {
                client,
                topic: config.mqtt_topic.clone(),
                state_rx,
            },
            ConnectorTask { eventloop, state_tx },
        ))
    }

    /// Current connection state as observed by the network loop.
    #[must_use]
    pub fn state(&self) -> ConnectorState {
        *self.state_rx.borrow()
    }
}

impl Publisher for MqttConnector {
    async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        if *self.state_rx.borrow() != ConnectorState::Connected {
            return Err(PublishError::NotConnected);
        }

        tokio::time::timeout(
            PUBLISH_TIMEOUT,
            self.client
                .publish(self.topic.as_str(), QoS::AtMostOnce, false, payload.to_vec()),
        )
        .await
        .map_err(|_| PublishError::Timeout)?
        .map_err(|e| PublishError::Broker(e.to_string()))
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

impl ConnectorTask {
    /// Drive the broker connection until the process exits.
    ///
    /// rumqttc re-establishes the session on the poll after a failure, so
    /// this loop only has to keep polling: errors mark the connector
    /// `Disconnected`, wait out a fixed delay, and try again. There is no
    /// terminal state.
    pub async fn run(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack)))
                    if ack.code == ConnectReturnCode::Success =>
                {
                    if self.state_tx.send_replace(ConnectorState::Connected)
                        != ConnectorState::Connected
                    {
                        tracing::info!("reconnected to MQTT broker");
                    }
                }
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    tracing::warn!(code = ?ack.code, "broker refused session");
                    self.state_tx.send_replace(ConnectorState::Disconnected);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
                Ok(event) => {
                    tracing::trace!(?event, "mqtt event");
                }
                Err(e) => {
                    let previous = self.state_tx.send_replace(ConnectorState::Disconnected);
                    if previous == ConnectorState::Connected {
                        tracing::warn!(error = %e, "MQTT connection lost");
                    } else {
                        tracing::debug!(error = %e, "MQTT reconnect attempt failed");
                    }
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    self.state_tx.send_replace(ConnectorState::Connecting);
                }
            }
        }
    }
}

fn mqtt_options(config: &BridgeConfig) -> MqttOptions {
    let mut options = MqttOptions::new(CLIENT_ID, config.mqtt_host.as_str(), config.mqtt_port);
    options.set_keep_alive(KEEP_ALIVE);
    if let Some(ref user) = config.mqtt_user {
        options.set_credentials(user.as_str(), config.mqtt_password.as_deref().unwrap_or(""));
    }
    options
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<ConnectReturnCode, ConnectError> {
    loop {
        match eventloop.poll().await? {
            Event::Incoming(Packet::ConnAck(ack)) => return Ok(ack.code),
            event => tracing::trace!(?event, "event before acknowledgement"),
        }
    }
}

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;

use camlink_core::BridgeConfig;
use camlink_gateway::GatewayServer;
use camlink_mqtt::MqttConnector;

/// Forward camera webhook notifications to an MQTT topic.
///
/// Every flag overrides its environment variable, which overrides the
/// built-in default.
#[derive(Debug, Parser)]
#[command(name = "camlink", version, about)]
struct Args {
    /// Port for the HTTP webhook server. Overrides HTTP_PORT. Default: 5000
    #[arg(short, long)]
    port: Option<u16>,

    /// Hostname or IP of the MQTT broker. Overrides MQTT_BROKER. Default: localhost
    #[arg(short = 'b', long)]
    mqtt_broker: Option<String>,

    /// Port of the MQTT broker. Overrides MQTT_PORT. Default: 1883
    #[arg(long)]
    mqtt_port: Option<u16>,

    /// MQTT topic to publish to. Overrides MQTT_TOPIC. Default: home/alarms/camera
    #[arg(short = 't', long)]
    mqtt_topic: Option<String>,

    /// Username for MQTT broker authentication. Overrides MQTT_USER.
    #[arg(short = 'u', long)]
    mqtt_user: Option<String>,

    /// Password for MQTT broker authentication. Overrides MQTT_PASSWORD.
    #[arg(long)]
    mqtt_password: Option<String>,

    /// Log filter, e.g. `debug` or `camlink=trace`. Overrides CAMLINK_LOG.
    #[arg(short = 'l', long)]
    log: Option<String>,
}

impl Args {
    fn apply(self, config: &mut BridgeConfig) {
        if let Some(port) = self.port {
            config.http_port = port;
        }
        if let Some(host) = self.mqtt_broker {
            config.mqtt_host = host;
        }
        if let Some(port) = self.mqtt_port {
            config.mqtt_port = port;
        }
        if let Some(topic) = self.mqtt_topic {
            config.mqtt_topic = topic;
        }
        if let Some(user) = self.mqtt_user {
            config.mqtt_user = Some(user);
        }
        if let Some(password) = self.mqtt_password {
            config.mqtt_password = Some(password);
        }
        if let Some(filter) = self.log {
            config.log_filter = filter;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = BridgeConfig::from_env();
    args.apply(&mut config);

    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Initial connect is fatal: the HTTP port is never bound when the
    // broker is unreachable at startup.
    let (connector, task) = MqttConnector::connect(&config)
        .await
        .context("could not connect to MQTT broker")?;
    tokio::spawn(task.run());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    tracing::info!(
        topic = %config.mqtt_topic,
        broker = %config.mqtt_host,
        broker_port = config.mqtt_port,
        "forwarding webhook alarms to MQTT"
    );

    GatewayServer::new(config.http_port, Arc::new(connector), shutdown_rx)
        .serve()
        .await?;

    Ok(())
}

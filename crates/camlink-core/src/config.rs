//! Process configuration, resolved once at startup.
//!
//! Precedence is CLI flag, then environment variable, then built-in default.
//! Flags are applied by the binary on top of [`BridgeConfig::from_env`].

/// Immutable bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Hostname or IP of the MQTT broker.
    pub mqtt_host: String,
    /// Port of the MQTT broker.
    pub mqtt_port: u16,
    /// Topic alarm payloads are published to.
    pub mqtt_topic: String,
    /// Username for broker authentication. Credentials are sent whenever a
    /// username is set; the password defaults to empty.
    pub mqtt_user: Option<String>,
    /// Password for broker authentication.
    pub mqtt_password: Option<String>,
    /// Port the HTTP webhook server listens on (all interfaces).
    pub http_port: u16,
    /// Tracing filter directive, e.g. `info` or `camlink=debug`.
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "localhost".into(),
            mqtt_port: 1883,
            mqtt_topic: "home/alarms/camera".into(),
            mqtt_user: None,
            mqtt_password: None,
            http_port: 5000,
            log_filter: "info".into(),
        }
    }
}

impl BridgeConfig {
    /// Build a configuration from defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MQTT_BROKER") {
            self.mqtt_host = v;
        }
        if let Ok(v) = std::env::var("MQTT_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.mqtt_port = port;
            } else {
                tracing::warn!("ignoring invalid MQTT_PORT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("MQTT_TOPIC") {
            self.mqtt_topic = v;
        }
        if let Ok(v) = std::env::var("MQTT_USER") {
            self.mqtt_user = Some(v);
        }
        if let Ok(v) = std::env::var("MQTT_PASSWORD") {
            self.mqtt_password = Some(v);
        }
        if let Ok(v) = std::env::var("HTTP_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.http_port = port;
            } else {
                tracing::warn!("ignoring invalid HTTP_PORT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CAMLINK_LOG") {
            self.log_filter = v;
        }
    }
}

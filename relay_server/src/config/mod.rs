use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub http_addr: String,
    pub static_dir: String,
    pub cors_allow_any: bool,
    pub max_body_bytes: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IngestConfig {
    pub enabled: bool,
    /// Where the encoder sends RTP/H264.
    pub udp_addr: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RtcConfig {
    /// STUN/TURN urls, empty means host candidates only.
    pub ice_servers: Vec<String>,
    pub include_loopback: bool,
    pub gather_timeout_ms: u64,
    pub connect_timeout_secs: u64,
    pub max_sessions: usize,
}

impl RtcConfig {
    pub fn gather_timeout(&self) -> Duration {
        Duration::from_millis(self.gather_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LogConfig {
    pub level: String,
    /// `term` or `json`
    pub format: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ingest: IngestConfig,
    pub rtc: RtcConfig,
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            static_dir: "./static".to_string(),
            cors_allow_any: true,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            udp_addr: "0.0.0.0:5004".to_string(),
        }
    }
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            ice_servers: Vec::new(),
            include_loopback: false,
            gather_timeout_ms: 10_000,
            connect_timeout_secs: 30,
            max_sessions: 16,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "term".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            ingest: IngestConfig::default(),
            rtc: RtcConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the optional file, then `RELAY_*` environment variables
    /// (`RELAY_SERVER__HTTP_ADDR`, `RELAY_RTC__ICE_SERVERS=stun:a,stun:b`).
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        builder
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("rtc.ice_servers")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

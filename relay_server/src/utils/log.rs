use once_cell::sync::{Lazy, OnceCell};
use slog::{o, Drain, Level, Logger};

use std::sync::Mutex;

use crate::config::LogConfig;

static LOG_CONFIG: OnceCell<LogConfig> = OnceCell::new();

pub static GLOBAL_LOGGER: Lazy<Logger> = Lazy::new(|| {
    let config = LOG_CONFIG.get().cloned().unwrap_or_default();
    let level = parse_level(&config.level);

    if config.format == "json" {
        let drain = slog_json::Json::new(std::io::stdout())
            .add_default_keys()
            .build();
        let drain = Mutex::new(drain).fuse().filter_level(level).fuse();
        Logger::root(drain, o!("app" => "relay_server"))
    } else {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator).build();
        let drain = Mutex::new(drain).fuse().filter_level(level).fuse();
        Logger::root(drain, o!())
    }
});

/// Must run before the first log line; later calls are ignored.
pub fn init(config: &LogConfig) {
    let _ = LOG_CONFIG.set(config.clone());
    Lazy::force(&GLOBAL_LOGGER);

    // webrtc-rs and the signaling crate go through the `log` facade
    let filters = format!(
        "{},webrtc=warn,webrtc_ice=warn,webrtc_dtls=warn,webrtc_sctp=warn,webrtc_srtp=warn,webrtc_mdns=warn",
        config.level
    );
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filters))
        .try_init();
}

fn parse_level(level: &str) -> Level {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "warn" | "warning" => Level::Warning,
        "error" => Level::Error,
        "critical" => Level::Critical,
        _ => Level::Info,
    }
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        slog::info!($crate::utils::log::GLOBAL_LOGGER, $($arg)+)
    }
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        slog::debug!($crate::utils::log::GLOBAL_LOGGER, $($arg)+)
    }
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        slog::error!($crate::utils::log::GLOBAL_LOGGER, $($arg)+)
    }
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        slog::warn!($crate::utils::log::GLOBAL_LOGGER, $($arg)+)
    }
}

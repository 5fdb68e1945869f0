use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration, layered from defaults, an optional file, and
/// `DABGW_`-prefixed environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// CSV registry of acknowledgment devices.
    pub devices_csv: PathBuf,
    /// Directory watched for incoming DAB message files.
    pub watch_dir: PathBuf,
    /// Poll cadence of the directory watcher.
    #[serde(with = "humantime_serde")]
    pub watch_interval: Duration,
    /// Retry-scheduler scan cadence; "0s" reproduces the legacy
    /// immediate re-scan.
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// Upper bound for one acknowledgment attempt.
    #[serde(with = "humantime_serde")]
    pub attempt_timeout: Duration,
    /// Persistent gateway sender-id file.
    pub sender_id_path: PathBuf,
    pub onboard_bind: String,
    /// Port of the onboard-systems interface; 0 disables it.
    pub onboard_port: u16,
    /// Technology label treated as the authoritative WiFi backhaul.
    pub wifi_technology: String,
    /// Fixed signal-quality reading until a tuner hookup exists.
    pub dab_signal: i32,
}

impl GatewayConfig {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("devices_csv", "config/devices.csv")?
            .set_default("watch_dir", "data/dab-messages")?
            .set_default("watch_interval", "500ms")?
            .set_default("tick_interval", "250ms")?
            .set_default("attempt_timeout", "30s")?
            .set_default("sender_id_path", "data/sender-id.txt")?
            .set_default("onboard_bind", "0.0.0.0")?
            .set_default("onboard_port", 8001)?
            .set_default("wifi_technology", "Wifi")?
            .set_default("dab_signal", 20)?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("DABGW"));
        builder.build()?.try_deserialize()
    }
}

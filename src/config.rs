use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "codejudge", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: String,

    /// Whether to flush the existing database
    #[arg(long = "flush-data", short = 'f', default_value_t = false)]
    pub flush_data: bool,
}

impl CliArgs {
    /// Load the configuration from the specified file
    pub fn to_config(&self) -> std::io::Result<Config> {
        let file = std::fs::File::open(&self.config_path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| e.into())
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub judge: JudgeConfig,
}

#[derive(Deserialize, Debug)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
}

/// Policy knobs for the remote execution service.
///
/// The poll interval is a tunable cadence, not a protocol requirement;
/// the deadline bounds the total wait for one batch.
#[derive(Deserialize, Debug, Clone)]
pub struct JudgeConfig {
    pub service_url: String,
    pub poll_interval_ms: Option<u64>,
    pub poll_deadline_ms: Option<u64>,
}

impl JudgeConfig {
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
    pub const DEFAULT_POLL_DEADLINE_MS: u64 = 30_000;

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_ms
                .unwrap_or(Self::DEFAULT_POLL_INTERVAL_MS),
        )
    }

    pub fn poll_deadline(&self) -> Duration {
        Duration::from_millis(
            self.poll_deadline_ms
                .unwrap_or(Self::DEFAULT_POLL_DEADLINE_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let file = std::fs::File::open("data/example.json").unwrap();
        let reader = std::io::BufReader::new(file);
        let config: Config = serde_json::from_reader(reader).unwrap();
        assert_eq!(config.server.bind_address, Some("127.0.0.1".to_string()));
        assert_eq!(config.judge.service_url, "http://127.0.0.1:2358");
        assert_eq!(config.judge.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_poll_defaults() {
        let config: JudgeConfig =
            serde_json::from_str(r#"{"service_url": "http://judge0.local"}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
        assert_eq!(config.poll_deadline(), Duration::from_millis(30_000));
    }
}

//! Configuration management
//!
//! Values are layered: built-in defaults, then an optional config file
//! (`chatcall.toml` unless a path is given), then `CHATCALL__SECTION__KEY`
//! environment variables.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub log: LogConfig,
    pub calls: CallsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, `RUST_LOG` wins when set
    pub filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallsConfig {
    /// Audio bit rate in kbit/s used when audio is enabled
    pub audio_bit_rate: u32,
    /// Video bit rate in kbit/s used when video is enabled
    pub video_bit_rate: u32,
    /// Live calls allowed at the same time
    pub max_active_calls: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Default for CallsConfig {
    fn default() -> Self {
        Self {
            audio_bit_rate: 48,
            video_bit_rate: 400,
            max_active_calls: 8,
        }
    }
}

impl Config {
    pub const ENV_PREFIX: &'static str = "CHATCALL";
    pub const DEFAULT_FILE: &'static str = "chatcall";

    /// Load configuration from defaults, file and environment
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        let defaults = ::config::Config::try_from(&Config::default())?;

        ::config::Config::builder()
            .add_source(defaults)
            .add_source(::config::File::with_name(path.unwrap_or(Self::DEFAULT_FILE)).required(false))
            .add_source(
                ::config::Environment::with_prefix(Self::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.calls.audio_bit_rate, 48);
        assert_eq!(config.calls.video_bit_rate, 400);
        assert_eq!(config.calls.max_active_calls, 8);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load(Some("/nonexistent/chatcall-test")).unwrap();
        assert_eq!(config.calls.max_active_calls, 8);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("chatcall-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[calls]\nvideo_bit_rate = 1000\n\n[log]\nfilter = \"debug\"").unwrap();

        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.calls.video_bit_rate, 1000);
        assert_eq!(config.calls.audio_bit_rate, 48);
        assert_eq!(config.log.filter, "debug");

        std::fs::remove_file(path).unwrap();
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    telemetry: TelemetryConfig,
    #[serde(default)]
    log: LogConfig,
}

#[derive(Deserialize, Default)]
struct EngineConfig {
    base_path: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
struct TelemetryConfig {
    period_ms: Option<u64>,
    poll_while_stopped: Option<bool>,
}

#[derive(Deserialize, Default)]
struct LogConfig {
    verbose: Option<bool>,
}

pub struct Config {
    engine: EngineConfig,
    telemetry: TelemetryConfig,
    log: LogConfig,
}

impl Config {
    /// Embedded defaults merged with the user's config file, if any.
    pub fn load() -> Self {
        match user_config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::from_file(embedded()),
        }
    }

    /// Embedded defaults merged with the file at `path`. A missing, unreadable
    /// or malformed file is logged and ignored.
    pub fn load_from(path: &Path) -> Self {
        let mut base = embedded();

        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                    Ok(user) => {
                        merge_engine(&mut base.engine, user.engine);
                        merge_telemetry(&mut base.telemetry, user.telemetry);
                        merge_log(&mut base.log, user.log);
                    }
                    Err(e) => {
                        log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                    }
                },
                Err(e) => {
                    log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                }
            }
        }

        Self::from_file(base)
    }

    fn from_file(file: ConfigFile) -> Self {
        Config {
            engine: file.engine,
            telemetry: file.telemetry,
            log: file.log,
        }
    }

    /// Base path handed to the engine's `init`.
    pub fn base_path(&self) -> PathBuf {
        self.engine
            .base_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("./"))
    }

    /// Telemetry poll period (clamped to 5..=1000 ms).
    pub fn telemetry_period(&self) -> Duration {
        Duration::from_millis(self.telemetry.period_ms.unwrap_or(50).clamp(5, 1000))
    }

    pub fn poll_while_stopped(&self) -> bool {
        self.telemetry.poll_while_stopped.unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.log.verbose.unwrap_or(false)
    }
}

fn embedded() -> ConfigFile {
    toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml")
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("repsys").join("config.toml"))
}

fn merge_engine(base: &mut EngineConfig, user: EngineConfig) {
    if user.base_path.is_some() {
        base.base_path = user.base_path;
    }
}

fn merge_telemetry(base: &mut TelemetryConfig, user: TelemetryConfig) {
    if user.period_ms.is_some() {
        base.period_ms = user.period_ms;
    }
    if user.poll_while_stopped.is_some() {
        base.poll_while_stopped = user.poll_while_stopped;
    }
}

fn merge_log(base: &mut LogConfig, user: LogConfig) {
    if user.verbose.is_some() {
        base.verbose = user.verbose;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_embedded_config() {
        let config = Config::load_from(Path::new("/nonexistent/repsys.toml"));
        assert_eq!(config.base_path(), PathBuf::from("./"));
        assert_eq!(config.telemetry_period(), Duration::from_millis(50));
        assert!(!config.poll_while_stopped());
        assert!(!config.verbose());
    }

    #[test]
    fn test_user_file_overrides_some_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[telemetry]\nperiod_ms = 20\n\n[log]\nverbose = true").unwrap();
        let config = Config::load_from(file.path());
        assert_eq!(config.telemetry_period(), Duration::from_millis(20));
        assert!(config.verbose());
        assert_eq!(config.base_path(), PathBuf::from("./"));
    }

    #[test]
    fn test_period_is_clamped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[telemetry]\nperiod_ms = 1").unwrap();
        assert_eq!(
            Config::load_from(file.path()).telemetry_period(),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn test_malformed_file_is_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[telemetry\nperiod_ms = ").unwrap();
        let config = Config::load_from(file.path());
        assert_eq!(config.telemetry_period(), Duration::from_millis(50));
    }
}

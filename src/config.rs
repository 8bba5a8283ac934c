//! Session configuration: a TOML file with CLI overrides on top.
//!
//! Lookup order is `--config`, then `$MOUSEVR_CONFIG`, then `./mousevr.toml`.
//! With no file at all the built-in defaults are used.

use mousevr_core::SessionParameters;
use mousevr_experiment::TaskTiming;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "MOUSEVR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "mousevr.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub subject: String,
    pub task: String,
    pub trials: u32,
    pub reward_ul: u32,
    pub note: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            subject: String::new(),
            task: String::new(),
            trials: 100,
            reward_ul: 10,
            note: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub device: String,
    pub baud: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyACM0".to_string(),
            baud: 115200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub port: u16,
    pub capacity: usize,
    /// Log every received command
    pub debug: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            port: 22223,
            capacity: 256,
            debug: false,
        }
    }
}

/// Treadmill tuning handed to the renderer; opaque here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    pub allow_rotation_yaw: bool,
    pub allow_rotation_roll: bool,
    pub follow_path: bool,
    pub reverse_direction: bool,
    pub log_treadmill: bool,
    /// degree/s
    pub max_rotation_speed: f32,
    pub path_rotation_mix: f32,
    /// degree/pixel
    pub pitch_scale: f32,
    pub roll_scale: f32,
    pub yaw_scale: f32,
    pub forward_multiplier: f32,
    pub side_multiplier: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            allow_rotation_yaw: false,
            allow_rotation_roll: false,
            follow_path: false,
            reverse_direction: false,
            log_treadmill: true,
            max_rotation_speed: 120.0,
            path_rotation_mix: 0.2,
            pitch_scale: 0.144,
            roll_scale: 0.170,
            yaw_scale: 0.112,
            forward_multiplier: 1.0,
            side_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("mousevr-log.jsonl"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub session: SessionSection,
    pub hardware: HardwareConfig,
    pub channel: ChannelConfig,
    pub timing: TaskTiming,
    pub motion: MotionTuning,
    pub log: LogConfig,
}

impl SessionConfig {
    pub fn parameters(&self) -> SessionParameters {
        SessionParameters {
            subject: self.session.subject.clone(),
            task: self.session.task.as_str().into(),
            trial_budget: self.session.trials,
            reward_ul: self.session.reward_ul,
            note: self.session.note.clone(),
        }
    }

    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Values given on the command line win over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub subject: Option<String>,
    pub task: Option<String>,
    pub trials: Option<u32>,
    pub reward_ul: Option<u32>,
    pub device: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
}

/// Picks the config file to read, if any
pub fn find_config_file(explicit: Option<&Path>) -> ConfigResult<Option<PathBuf>> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(Some(path.to_path_buf()))
        } else {
            Err(ConfigError::FileNotFound(path.display().to_string()))
        };
    }
    if let Ok(env_path) = env::var(CONFIG_ENV) {
        let path = PathBuf::from(env_path);
        return if path.exists() {
            Ok(Some(path))
        } else {
            Err(ConfigError::FileNotFound(format!(
                "{} (from {})",
                path.display(),
                CONFIG_ENV
            )))
        };
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    Ok(local.exists().then_some(local))
}

pub fn load_config(explicit: Option<&Path>, overrides: &Overrides) -> ConfigResult<SessionConfig> {
    let mut config = match find_config_file(explicit)? {
        Some(path) => SessionConfig::from_toml(&fs::read_to_string(path)?)?,
        None => SessionConfig::default(),
    };
    apply_overrides(&mut config, overrides);
    validate_config(&config)?;
    Ok(config)
}

pub fn apply_overrides(config: &mut SessionConfig, overrides: &Overrides) {
    if let Some(subject) = &overrides.subject {
        config.session.subject = subject.clone();
    }
    if let Some(task) = &overrides.task {
        config.session.task = task.clone();
    }
    if let Some(trials) = overrides.trials {
        config.session.trials = trials;
    }
    if let Some(reward_ul) = overrides.reward_ul {
        config.session.reward_ul = reward_ul;
    }
    if let Some(device) = &overrides.device {
        config.hardware.device = device.clone();
    }
    if let Some(port) = overrides.port {
        config.channel.port = port;
    }
    config.channel.debug |= overrides.debug;
}

pub fn validate_config(config: &SessionConfig) -> ConfigResult<()> {
    let invalid = |field, reason: &str| {
        Err(ConfigError::InvalidValue {
            field,
            reason: reason.to_string(),
        })
    };
    if config.session.trials == 0 {
        return invalid("session.trials", "must be at least 1");
    }
    if config.channel.port == 0 {
        return invalid("channel.port", "must be a fixed port");
    }
    if config.channel.capacity == 0 {
        return invalid("channel.capacity", "must be at least 1");
    }
    let timing = &config.timing;
    if !(timing.tick_hz > 0.0) {
        return invalid("timing.tick_hz", "must be positive");
    }
    if !(timing.punishment_latency_s >= 0.0) {
        return invalid("timing.punishment_latency_s", "must not be negative");
    }
    if timing.punishment_latency_s >= timing.punishment_duration_s {
        return invalid(
            "timing.punishment_duration_s",
            "must be longer than the punishment latency",
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mousevr_core::TaskKind;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.channel.port, 22223);
        assert_eq!(config.timing.punishment_latency_s, 2.0);
        assert_eq!(config.motion.max_rotation_speed, 120.0);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = SessionConfig::from_toml(
            r#"
            [session]
            subject = "m12"
            task = "avoidance"
            trials = 40

            [timing]
            punishment_duration_s = 8.0
            "#,
        )
        .unwrap();
        assert_eq!(config.session.subject, "m12");
        assert_eq!(config.session.reward_ul, 10);
        assert_eq!(config.timing.punishment_duration_s, 8.0);
        assert_eq!(config.timing.start_waypoint, "10");

        let params = config.parameters();
        assert_eq!(params.task, TaskKind::Avoidance);
        assert_eq!(params.trial_budget, 40);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            SessionConfig::from_toml("[session\nsubject = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nsubject = \"file\"\ntrials = 5\n[channel]\nport = 4000").unwrap();

        let overrides = Overrides {
            subject: Some("cli".into()),
            port: Some(5000),
            debug: true,
            ..Overrides::default()
        };
        let config = load_config(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.session.subject, "cli");
        assert_eq!(config.session.trials, 5);
        assert_eq!(config.channel.port, 5000);
        assert!(config.channel.debug);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let missing = Path::new("/nonexistent/mousevr.toml");
        assert!(matches!(
            load_config(Some(missing), &Overrides::default()),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = SessionConfig::default();
        config.session.trials = 0;
        assert!(validate_config(&config).is_err());

        let mut config = SessionConfig::default();
        config.timing.punishment_latency_s = 7.0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue {
                field: "timing.punishment_duration_s",
                ..
            })
        ));

        let mut config = SessionConfig::default();
        config.timing.tick_hz = 0.0;
        assert!(validate_config(&config).is_err());
    }
}

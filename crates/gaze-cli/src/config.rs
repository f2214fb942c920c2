//! Tuning file – reads/writes `~/.gaze/config.toml`.

use gaze_runtime::EyeLoopConfig;
use gaze_types::{
    CalibrationTuning, GazeError, LoopTuning, PerceptionTuning, PresenceTuning, PublisherTuning,
    SensorTuning,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted tuning, one TOML table per concern.  Missing tables and keys
/// fall back to the firmware defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sensor: SensorTuning,
    pub calibration: CalibrationTuning,
    pub perception: PerceptionTuning,
    pub presence: PresenceTuning,
    pub publisher: PublisherTuning,
    #[serde(rename = "loop")]
    pub cadence: LoopTuning,
}

impl Config {
    pub fn into_loop_config(self) -> EyeLoopConfig {
        EyeLoopConfig {
            sensor: self.sensor,
            calibration: self.calibration,
            perception: self.perception,
            presence: self.presence,
            publisher: self.publisher,
            cadence: self.cadence,
        }
    }
}

/// Return the path to `~/.gaze/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".gaze").join("config.toml")
}

/// Load the config from disk and apply environment overrides.  Returns
/// `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, GazeError> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, GazeError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| GazeError::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| GazeError::Config(format!("failed to parse: {e}")))
}

/// Apply `GAZE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `GAZE_TOO_CLOSE_MM` | `presence.too_close_mm` |
/// | `GAZE_EVENT_NAME` | `publisher.event_name` |
/// | `GAZE_SAMPLE_INTERVAL_MS` | `loop.sample_interval_ms` |
/// | `GAZE_PUBLISH_INTERVAL_MS` | `publisher.min_interval_ms` |
///
/// Unparseable numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("GAZE_TOO_CLOSE_MM")
        && let Ok(mm) = v.trim().parse::<i32>()
    {
        cfg.presence.too_close_mm = mm;
    }
    if let Ok(v) = std::env::var("GAZE_EVENT_NAME")
        && !v.is_empty()
    {
        cfg.publisher.event_name = v;
    }
    if let Ok(v) = std::env::var("GAZE_SAMPLE_INTERVAL_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.cadence.sample_interval_ms = ms;
    }
    if let Ok(v) = std::env::var("GAZE_PUBLISH_INTERVAL_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.publisher.min_interval_ms = ms;
    }
}

/// Save the config to disk, creating `~/.gaze/` if necessary.
pub fn save(cfg: &Config) -> Result<(), GazeError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), GazeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| GazeError::Config(format!("failed to create config directory: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                GazeError::Config(format!("failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| GazeError::Config(format!("failed to serialize: {e}")))?;
    let write_err = |e: std::io::Error| {
        GazeError::Config(format!("failed to write {}: {e}", path.display()))
    };
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}

//! `gaze-types` – vocabulary shared by every gaze crate.
//!
//! Holds the presence event table understood by both the eye firmware and the
//! mouth-control system, the workspace-wide [`GazeError`], and the tuning
//! structs that the CLI loads from `config.toml`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Presence events
// ────────────────────────────────────────────────────────────────────────────

/// Discrete presence events reported by the eye mechanism.
///
/// The integer codes are a wire contract with the mouth-control system: the
/// payload published for an event is the decimal string of [`TofEvent::code`].
/// Never renumber a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TofEvent {
    NoChangeInFov,
    /// Empty field of view went to a valid detection.
    PersonEnteredFov,
    /// A detection went to an empty field of view after a long visit.
    PersonLeftFov,
    /// The nearest detection is closer than the too-close threshold.
    PersonTooClose,
    /// Same as [`TofEvent::PersonLeftFov`] but the visit was short.
    PersonLeftQuickly,
    /// The system has (re)booted, calibrated, and is ready.
    PuppetIsReady,
}

impl TofEvent {
    /// Every event, in code order.
    pub const ALL: [TofEvent; 6] = [
        TofEvent::NoChangeInFov,
        TofEvent::PersonEnteredFov,
        TofEvent::PersonLeftFov,
        TofEvent::PersonTooClose,
        TofEvent::PersonLeftQuickly,
        TofEvent::PuppetIsReady,
    ];

    /// Integer code shared with the mouth-control firmware.
    pub fn code(self) -> i32 {
        match self {
            TofEvent::NoChangeInFov => 0,
            TofEvent::PersonEnteredFov => 1,
            TofEvent::PersonLeftFov => 2,
            TofEvent::PersonTooClose => 3,
            TofEvent::PersonLeftQuickly => 4,
            TofEvent::PuppetIsReady => 5,
        }
    }

    /// Publish payload: the decimal string of [`TofEvent::code`].
    pub fn payload(self) -> String {
        self.code().to_string()
    }

    /// Human-readable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            TofEvent::NoChangeInFov => "No_change_in_fov",
            TofEvent::PersonEnteredFov => "Person_entered_fov",
            TofEvent::PersonLeftFov => "Person_left_fov",
            TofEvent::PersonTooClose => "Person_too_close",
            TofEvent::PersonLeftQuickly => "Person_left_quickly",
            TofEvent::PuppetIsReady => "Puppet_is_ready",
        }
    }
}

impl std::fmt::Display for TofEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for TofEvent {
    type Error = GazeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        TofEvent::ALL
            .into_iter()
            .find(|e| e.code() == code)
            .ok_or_else(|| GazeError::UnknownEvent(code))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Error type spanning sensor faults, calibration, publishing and config.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GazeError {
    #[error("TOF sensor not found - check wiring")]
    SensorNotFound,

    #[error("Sensor Fault on {sensor}: {details}")]
    SensorFault { sensor: String, details: String },

    #[error("Calibration failed: {0}")]
    CalibrationFailed(String),

    #[error("Resolution {resolution} is not a square zone grid")]
    InvalidGeometry { resolution: usize },

    #[error("Publish of {event} failed: {details}")]
    Publish { event: String, details: String },

    #[error("Animation Error: {0}")]
    Animation(String),

    #[error("Unknown event code {0}")]
    UnknownEvent(i32),

    #[error("Config Error: {0}")]
    Config(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Tuning
// ────────────────────────────────────────────────────────────────────────────

/// Frame processing and point-of-interest selection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionTuning {
    /// Readings within this many mm of the calibration baseline are noise.
    pub noise_range_mm: i32,
    /// Ceiling for valid readings and for calibration baselines.
    pub max_calibration_mm: i32,
    /// Sensor status codes that mean "measurement is usable".
    pub accepted_statuses: Vec<u8>,
    /// Minimum number of foreground zones in a 3×3 neighborhood.
    pub min_valid_score: usize,
    /// Consecutive frames a detection must persist before it is exposed.
    pub frames_for_good_hit: u32,
    /// When set, a detection that moves this many zones (or more) on either
    /// axis restarts the streak. `None` ignores position entirely.
    pub jitter_tolerance: Option<usize>,
}

impl Default for PerceptionTuning {
    fn default() -> Self {
        Self {
            noise_range_mm: 50,
            max_calibration_mm: 2000,
            accepted_statuses: vec![5, 6, 9],
            min_valid_score: 3,
            frames_for_good_hit: 2,
            jitter_tolerance: None,
        }
    }
}

/// Startup background capture parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationTuning {
    /// Two frames whose summed distances differ by less than this are stable.
    pub similarity_threshold_mm: i64,
    /// Frame ceiling after which calibration is accepted as-is.
    pub max_frames: u32,
    /// Sleep between sensor polls.
    pub poll_interval_ms: u64,
}

impl Default for CalibrationTuning {
    fn default() -> Self {
        Self {
            similarity_threshold_mm: 500,
            max_frames: 500,
            poll_interval_ms: 5,
        }
    }
}

/// Sensor bring-up parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorTuning {
    /// Number of zones (16 for 4×4, 64 for 8×8).
    pub resolution: usize,
    /// Ranging frames per second.
    pub ranging_frequency_hz: u8,
}

impl Default for SensorTuning {
    fn default() -> Self {
        Self {
            resolution: 64,
            ranging_frequency_hz: 14,
        }
    }
}

/// Presence state machine timers and thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceTuning {
    /// Detections nearer than this are "too close".
    pub too_close_mm: i32,
    /// Visits shorter than this end with `Person_left_quickly`.
    pub left_quickly_ms: u64,
    /// Time spent in `PersonLeft` before returning to `Idle`.
    pub person_left_hold_ms: u64,
}

impl Default for PresenceTuning {
    fn default() -> Self {
        Self {
            too_close_mm: 254,
            left_quickly_ms: 15_000,
            person_left_hold_ms: 5_000,
        }
    }
}

/// Event publisher parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherTuning {
    /// Name under which presence events are published.
    pub event_name: String,
    /// Minimum spacing between two publishes.
    pub min_interval_ms: u64,
}

impl Default for PublisherTuning {
    fn default() -> Self {
        Self {
            event_name: "tofEvent".to_string(),
            min_interval_ms: 1000,
        }
    }
}

/// Control loop cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopTuning {
    /// Minimum interval between sensor samples, independent of loop speed.
    pub sample_interval_ms: u64,
    /// Sleep between loop iterations in the binary.
    pub tick_ms: u64,
}

impl Default for LoopTuning {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000 / u64::from(SensorTuning::default().ranging_frequency_hz),
            tick_ms: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_codes_match_shared_table() {
        let codes: Vec<i32> = TofEvent::ALL.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(TofEvent::PersonTooClose.payload(), "3");
    }

    #[test]
    fn event_from_code() {
        assert_eq!(TofEvent::try_from(4).unwrap(), TofEvent::PersonLeftQuickly);
        assert_eq!(TofEvent::try_from(-1), Err(GazeError::UnknownEvent(-1)));
        assert_eq!(TofEvent::try_from(6), Err(GazeError::UnknownEvent(6)));
    }

    #[test]
    fn event_display_uses_table_name() {
        assert_eq!(TofEvent::PersonEnteredFov.to_string(), "Person_entered_fov");
    }

    #[test]
    fn event_serializes_by_name() {
        let json = serde_json::to_string(&TofEvent::PuppetIsReady).unwrap();
        assert_eq!(json, "\"PuppetIsReady\"");
    }

    #[test]
    fn tuning_defaults_match_firmware() {
        let p = PerceptionTuning::default();
        assert_eq!(p.noise_range_mm, 50);
        assert_eq!(p.max_calibration_mm, 2000);
        assert_eq!(p.accepted_statuses, vec![5, 6, 9]);
        assert_eq!(PresenceTuning::default().too_close_mm, 254);
        assert_eq!(LoopTuning::default().sample_interval_ms, 71);
    }

    #[test]
    fn partial_tuning_fills_defaults() {
        let p: PresenceTuning = toml::from_str("too_close_mm = 300").unwrap();
        assert_eq!(p.too_close_mm, 300);
        assert_eq!(p.left_quickly_ms, 15_000);
    }

    #[test]
    fn gaze_error_display() {
        let err = GazeError::SensorFault {
            sensor: "vl53l5cx".to_string(),
            details: "i2c timeout".to_string(),
        };
        assert!(err.to_string().contains("vl53l5cx"));
        assert!(GazeError::SensorNotFound.to_string().contains("not found"));
    }
}

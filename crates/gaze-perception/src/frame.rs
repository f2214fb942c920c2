//! Frame Processor.
//!
//! Classifies every zone of a [`SensorFrame`] against the
//! [`CalibrationGrid`] into exactly one [`AdjustedZone`]:
//!
//! | Check (in order) | Outcome |
//! |---|---|
//! | status not in the accepted set | [`AdjustedZone::BadStatus`] |
//! | distance is `<= 0` or above the calibration ceiling | [`AdjustedZone::OutOfRange`] |
//! | within the noise band of, or behind, the baseline | [`AdjustedZone::Background`] |
//! | otherwise | [`AdjustedZone::Foreground`] |

use gaze_hal::sensor::SensorFrame;
use gaze_types::{GazeError, PerceptionTuning};

use crate::calibration::CalibrationGrid;

// ────────────────────────────────────────────────────────────────────────────
// AdjustedZone
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of background subtraction for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustedZone {
    /// Valid foreground measurement in millimetres (always positive).
    Foreground(i32),
    /// The sensor flagged the measurement as unreliable.
    BadStatus,
    /// Nothing measured (zero or negative), or beyond the calibration ceiling.
    OutOfRange,
    /// At, or behind, the calibrated background.
    Background,
}

impl AdjustedZone {
    /// Signed code used in debug tables: the distance for foreground zones,
    /// `-1`, `-2` and `-3` for the other outcomes.
    pub fn code(self) -> i32 {
        match self {
            AdjustedZone::Foreground(mm) => mm,
            AdjustedZone::BadStatus => -1,
            AdjustedZone::OutOfRange => -2,
            AdjustedZone::Background => -3,
        }
    }

    /// The foreground distance, if any.
    pub fn foreground(self) -> Option<i32> {
        match self {
            AdjustedZone::Foreground(mm) => Some(mm),
            _ => None,
        }
    }

    pub fn is_foreground(self) -> bool {
        matches!(self, AdjustedZone::Foreground(_))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AdjustedFrame
// ────────────────────────────────────────────────────────────────────────────

/// Background-subtracted frame, same shape as the [`SensorFrame`] it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustedFrame {
    width: usize,
    zones: Vec<AdjustedZone>,
}

impl AdjustedFrame {
    /// Build a frame from row-major zones.
    ///
    /// # Errors
    ///
    /// Returns [`GazeError::InvalidGeometry`] when `zones.len() != width²`.
    pub fn new(width: usize, zones: Vec<AdjustedZone>) -> Result<Self, GazeError> {
        if width == 0 || zones.len() != width * width {
            return Err(GazeError::InvalidGeometry {
                resolution: zones.len(),
            });
        }
        Ok(Self { width, zones })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zones(&self) -> &[AdjustedZone] {
        &self.zones
    }

    /// Zone at row-major `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the grid.
    pub fn get(&self, index: usize) -> AdjustedZone {
        self.zones[index]
    }

    /// `(x, y)` coordinates of row-major `index`.
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// The 3×3 block centred on `index`, clipped to the grid, self included.
    pub fn neighborhood(&self, index: usize) -> impl Iterator<Item = AdjustedZone> + '_ {
        let (cx, cy) = self.coords(index);
        let xs = cx.saturating_sub(1)..=(cx + 1).min(self.width - 1);
        let ys = cy.saturating_sub(1)..=(cy + 1).min(self.width - 1);
        ys.flat_map(move |y| xs.clone().map(move |x| self.zones[y * self.width + x]))
    }

    /// Signed codes of every zone, row-major.
    pub fn codes(&self) -> Vec<i32> {
        self.zones.iter().map(|z| z.code()).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Frame processing
// ────────────────────────────────────────────────────────────────────────────

/// Classify one zone.
fn classify(distance_mm: i32, status: u8, baseline_mm: i32, tuning: &PerceptionTuning) -> AdjustedZone {
    if !tuning.accepted_statuses.contains(&status) {
        return AdjustedZone::BadStatus;
    }
    if distance_mm <= 0 || distance_mm > tuning.max_calibration_mm {
        return AdjustedZone::OutOfRange;
    }
    let delta = (distance_mm - baseline_mm).abs();
    if delta <= tuning.noise_range_mm || distance_mm > baseline_mm {
        return AdjustedZone::Background;
    }
    AdjustedZone::Foreground(distance_mm)
}

/// Background-subtract `frame` against `calibration`.
///
/// # Errors
///
/// Returns [`GazeError::InvalidGeometry`] when the frame and the calibration
/// grid do not have the same number of zones.
pub fn process_frame(
    frame: &SensorFrame,
    calibration: &CalibrationGrid,
    tuning: &PerceptionTuning,
) -> Result<AdjustedFrame, GazeError> {
    if frame.resolution() != calibration.resolution() {
        return Err(GazeError::InvalidGeometry {
            resolution: frame.resolution(),
        });
    }
    let zones = frame
        .zones()
        .iter()
        .zip(calibration.baselines())
        .map(|(reading, &baseline)| classify(reading.distance_mm, reading.status, baseline, tuning))
        .collect();
    Ok(AdjustedFrame {
        width: frame.width(),
        zones,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

//! Point-of-Interest Selector.
//!
//! Scans an [`AdjustedFrame`] in raster order and keeps the single nearest
//! zone that passes every qualifying check:
//!
//! 1. the zone is foreground;
//! 2. its neighborhood [`score`] meets the validity minimum;
//! 3. it is strictly nearer than its own calibration baseline;
//! 4. it is strictly nearer than the best zone found so far;
//! 5. its neighborhood average is beyond the noise range.
//!
//! Ties keep the first zone in raster order.
//!
//! A [`PointOfInterest`] distinguishes "no new sensor data this poll" from
//! "new data, nothing detected".  Consumers must check
//! [`PointOfInterest::got_new_sensor_data`] before trusting
//! [`PointOfInterest::has_detection`].

use gaze_hal::sensor::{SensorFrame, TofSensor};
use gaze_types::{GazeError, PerceptionTuning};
use tracing::{Level, trace, warn};

use crate::calibration::CalibrationGrid;
use crate::frame::{AdjustedFrame, process_frame};
use crate::table::GridTable;
use crate::zone::{is_valid, neighborhood_average, score};

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// The nearest validated foreground zone of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Zone column, `0 <= x < width`.
    pub x: usize,
    /// Zone row, `0 <= y < width`.
    pub y: usize,
    /// Measured distance, in `(0, max_calibration_mm]`.
    pub distance_mm: i32,
    pub detected_at_ms: u64,
    /// Calibration baseline of the winning zone.
    pub calibration_dist_mm: i32,
    /// Foreground zones around the winner, itself included.
    pub surrounding_hits: usize,
}

impl Detection {
    /// How far in front of the background the target is (negative).
    pub fn delta_from_baseline(&self) -> i32 {
        self.distance_mm - self.calibration_dist_mm
    }
}

/// Result of one poll of the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointOfInterest {
    /// `false` when the sensor had no fresh frame; `detection` is then `None`
    /// and means nothing.
    pub got_new_sensor_data: bool,
    pub detection: Option<Detection>,
}

impl PointOfInterest {
    /// No fresh frame this poll.
    pub fn stale() -> Self {
        Self {
            got_new_sensor_data: false,
            detection: None,
        }
    }

    /// A fresh frame with the given outcome.
    pub fn fresh(detection: Option<Detection>) -> Self {
        Self {
            got_new_sensor_data: true,
            detection,
        }
    }

    pub fn has_detection(&self) -> bool {
        self.detection.is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PoiSelector
// ────────────────────────────────────────────────────────────────────────────

/// Finds the nearest validated zone against a fixed [`CalibrationGrid`].
#[derive(Debug, Clone)]
pub struct PoiSelector {
    calibration: CalibrationGrid,
    tuning: PerceptionTuning,
}

impl PoiSelector {
    pub fn new(calibration: CalibrationGrid, tuning: PerceptionTuning) -> Self {
        Self {
            calibration,
            tuning,
        }
    }

    pub fn calibration(&self) -> &CalibrationGrid {
        &self.calibration
    }

    pub fn tuning(&self) -> &PerceptionTuning {
        &self.tuning
    }

    /// Scan `adjusted` for the nearest qualifying zone.
    pub fn select(&self, adjusted: &AdjustedFrame, now_ms: u64) -> Option<Detection> {
        let mut best_mm = self.tuning.max_calibration_mm + 1;
        let mut best: Option<Detection> = None;

        for index in 0..adjusted.len() {
            let Some(distance_mm) = adjusted.get(index).foreground() else {
                continue;
            };
            let hits = score(adjusted, index);
            let baseline = self.calibration.baseline(index);
            let avg_beyond_noise = neighborhood_average(adjusted, index)
                .foreground()
                .is_some_and(|avg| avg > self.tuning.noise_range_mm);

            if is_valid(hits, &self.tuning)
                && distance_mm < baseline
                && distance_mm < best_mm
                && avg_beyond_noise
            {
                let (x, y) = adjusted.coords(index);
                best_mm = distance_mm;
                best = Some(Detection {
                    x,
                    y,
                    distance_mm,
                    detected_at_ms: now_ms,
                    calibration_dist_mm: baseline,
                    surrounding_hits: hits,
                });
            }
        }
        best
    }

    /// Background-subtract `frame` and select from it.
    ///
    /// # Errors
    ///
    /// Returns [`GazeError::InvalidGeometry`] if `frame` does not match the
    /// calibration grid.
    pub fn process(&self, frame: &SensorFrame, now_ms: u64) -> Result<PointOfInterest, GazeError> {
        let adjusted = process_frame(frame, &self.calibration, &self.tuning)?;
        if tracing::enabled!(Level::TRACE) {
            trace!("adjusted frame:\n{}", GridTable::new(adjusted.width(), adjusted.codes()));
        }
        Ok(PointOfInterest::fresh(self.select(&adjusted, now_ms)))
    }

    /// Non-blocking poll: read a frame if one is ready and select from it.
    ///
    /// A failed read or a malformed frame is logged and reported as stale.
    pub fn poll<S: TofSensor + ?Sized>(&self, sensor: &mut S, now_ms: u64) -> PointOfInterest {
        if !sensor.is_data_ready() {
            return PointOfInterest::stale();
        }
        match sensor.read_frame().and_then(|frame| self.process(&frame, now_ms)) {
            Ok(poi) => poi,
            Err(e) => {
                warn!(sensor = %sensor.id(), error = %e, "dropping unreadable frame");
                PointOfInterest::stale()
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

//! Calibration Store.
//!
//! Captures the per-zone background distance once at startup.  The sensor is
//! polled until two successive frames have summed distances within
//! [`CalibrationTuning::similarity_threshold_mm`] of each other, or until the
//! frame ceiling is hit.  Hitting the ceiling is not fatal: the last frame
//! read is accepted and the failure is logged, because eyes with imperfect
//! calibration are better than eyes that never start.
//!
//! Every baseline is clamped to `[1, max_calibration_mm]`: a zero or an
//! oversized reading becomes the ceiling.

use std::thread;
use std::time::Duration;

use gaze_hal::sensor::{SensorFrame, TofSensor};
use gaze_types::{CalibrationTuning, GazeError};
use tracing::{error, info, trace, warn};

use crate::table::GridTable;

/// Immutable per-zone background baselines, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationGrid {
    width: usize,
    baselines: Vec<i32>,
}

/// Result of [`CalibrationGrid::capture`].
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    pub grid: CalibrationGrid,
    /// Frames read before the loop ended.
    pub frames_used: u32,
    /// `false` when the frame ceiling was reached without two similar frames.
    pub converged: bool,
}

impl CalibrationGrid {
    /// Baselines from a single frame, clamping zero or oversized readings to
    /// `max_calibration_mm`.
    pub fn from_frame(frame: &SensorFrame, max_calibration_mm: i32) -> Self {
        let baselines = frame
            .zones()
            .iter()
            .map(|z| {
                if z.distance_mm <= 0 || z.distance_mm > max_calibration_mm {
                    max_calibration_mm
                } else {
                    z.distance_mm
                }
            })
            .collect();
        Self {
            width: frame.width(),
            baselines,
        }
    }

    /// Block until the background is stable and capture it.
    ///
    /// The sensor must already be ranging.  Polls without data and failed
    /// reads count toward a ceiling of ten times `max_frames`, so the call
    /// always terminates.
    ///
    /// # Errors
    ///
    /// Returns [`GazeError::CalibrationFailed`] when no frame at all could be
    /// read before the poll ceiling.
    pub fn capture<S: TofSensor + ?Sized>(
        sensor: &mut S,
        tuning: &CalibrationTuning,
        max_calibration_mm: i32,
    ) -> Result<CalibrationOutcome, GazeError> {
        let poll_interval = Duration::from_millis(tuning.poll_interval_ms);
        let poll_ceiling = u64::from(tuning.max_frames.max(1)) * 10;
        let mut idle_polls: u64 = 0;

        let mut frames_used: u32 = 0;
        let mut last_sum: i64 = 0;
        let mut last_frame: Option<SensorFrame> = None;
        let mut converged = false;

        loop {
            if sensor.is_data_ready() {
                match sensor.read_frame() {
                    Ok(frame) => {
                        frames_used += 1;
                        let sum = frame.total_distance();
                        trace!(sum_mm = sum, frame = frames_used, "calibration frame");
                        let stable = (last_sum - sum).abs() < tuning.similarity_threshold_mm;
                        last_sum = sum;
                        last_frame = Some(frame);
                        if stable {
                            converged = true;
                            info!(frames = frames_used, "calibration done");
                            break;
                        }
                    }
                    Err(e) => {
                        idle_polls += 1;
                        warn!(error = %e, "calibration frame read failed");
                    }
                }
            } else {
                idle_polls += 1;
            }

            if frames_used > tuning.max_frames || idle_polls > poll_ceiling {
                error!(
                    frames = frames_used,
                    idle_polls, "could not calibrate; accepting last frame"
                );
                break;
            }

            if !poll_interval.is_zero() {
                thread::sleep(poll_interval);
            }
        }

        let frame = last_frame.ok_or_else(|| {
            GazeError::CalibrationFailed(format!(
                "sensor '{}' produced no frame after {idle_polls} polls",
                sensor.id()
            ))
        })?;
        let grid = Self::from_frame(&frame, max_calibration_mm);
        info!("calibration data:\n{}", GridTable::new(grid.width, grid.baselines.clone()));

        Ok(CalibrationOutcome {
            grid,
            frames_used,
            converged,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn resolution(&self) -> usize {
        self.baselines.len()
    }

    /// Baselines in row-major order.
    pub fn baselines(&self) -> &[i32] {
        &self.baselines
    }

    /// Baseline of row-major zone `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the grid.
    pub fn baseline(&self, index: usize) -> i32 {
        self.baselines[index]
    }
}

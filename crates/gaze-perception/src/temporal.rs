//! Temporal Filter.
//!
//! A detection is only exposed once it has been reported on
//! `frames_for_good_hit` consecutive fresh frames.  Shorter streaks are
//! suppressed: the POI is returned with its detection cleared.  A fresh frame
//! without a detection ends the streak; a stale poll changes nothing.
//!
//! # Example
//!
//! ```rust
//! use gaze_perception::poi::{Detection, PointOfInterest};
//! use gaze_perception::temporal::TemporalFilter;
//!
//! let hit = Detection {
//!     x: 3, y: 3, distance_mm: 300, detected_at_ms: 0,
//!     calibration_dist_mm: 2000, surrounding_hits: 9,
//! };
//! let mut filter = TemporalFilter::new(2, None);
//!
//! assert!(!filter.apply(PointOfInterest::fresh(Some(hit))).has_detection());
//! assert!(filter.apply(PointOfInterest::fresh(Some(hit))).has_detection());
//! ```

use tracing::trace;

use crate::poi::{Detection, PointOfInterest};

/// Streak-based debouncer for [`PointOfInterest`] detections.
#[derive(Debug, Clone)]
pub struct TemporalFilter {
    frames_for_good_hit: u32,
    jitter_tolerance: Option<usize>,
    waiting_first_detection: bool,
    sequential_frames_with_hit: u32,
    current: Option<(usize, usize)>,
    suppressed: Option<(usize, usize)>,
}

impl TemporalFilter {
    /// `jitter_tolerance` of `None` lets any detection continue the streak
    /// wherever it is; `Some(n)` restarts the streak when the detection jumps
    /// `n` or more zones on either axis.
    pub fn new(frames_for_good_hit: u32, jitter_tolerance: Option<usize>) -> Self {
        Self {
            frames_for_good_hit,
            jitter_tolerance,
            waiting_first_detection: true,
            sequential_frames_with_hit: 0,
            current: None,
            suppressed: None,
        }
    }

    /// Length of the current detection streak.
    pub fn streak(&self) -> u32 {
        self.sequential_frames_with_hit
    }

    /// `true` until the next detection starts a fresh streak.
    pub fn is_waiting(&self) -> bool {
        self.waiting_first_detection
    }

    /// Debounce one poll result.
    pub fn apply(&mut self, poi: PointOfInterest) -> PointOfInterest {
        if !poi.got_new_sensor_data {
            return poi;
        }
        let Some(det) = poi.detection else {
            self.waiting_first_detection = true;
            return poi;
        };

        if self.waiting_first_detection {
            self.waiting_first_detection = false;
            self.sequential_frames_with_hit = 0;
            self.current = Some((det.x, det.y));
            self.suppressed = None;
        }

        if self.same_location(&det) {
            self.sequential_frames_with_hit += 1;
        } else {
            self.sequential_frames_with_hit = 1;
            self.current = Some((det.x, det.y));
        }

        if self.sequential_frames_with_hit >= self.frames_for_good_hit {
            trace!(
                x = det.x,
                y = det.y,
                dist_mm = det.distance_mm,
                calib_mm = det.calibration_dist_mm,
                delta_mm = det.delta_from_baseline(),
                frames = self.sequential_frames_with_hit,
                surrounding = det.surrounding_hits,
                "temporal filter passes point"
            );
            return poi;
        }

        if self.suppressed != Some((det.x, det.y)) {
            trace!(
                x = det.x,
                y = det.y,
                dist_mm = det.distance_mm,
                calib_mm = det.calibration_dist_mm,
                delta_mm = det.delta_from_baseline(),
                "POI suppressed"
            );
            self.suppressed = Some((det.x, det.y));
        }
        PointOfInterest::fresh(None)
    }

    fn same_location(&self, det: &Detection) -> bool {
        match (self.jitter_tolerance, self.current) {
            (Some(tolerance), Some((cx, cy))) => {
                cx.abs_diff(det.x) < tolerance && cy.abs_diff(det.y) < tolerance
            }
            _ => true,
        }
    }
}

//! Eye targeting.
//!
//! Maps the raw (not debounced) point of interest onto servo targets so the
//! eyes react on the very frame something appears.  Zone columns are
//! mirrored because the sensor faces the visitor: zone `x = 0` is on the
//! eyes' right.
//!
//! Commands are only sent when the target zone changes.  When tracking is
//! lost the eyes recentre and the lids drop to half.

use gaze_hal::animator::{AnimationCommand, Animator, EyeChannel};
use gaze_perception::poi::PointOfInterest;
use gaze_types::GazeError;
use tracing::debug;

const CENTRE: u8 = 50;
const LID_OPEN: u8 = 100;
const LID_RESTING: u8 = 50;

/// Turns POIs into [`AnimationCommand`]s.
#[derive(Debug, Clone)]
pub struct EyeDriver {
    width: usize,
    speed: u8,
    target: Option<(usize, usize)>,
}

impl EyeDriver {
    /// Driver for a `width`×`width` zone grid, moving servos at `speed` (0–100).
    pub fn new(width: usize, speed: u8) -> Self {
        Self {
            width,
            speed,
            target: None,
        }
    }

    /// Zone currently being looked at.
    pub fn target(&self) -> Option<(usize, usize)> {
        self.target
    }

    /// Horizontal servo target for zone column `x`, mirrored.
    pub fn horizontal_target(&self, x: usize) -> u8 {
        self.scale(self.width.saturating_sub(1).saturating_sub(x))
    }

    /// Vertical servo target for zone row `y`.
    pub fn vertical_target(&self, y: usize) -> u8 {
        self.scale(y)
    }

    fn scale(&self, zone: usize) -> u8 {
        let span = self.width.saturating_sub(1);
        if span == 0 {
            return CENTRE;
        }
        (zone.min(span) * 100 / span) as u8
    }

    /// Queue the moves needed to look at `poi`.  Returns `true` when commands
    /// were sent.
    ///
    /// # Errors
    ///
    /// Propagates [`GazeError::Animation`] from the animator.
    pub fn drive<A: Animator + ?Sized>(
        &mut self,
        animator: &mut A,
        poi: &PointOfInterest,
    ) -> Result<bool, GazeError> {
        if !poi.got_new_sensor_data {
            return Ok(false);
        }
        match (poi.detection, self.target) {
            (Some(det), Some(current)) if current == (det.x, det.y) => Ok(false),
            (Some(det), previous) => {
                if animator.is_running() {
                    animator.clear();
                }
                let h = self.horizontal_target(det.x);
                let v = self.vertical_target(det.y);
                animator.enqueue(AnimationCommand::new(EyeChannel::Horizontal, h, self.speed))?;
                animator.enqueue(AnimationCommand::new(EyeChannel::Vertical, v, self.speed))?;
                if previous.is_none() {
                    animator.enqueue(AnimationCommand::new(EyeChannel::Eyelid, LID_OPEN, self.speed))?;
                }
                debug!(x = det.x, y = det.y, h, v, "eyes retargeted");
                self.target = Some((det.x, det.y));
                Ok(true)
            }
            (None, Some(_)) => {
                animator.clear();
                animator.enqueue(AnimationCommand::new(EyeChannel::Horizontal, CENTRE, self.speed))?;
                animator.enqueue(AnimationCommand::new(EyeChannel::Vertical, CENTRE, self.speed))?;
                animator.enqueue(AnimationCommand::new(EyeChannel::Eyelid, LID_RESTING, self.speed))?;
                debug!("target lost; eyes resting");
                self.target = None;
                Ok(true)
            }
            (None, None) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaze_hal::sim::SimAnimator;
    use gaze_perception::poi::Detection;

    fn seen(x: usize, y: usize) -> PointOfInterest {
        PointOfInterest::fresh(Some(Detection {
            x,
            y,
            distance_mm: 700,
            detected_at_ms: 0,
            calibration_dist_mm: 2000,
            surrounding_hits: 9,
        }))
    }

    fn play_all(anim: &mut SimAnimator) {
        for t in 0..10 {
            anim.update(t);
        }
    }

    #[test]
    fn targets_are_scaled_and_mirrored() {
        let eyes = EyeDriver::new(8, 60);
        assert_eq!(eyes.horizontal_target(0), 100);
        assert_eq!(eyes.horizontal_target(7), 0);
        assert_eq!(eyes.vertical_target(0), 0);
        assert_eq!(eyes.vertical_target(7), 100);
        assert_eq!(eyes.vertical_target(3), 42);
    }

    #[test]
    fn single_zone_grid_stays_centred() {
        let eyes = EyeDriver::new(1, 60);
        assert_eq!(eyes.horizontal_target(0), CENTRE);
    }

    #[test]
    fn first_detection_opens_lids_and_aims() {
        let mut eyes = EyeDriver::new(8, 60);
        let mut anim = SimAnimator::new();
        assert!(eyes.drive(&mut anim, &seen(7, 0)).unwrap());
        play_all(&mut anim);
        assert_eq!(anim.position(EyeChannel::Horizontal), 0);
        assert_eq!(anim.position(EyeChannel::Vertical), 0);
        assert_eq!(anim.position(EyeChannel::Eyelid), LID_OPEN);
        assert_eq!(eyes.target(), Some((7, 0)));
    }

    #[test]
    fn same_zone_sends_nothing() {
        let mut eyes = EyeDriver::new(8, 60);
        let mut anim = SimAnimator::new();
        eyes.drive(&mut anim, &seen(2, 2)).unwrap();
        assert!(!eyes.drive(&mut anim, &seen(2, 2)).unwrap());
        assert_eq!(anim.pending(), 3);
    }

    #[test]
    fn moving_target_replaces_pending_moves() {
        let mut eyes = EyeDriver::new(8, 60);
        let mut anim = SimAnimator::new();
        eyes.drive(&mut anim, &seen(2, 2)).unwrap();
        eyes.drive(&mut anim, &seen(5, 5)).unwrap();
        assert_eq!(anim.pending(), 2);
        play_all(&mut anim);
        assert_eq!(anim.position(EyeChannel::Horizontal), eyes.horizontal_target(5));
    }

    #[test]
    fn lost_target_rests_eyes() {
        let mut eyes = EyeDriver::new(8, 60);
        let mut anim = SimAnimator::new();
        eyes.drive(&mut anim, &seen(0, 0)).unwrap();
        assert!(eyes.drive(&mut anim, &PointOfInterest::fresh(None)).unwrap());
        play_all(&mut anim);
        assert_eq!(anim.position(EyeChannel::Horizontal), CENTRE);
        assert_eq!(anim.position(EyeChannel::Eyelid), LID_RESTING);
        assert!(!eyes.drive(&mut anim, &PointOfInterest::fresh(None)).unwrap());
    }

    #[test]
    fn stale_poll_is_ignored() {
        let mut eyes = EyeDriver::new(8, 60);
        let mut anim = SimAnimator::new();
        eyes.drive(&mut anim, &seen(0, 0)).unwrap();
        assert!(!eyes.drive(&mut anim, &PointOfInterest::stale()).unwrap());
        assert_eq!(eyes.target(), Some((0, 0)));
    }
}

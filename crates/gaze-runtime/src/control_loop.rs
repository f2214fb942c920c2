//! [`EyeLoop`] – the single cooperative control loop.
//!
//! Owns every collaborator and every piece of persistent state (calibration,
//! temporal filter, presence machine) so nothing lives in globals.  Each
//! [`tick`][EyeLoop::tick]:
//!
//! 1. **Animate** – the animator is updated unconditionally, so servo timing
//!    never depends on sensor timing.
//! 2. **Sample** – once `sample_interval_ms` has passed since the last fresh
//!    frame, the sensor is polled (non-blocking) for a raw point of interest.
//! 3. **Look** – the raw POI drives the eyes directly.
//! 4. **Debounce** – the raw POI goes through the [`TemporalFilter`].
//! 5. **Classify** – fresh filtered POIs advance the [`PresenceMachine`].
//! 6. **Publish** – any presence event goes to the rate-limited publisher.
//!
//! # Example
//!
//! ```rust
//! use gaze_hal::sim::{SimAnimator, SimTofSensor};
//! use gaze_middleware::MemorySink;
//! use gaze_runtime::control_loop::{EyeLoop, EyeLoopConfig};
//!
//! let mut config = EyeLoopConfig::default();
//! config.calibration.poll_interval_ms = 0;
//!
//! let sensor = SimTofSensor::new(64).with_background(2000);
//! let mut eyes = EyeLoop::start(sensor, SimAnimator::new(), MemorySink::new(), config, 0)
//!     .expect("sim bring-up must succeed");
//! assert_eq!(eyes.publisher().sink().payloads(), vec!["5"]);
//!
//! let report = eyes.tick(100).unwrap();
//! assert!(report.sampled);
//! assert!(!report.filtered.has_detection());
//! ```

use gaze_hal::animator::Animator;
use gaze_hal::sensor::TofSensor;
use gaze_middleware::{EventSink, PublishOutcome, RateLimitedPublisher};
use gaze_perception::calibration::CalibrationGrid;
use gaze_perception::poi::{PoiSelector, PointOfInterest};
use gaze_perception::temporal::TemporalFilter;
use gaze_types::{
    CalibrationTuning, GazeError, LoopTuning, PerceptionTuning, PresenceTuning, PublisherTuning,
    SensorTuning, TofEvent,
};
use tracing::{error, info, warn};

use crate::eyes::EyeDriver;
use crate::presence::{PresenceMachine, PresenceState};

/// Servo speed used for gaze moves.
const EYE_SPEED: u8 = 80;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Everything [`EyeLoop::start`] needs besides the collaborators.
#[derive(Debug, Clone, Default)]
pub struct EyeLoopConfig {
    pub sensor: SensorTuning,
    pub calibration: CalibrationTuning,
    pub perception: PerceptionTuning,
    pub presence: PresenceTuning,
    pub publisher: PublisherTuning,
    pub cadence: LoopTuning,
}

/// What one [`EyeLoop::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// `false` when the sample interval had not elapsed; the POIs are stale.
    pub sampled: bool,
    pub raw: PointOfInterest,
    pub filtered: PointOfInterest,
    pub state: PresenceState,
    pub event: Option<TofEvent>,
    /// `None` when there was no event or the transport failed.
    pub published: Option<PublishOutcome>,
}

// ─────────────────────────────────────────────────────────────────────────────
// EyeLoop
// ─────────────────────────────────────────────────────────────────────────────

/// The eye mechanism's control loop.
pub struct EyeLoop<S: TofSensor, A: Animator, K: EventSink> {
    sensor: S,
    animator: A,
    selector: PoiSelector,
    filter: TemporalFilter,
    presence: PresenceMachine,
    eyes: EyeDriver,
    publisher: RateLimitedPublisher<K>,
    cadence: LoopTuning,
    calibration_converged: bool,
    last_sample_ms: Option<u64>,
    restart_requested: bool,
}

impl<S: TofSensor, A: Animator, K: EventSink> EyeLoop<S, A, K> {
    /// Bring the sensor up, capture the background, and announce readiness.
    ///
    /// Blocks for the duration of calibration.
    ///
    /// # Errors
    ///
    /// - [`GazeError::SensorNotFound`] when the sensor does not answer; the
    ///   caller must not continue without calibration.
    /// - [`GazeError::CalibrationFailed`] when no frame could be read at all.
    /// - [`GazeError::Config`] for an invalid publisher interval.
    pub fn start(
        mut sensor: S,
        animator: A,
        sink: K,
        config: EyeLoopConfig,
        now_ms: u64,
    ) -> Result<Self, GazeError> {
        sensor.begin()?;
        sensor.set_resolution(config.sensor.resolution)?;
        let width = sensor.grid_width();
        info!(
            sensor = %sensor.id(),
            resolution = sensor.resolution(),
            width,
            "sensor initialised"
        );
        sensor.start_ranging(config.sensor.ranging_frequency_hz)?;

        let outcome = CalibrationGrid::capture(
            &mut sensor,
            &config.calibration,
            config.perception.max_calibration_mm,
        )?;
        if !outcome.converged {
            warn!(frames = outcome.frames_used, "running with unconverged calibration");
        }

        let mut publisher = RateLimitedPublisher::new(sink, &config.publisher)?;
        if let Err(e) = publisher.publish(TofEvent::PuppetIsReady, now_ms) {
            error!(error = %e, "could not announce readiness");
        }

        let filter = TemporalFilter::new(
            config.perception.frames_for_good_hit,
            config.perception.jitter_tolerance,
        );
        Ok(Self {
            sensor,
            animator,
            selector: PoiSelector::new(outcome.grid, config.perception),
            filter,
            presence: PresenceMachine::new(config.presence, now_ms),
            eyes: EyeDriver::new(width, EYE_SPEED),
            publisher,
            cadence: config.cadence,
            calibration_converged: outcome.converged,
            last_sample_ms: None,
            restart_requested: false,
        })
    }

    /// Run one loop iteration at `now_ms`.
    ///
    /// # Errors
    ///
    /// Propagates [`GazeError::Animation`] from the animator.  Publish
    /// failures are logged, not returned.
    pub fn tick(&mut self, now_ms: u64) -> Result<TickReport, GazeError> {
        self.animator.update(now_ms);

        let due = self
            .last_sample_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.cadence.sample_interval_ms);
        if !due {
            return Ok(TickReport {
                sampled: false,
                raw: PointOfInterest::stale(),
                filtered: PointOfInterest::stale(),
                state: self.presence.state(),
                event: None,
                published: None,
            });
        }

        let raw = self.selector.poll(&mut self.sensor, now_ms);
        if raw.got_new_sensor_data {
            self.last_sample_ms = Some(now_ms);
        }
        self.eyes.drive(&mut self.animator, &raw)?;

        let filtered = self.filter.apply(raw);
        let event = self.presence.observe(&filtered, now_ms);
        let published = match event {
            Some(ev) => match self.publisher.publish(ev, now_ms) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    error!(event = %ev, error = %e, "event publish failed");
                    None
                }
            },
            None => None,
        };

        Ok(TickReport {
            sampled: true,
            raw,
            filtered,
            state: self.presence.state(),
            event,
            published,
        })
    }

    // -------------------------------------------------------------------------
    // Remote functions
    // -------------------------------------------------------------------------

    /// Remote "reset" request: the owner should leave its loop so that the
    /// supervisor restarts the process.
    pub fn request_restart(&mut self) {
        info!("restart requested");
        self.restart_requested = true;
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> PresenceState {
        self.presence.state()
    }

    pub fn calibration(&self) -> &CalibrationGrid {
        self.selector.calibration()
    }

    /// `false` when calibration hit its frame ceiling.
    pub fn calibration_converged(&self) -> bool {
        self.calibration_converged
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    pub fn publisher(&self) -> &RateLimitedPublisher<K> {
        &self.publisher
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use gaze_hal::sensor::SensorFrame;
    use gaze_hal::sim::{SimAnimator, SimTofSensor};
    use gaze_middleware::MemorySink;

    type SimLoop = EyeLoop<SimTofSensor, SimAnimator, MemorySink>;

    fn config() -> EyeLoopConfig {
        let mut config = EyeLoopConfig::default();
        config.calibration.poll_interval_ms = 0;
        config.publisher.min_interval_ms = 1;
        config.cadence.sample_interval_ms = 100;
        config
    }

    fn person(cx: usize, cy: usize, mm: i32) -> SensorFrame {
        let mut frame = SensorFrame::uniform(8, 2000, 5);
        for y in cy - 1..=cy + 1 {
            for x in cx - 1..=cx + 1 {
                frame = frame.with_zone(x, y, mm, 5);
            }
        }
        frame
    }

    fn started(config: EyeLoopConfig) -> SimLoop {
        let sensor = SimTofSensor::new(64).with_background(2000);
        EyeLoop::start(sensor, SimAnimator::new(), MemorySink::new(), config, 0).unwrap()
    }

    #[test]
    fn missing_sensor_is_fatal() {
        let sensor = SimTofSensor::new(64).absent();
        let result = EyeLoop::start(sensor, SimAnimator::new(), MemorySink::new(), config(), 0);
        assert!(matches!(result, Err(GazeError::SensorNotFound)));
    }

    #[test]
    fn start_calibrates_and_announces_ready() {
        let eyes = started(config());
        assert!(eyes.calibration_converged());
        assert!(eyes.calibration().baselines().iter().all(|&b| b == 2000));
        assert_eq!(eyes.publisher().sink().payloads(), vec!["5"]);
        assert_eq!(eyes.state(), PresenceState::Idle);
    }

    #[test]
    fn sampling_is_gated_by_interval() {
        let mut eyes = started(config());
        assert!(eyes.tick(1000).unwrap().sampled);
        assert!(!eyes.tick(1050).unwrap().sampled);
        assert!(eyes.tick(1100).unwrap().sampled);
    }

    #[test]
    fn visitor_enters_and_leaves_quickly() {
        let mut eyes = started(config());
        eyes.sensor_mut().push_frame(person(3, 3, 800));
        eyes.sensor_mut().push_frame(person(3, 3, 790));

        let first = eyes.tick(1000).unwrap();
        assert!(first.raw.has_detection());
        assert!(!first.filtered.has_detection());
        assert_eq!(first.event, None);
        assert!(eyes.animator().pending() > 0);

        let second = eyes.tick(1100).unwrap();
        assert_eq!(second.event, Some(TofEvent::PersonEnteredFov));
        assert_eq!(second.published, Some(PublishOutcome::Published));
        assert_eq!(second.state, PresenceState::Normal);

        let gone = eyes.tick(1200).unwrap();
        assert_eq!(gone.event, Some(TofEvent::PersonLeftQuickly));
        assert_eq!(gone.state, PresenceState::PersonLeft);
        assert_eq!(eyes.publisher().sink().payloads(), vec!["5", "1", "4"]);
    }

    #[test]
    fn close_visitor_is_too_close() {
        let mut eyes = started(config());
        eyes.sensor_mut().push_frame(person(4, 4, 200));
        eyes.sensor_mut().push_frame(person(4, 4, 180));
        eyes.tick(1000).unwrap();
        let report = eyes.tick(1100).unwrap();
        assert_eq!(report.event, Some(TofEvent::PersonTooClose));
        assert_eq!(report.state, PresenceState::TooClose);
    }

    #[test]
    fn throttled_event_is_dropped() {
        let mut cfg = config();
        cfg.publisher.min_interval_ms = 60_000;
        let sensor = SimTofSensor::new(64).with_background(2000);
        let mut eyes = EyeLoop::start(sensor, SimAnimator::new(), MemorySink::new(), cfg, 0).unwrap();
        eyes.sensor_mut().push_frame(person(3, 3, 800));
        eyes.sensor_mut().push_frame(person(3, 3, 800));
        eyes.tick(1000).unwrap();
        let report = eyes.tick(1100).unwrap();
        assert_eq!(report.event, Some(TofEvent::PersonEnteredFov));
        assert_eq!(report.published, Some(PublishOutcome::Throttled));
        assert_eq!(eyes.publisher().sink().payloads(), vec!["5"]);
        assert_eq!(eyes.publisher().dropped(), 1);
    }

    #[test]
    fn publish_throttle_runs_on_loop_time() {
        let mut cfg = config();
        cfg.publisher.min_interval_ms = 1000;
        let mut eyes = started(cfg);
        eyes.sensor_mut().push_frame(person(3, 3, 800));
        eyes.sensor_mut().push_frame(person(3, 3, 800));
        eyes.tick(900).unwrap();
        let entered = eyes.tick(1000).unwrap();
        assert_eq!(entered.published, Some(PublishOutcome::Published));

        let gone = eyes.tick(1500).unwrap();
        assert_eq!(gone.event, Some(TofEvent::PersonLeftQuickly));
        assert_eq!(gone.published, Some(PublishOutcome::Throttled));
        assert_eq!(eyes.publisher().sink().payloads(), vec!["5", "1"]);
    }

    #[test]
    fn unconverged_calibration_still_starts() {
        let mut cfg = config();
        cfg.calibration.max_frames = 3;
        let frames = (0..10).map(|i| SensorFrame::uniform(8, 500 + (i % 2) * 1000, 5));
        let sensor = SimTofSensor::new(64).with_frames(frames);
        let eyes = EyeLoop::start(sensor, SimAnimator::new(), MemorySink::new(), cfg, 0).unwrap();
        assert!(!eyes.calibration_converged());
    }

    #[test]
    fn restart_flag() {
        let mut eyes = started(config());
        assert!(!eyes.restart_requested());
        eyes.request_restart();
        assert!(eyes.restart_requested());
    }
}

//! In-process simulated collaborators for tests and headless runs.
//!
//! [`SimTofSensor`] replays scripted [`SensorFrame`]s and falls back to a
//! flat background once the script is exhausted.  [`SimAnimator`] records
//! every command it plays so tests can assert on where the eyes were sent.
//!
//! # Example
//!
//! ```rust
//! use gaze_hal::sim::SimTofSensor;
//! use gaze_hal::sensor::{SensorFrame, TofSensor};
//!
//! let mut sensor = SimTofSensor::new(64)
//!     .with_background(2000)
//!     .with_frame(SensorFrame::uniform(8, 2000, 5).with_zone(3, 3, 300, 5));
//!
//! sensor.begin().expect("sim sensor is always present");
//! sensor.start_ranging(14).unwrap();
//! assert!(sensor.is_data_ready());
//! let frame = sensor.read_frame().unwrap();
//! assert_eq!(frame.zone(3, 3).unwrap().distance_mm, 300);
//! ```

use std::collections::{HashMap, VecDeque};

use gaze_types::GazeError;
use tracing::trace;

use crate::animator::{AnimationCommand, Animator, EyeChannel};
use crate::sensor::{SensorFrame, TofSensor};

/// Status code the simulator reports for every zone of a background frame.
const SIM_GOOD_STATUS: u8 = 5;

// ────────────────────────────────────────────────────────────────────────────
// Simulated sensor
// ────────────────────────────────────────────────────────────────────────────

/// A scripted ranging sensor.
pub struct SimTofSensor {
    id: String,
    present: bool,
    resolution: usize,
    ranging: bool,
    warmup_polls: u32,
    frames: VecDeque<SensorFrame>,
    background_mm: Option<i32>,
    failing_reads: u32,
}

impl SimTofSensor {
    /// Create a present sensor with `resolution` zones and an empty script.
    pub fn new(resolution: usize) -> Self {
        Self {
            id: "sim_tof".to_string(),
            present: true,
            resolution,
            ranging: false,
            warmup_polls: 0,
            frames: VecDeque::new(),
            background_mm: None,
            failing_reads: 0,
        }
    }

    /// Once the script runs out, keep producing uniform frames at `distance_mm`.
    pub fn with_background(mut self, distance_mm: i32) -> Self {
        self.background_mm = Some(distance_mm);
        self
    }

    /// Simulate an unplugged sensor: [`TofSensor::begin`] fails.
    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    /// The first `polls` readiness checks after ranging starts report "not ready".
    pub fn with_warmup(mut self, polls: u32) -> Self {
        self.warmup_polls = polls;
        self
    }

    /// The next `reads` frame reads fail with a sensor fault.
    pub fn with_failing_reads(mut self, reads: u32) -> Self {
        self.failing_reads = reads;
        self
    }

    /// Append one frame to the script.
    pub fn with_frame(mut self, frame: SensorFrame) -> Self {
        self.frames.push_back(frame);
        self
    }

    /// Append frames to the script.
    pub fn with_frames(mut self, frames: impl IntoIterator<Item = SensorFrame>) -> Self {
        self.frames.extend(frames);
        self
    }

    /// Append a frame to a sensor that is already running.
    pub fn push_frame(&mut self, frame: SensorFrame) {
        self.frames.push_back(frame);
    }

    /// Frames still waiting in the script.
    pub fn frames_remaining(&self) -> usize {
        self.frames.len()
    }

    fn background_frame(&self) -> Option<SensorFrame> {
        self.background_mm
            .map(|d| SensorFrame::uniform(self.grid_width(), d, SIM_GOOD_STATUS))
    }
}

impl TofSensor for SimTofSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn begin(&mut self) -> Result<(), GazeError> {
        if self.present {
            Ok(())
        } else {
            Err(GazeError::SensorNotFound)
        }
    }

    fn set_resolution(&mut self, zones: usize) -> Result<(), GazeError> {
        match zones {
            16 | 64 => {
                self.resolution = zones;
                Ok(())
            }
            other => Err(GazeError::InvalidGeometry { resolution: other }),
        }
    }

    fn resolution(&self) -> usize {
        self.resolution
    }

    fn start_ranging(&mut self, frequency_hz: u8) -> Result<(), GazeError> {
        trace!(sensor = %self.id, frequency_hz, "sim ranging started");
        self.ranging = true;
        Ok(())
    }

    fn is_data_ready(&mut self) -> bool {
        if !self.ranging {
            return false;
        }
        if self.warmup_polls > 0 {
            self.warmup_polls -= 1;
            return false;
        }
        !self.frames.is_empty() || self.background_mm.is_some()
    }

    fn read_frame(&mut self) -> Result<SensorFrame, GazeError> {
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(GazeError::SensorFault {
                sensor: self.id.clone(),
                details: "simulated transfer failure".to_string(),
            });
        }
        self.frames
            .pop_front()
            .or_else(|| self.background_frame())
            .ok_or_else(|| GazeError::SensorFault {
                sensor: self.id.clone(),
                details: "no frame available".to_string(),
            })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated animator
// ────────────────────────────────────────────────────────────────────────────

/// A servo engine that plays one queued command per update and records it.
///
/// A command is considered finished once its post-delay has elapsed.
pub struct SimAnimator {
    id: String,
    running: bool,
    queue: VecDeque<AnimationCommand>,
    played: Vec<AnimationCommand>,
    positions: HashMap<EyeChannel, u8>,
    busy_until_ms: u64,
}

impl SimAnimator {
    /// A started animator with every channel centred at 50.
    pub fn new() -> Self {
        let positions = [EyeChannel::Horizontal, EyeChannel::Vertical, EyeChannel::Eyelid]
            .into_iter()
            .map(|c| (c, 50))
            .collect();
        Self {
            id: "sim_eyes".to_string(),
            running: true,
            queue: VecDeque::new(),
            played: Vec::new(),
            positions,
            busy_until_ms: 0,
        }
    }

    /// Every command played so far, in order.
    pub fn played(&self) -> &[AnimationCommand] {
        &self.played
    }

    /// Commands queued but not yet played.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Current position of `channel`.
    pub fn position(&self, channel: EyeChannel) -> u8 {
        self.positions.get(&channel).copied().unwrap_or(50)
    }
}

impl Default for SimAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl Animator for SimAnimator {
    fn id(&self) -> &str {
        &self.id
    }

    fn enqueue(&mut self, command: AnimationCommand) -> Result<(), GazeError> {
        self.queue.push_back(command);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running && !self.queue.is_empty()
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn clear(&mut self) {
        self.queue.clear();
    }

    fn update(&mut self, now_ms: u64) {
        if !self.running || now_ms < self.busy_until_ms {
            return;
        }
        if let Some(cmd) = self.queue.pop_front() {
            self.positions.insert(cmd.channel, cmd.target);
            self.busy_until_ms = now_ms + u64::from(cmd.post_delay_ms);
            self.played.push(cmd);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_sensor_fails_begin() {
        let mut sensor = SimTofSensor::new(64).absent();
        assert_eq!(sensor.begin(), Err(GazeError::SensorNotFound));
    }

    #[test]
    fn not_ready_before_ranging() {
        let mut sensor = SimTofSensor::new(64).with_background(2000);
        assert!(!sensor.is_data_ready());
        sensor.start_ranging(14).unwrap();
        assert!(sensor.is_data_ready());
    }

    #[test]
    fn warmup_delays_readiness() {
        let mut sensor = SimTofSensor::new(64).with_background(2000).with_warmup(2);
        sensor.start_ranging(14).unwrap();
        assert!(!sensor.is_data_ready());
        assert!(!sensor.is_data_ready());
        assert!(sensor.is_data_ready());
    }

    #[test]
    fn script_then_background() {
        let mut sensor = SimTofSensor::new(16)
            .with_background(1500)
            .with_frame(SensorFrame::uniform(4, 700, 5));
        sensor.start_ranging(14).unwrap();
        assert_eq!(sensor.read_frame().unwrap().zones()[0].distance_mm, 700);
        assert_eq!(sensor.read_frame().unwrap().zones()[0].distance_mm, 1500);
        assert_eq!(sensor.frames_remaining(), 0);
    }

    #[test]
    fn empty_script_without_background_is_never_ready() {
        let mut sensor = SimTofSensor::new(64);
        sensor.start_ranging(14).unwrap();
        assert!(!sensor.is_data_ready());
        assert!(sensor.read_frame().is_err());
    }

    #[test]
    fn failing_reads_then_recovers() {
        let mut sensor = SimTofSensor::new(64).with_background(2000).with_failing_reads(1);
        sensor.start_ranging(14).unwrap();
        assert!(matches!(sensor.read_frame(), Err(GazeError::SensorFault { .. })));
        assert!(sensor.read_frame().is_ok());
    }

    #[test]
    fn resolution_and_width() {
        let mut sensor = SimTofSensor::new(64);
        assert_eq!(sensor.grid_width(), 8);
        sensor.set_resolution(16).unwrap();
        assert_eq!(sensor.grid_width(), 4);
        assert!(sensor.set_resolution(20).is_err());
    }

    #[test]
    fn animator_plays_in_order_respecting_post_delay() {
        let mut anim = SimAnimator::new();
        anim.enqueue(AnimationCommand::new(EyeChannel::Horizontal, 10, 50).with_post_delay(100))
            .unwrap();
        anim.enqueue(AnimationCommand::new(EyeChannel::Vertical, 90, 50)).unwrap();
        assert!(anim.is_running());

        anim.update(0);
        assert_eq!(anim.position(EyeChannel::Horizontal), 10);
        anim.update(50);
        assert_eq!(anim.position(EyeChannel::Vertical), 50);
        anim.update(100);
        assert_eq!(anim.position(EyeChannel::Vertical), 90);
        assert_eq!(anim.played().len(), 2);
        assert!(!anim.is_running());
    }

    #[test]
    fn stopped_animator_does_not_play() {
        let mut anim = SimAnimator::new();
        anim.stop();
        anim.enqueue(AnimationCommand::new(EyeChannel::Eyelid, 0, 100)).unwrap();
        anim.update(10);
        assert!(anim.played().is_empty());
        anim.clear();
        assert_eq!(anim.pending(), 0);
    }
}

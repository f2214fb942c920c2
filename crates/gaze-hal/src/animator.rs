//! Generic `Animator` trait for the servo animation engine.

use gaze_types::GazeError;

/// The servo channels the eye mechanism exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EyeChannel {
    /// Left/right gaze.
    Horizontal,
    /// Up/down gaze.
    Vertical,
    /// Eyelid openness.
    Eyelid,
}

/// A single "move channel to target" command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationCommand {
    pub channel: EyeChannel,
    /// Target position as a percentage of the channel's travel (0–100).
    pub target: u8,
    /// Relative speed (0–100).
    pub speed: u8,
    /// Time to hold after reaching the target before the next command.
    pub post_delay_ms: u32,
}

impl AnimationCommand {
    /// Command with no post-delay.  `target` and `speed` are clamped to 100.
    pub fn new(channel: EyeChannel, target: u8, speed: u8) -> Self {
        Self {
            channel,
            target: target.min(100),
            speed: speed.min(100),
            post_delay_ms: 0,
        }
    }

    pub fn with_post_delay(mut self, post_delay_ms: u32) -> Self {
        self.post_delay_ms = post_delay_ms;
        self
    }
}

/// The scene-sequencing servo engine.
///
/// Commands are queued and played in order.  [`update`][Animator::update]
/// must be called on every control-loop iteration; the engine keeps its own
/// timing.
pub trait Animator: Send {
    /// Stable identifier, e.g. `"eye_servos"`.
    fn id(&self) -> &str;

    /// Append a command to the queue.
    ///
    /// # Errors
    ///
    /// Returns [`GazeError::Animation`] if the engine cannot accept it.
    fn enqueue(&mut self, command: AnimationCommand) -> Result<(), GazeError>;

    /// `true` while queued commands are still playing.
    fn is_running(&self) -> bool;

    fn start(&mut self);

    fn stop(&mut self);

    /// Drop every queued command.
    fn clear(&mut self);

    /// Advance the engine to `now_ms`.
    fn update(&mut self, now_ms: u64);
}

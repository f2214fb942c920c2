//! `gaze-hal` – Hardware Abstraction Layer for the eye mechanism.
//!
//! The core never talks to an I²C driver or a servo board directly.  It goes
//! through the two collaborator traits defined here.
//!
//! # Modules
//!
//! - [`sensor`] – [`TofSensor`][sensor::TofSensor]: a multi-zone
//!   time-of-flight ranging sensor, plus the [`SensorFrame`][sensor::SensorFrame]
//!   it produces.
//! - [`animator`] – [`Animator`][animator::Animator]: the servo animation
//!   engine that moves the eyes and eyelids toward target positions.
//! - [`sim`] – in-process [`SimTofSensor`][sim::SimTofSensor] and
//!   [`SimAnimator`][sim::SimAnimator] for tests and headless runs.

pub mod animator;
pub mod sensor;
pub mod sim;

pub use animator::{AnimationCommand, Animator, EyeChannel};
pub use sensor::{SensorFrame, TofSensor, ZoneReading};
pub use sim::{SimAnimator, SimTofSensor};

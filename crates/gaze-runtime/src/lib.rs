//! `gaze-runtime` – the eye mechanism's control loop.
//!
//! Ties perception, presence classification, eye animation and event
//! publishing into one cooperative loop that the binary drives at a fixed
//! tick.
//!
//! # Modules
//!
//! - [`control_loop`] – [`EyeLoop`][control_loop::EyeLoop]: sensor bring-up,
//!   calibration, and the per-tick sample → look → debounce → classify →
//!   publish pipeline.
//! - [`presence`] – [`PresenceMachine`][presence::PresenceMachine]: the
//!   four-state head state machine that turns detections into
//!   [`TofEvent`][gaze_types::TofEvent]s.
//! - [`eyes`] – [`EyeDriver`][eyes::EyeDriver]: zone → servo target mapping.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: global
//!   `tracing` subscriber setup.

pub mod control_loop;
pub mod eyes;
pub mod presence;
pub mod telemetry;

pub use control_loop::{EyeLoop, EyeLoopConfig, TickReport};
pub use eyes::EyeDriver;
pub use presence::{PresenceMachine, PresenceState};
pub use telemetry::{LogFormat, init_tracing};

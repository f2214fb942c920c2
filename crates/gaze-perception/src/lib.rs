//! `gaze-perception` – from raw ranging frames to a single point of interest.
//!
//! Turns a noisy multi-zone depth frame into the one place the eyes should
//! look at, and decides whether that place has been seen long enough to be
//! trusted.
//!
//! # Pipeline
//!
//! ```text
//! SensorFrame ─► process_frame ─► AdjustedFrame ─► PoiSelector ─► TemporalFilter
//!                    ▲                 │ score / neighborhood_average
//!             CalibrationGrid ◄────────┘
//! ```
//!
//! # Modules
//!
//! - [`calibration`] – [`CalibrationGrid`][calibration::CalibrationGrid]:
//!   per-zone background captured once at startup.
//! - [`frame`] – [`process_frame`][frame::process_frame]: background
//!   subtraction and status/range screening into an
//!   [`AdjustedFrame`][frame::AdjustedFrame].
//! - [`zone`] – 3×3 neighborhood [`score`][zone::score] and
//!   [`neighborhood_average`][zone::neighborhood_average].
//! - [`poi`] – [`PoiSelector`][poi::PoiSelector]: nearest validated zone.
//! - [`temporal`] – [`TemporalFilter`][temporal::TemporalFilter]: streak
//!   debouncing of detections.
//! - [`table`] – [`GridTable`][table::GridTable]: debug rendering of zone grids.

pub mod calibration;
pub mod frame;
pub mod poi;
pub mod table;
pub mod temporal;
pub mod zone;

pub use calibration::{CalibrationGrid, CalibrationOutcome};
pub use frame::{AdjustedFrame, AdjustedZone, process_frame};
pub use poi::{Detection, PoiSelector, PointOfInterest};
pub use table::GridTable;
pub use temporal::TemporalFilter;

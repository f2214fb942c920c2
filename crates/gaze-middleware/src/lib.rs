//! `gaze-middleware` – outbound presence events.
//!
//! Routes [`TofEvent`][gaze_types::TofEvent]s to the outside world without
//! caring what the outside world is (a cloud event stream, a serial link to
//! the mouth-control board, a log line).
//!
//! # Modules
//!
//! - [`sink`] – [`EventSink`][sink::EventSink]: the named-event transport
//!   trait, with [`LogSink`][sink::LogSink] and [`MemorySink`][sink::MemorySink].
//! - [`publisher`] – [`RateLimitedPublisher`][publisher::RateLimitedPublisher]:
//!   drops (never queues) events that arrive faster than the transport allows.

pub mod publisher;
pub mod sink;

pub use publisher::{PublishOutcome, RateLimitedPublisher};
pub use sink::{EventSink, LogSink, MemorySink};

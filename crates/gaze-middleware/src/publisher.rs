//! [`RateLimitedPublisher`] – best-effort, throttled event emission.
//!
//! The upstream transport accepts at most one event per
//! [`PublisherTuning::min_interval_ms`].  An event that arrives while the
//! publisher is throttled is logged as an error and dropped.  It is never
//! queued or retried: presence events are UX signals, not guaranteed
//! delivery.
//!
//! Throttling uses a [`governor`] GCRA limiter with a burst of one, driven by
//! a [`FakeRelativeClock`] that follows the caller's millisecond timestamps
//! instead of the wall clock.

use std::time::Duration;

use gaze_types::{GazeError, PublisherTuning, TofEvent};
use governor::clock::{Clock, FakeRelativeClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tracing::{debug, error};

use crate::sink::EventSink;

type LoopTimeLimiter = RateLimiter<
    NotKeyed,
    InMemoryState,
    FakeRelativeClock,
    NoOpMiddleware<<FakeRelativeClock as Clock>::Instant>,
>;

/// What happened to an event handed to [`RateLimitedPublisher::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Dropped because the previous publish was too recent.
    Throttled,
}

/// Publishes [`TofEvent`]s through an [`EventSink`], at most one per interval.
pub struct RateLimitedPublisher<K: EventSink> {
    sink: K,
    event_name: String,
    clock: FakeRelativeClock,
    clock_ms: u64,
    limiter: LoopTimeLimiter,
    published: u64,
    dropped: u64,
}

impl<K: EventSink> RateLimitedPublisher<K> {
    /// Wrap `sink` with the interval and event name from `tuning`.
    ///
    /// # Errors
    ///
    /// Returns [`GazeError::Config`] when `min_interval_ms` is zero.
    pub fn new(sink: K, tuning: &PublisherTuning) -> Result<Self, GazeError> {
        let quota = Quota::with_period(Duration::from_millis(tuning.min_interval_ms))
            .ok_or_else(|| GazeError::Config("publish interval must be non-zero".to_string()))?;
        let clock = FakeRelativeClock::default();
        Ok(Self {
            sink,
            event_name: tuning.event_name.clone(),
            limiter: RateLimiter::direct_with_clock(quota, clock.clone()),
            clock,
            clock_ms: 0,
            published: 0,
            dropped: 0,
        })
    }

    /// Publish `event` at loop time `now_ms` unless throttled.  Time never
    /// runs backwards: an older `now_ms` is treated as the latest one seen.
    ///
    /// # Errors
    ///
    /// Propagates the sink's error when the transport itself fails.
    pub fn publish(&mut self, event: TofEvent, now_ms: u64) -> Result<PublishOutcome, GazeError> {
        if now_ms > self.clock_ms {
            self.clock.advance(Duration::from_millis(now_ms - self.clock_ms));
            self.clock_ms = now_ms;
        }
        if self.limiter.check().is_err() {
            self.dropped += 1;
            error!(
                %event,
                now_ms,
                sink = %self.sink.id(),
                "publish throttled; event dropped"
            );
            return Ok(PublishOutcome::Throttled);
        }
        self.sink.publish(&self.event_name, &event.payload())?;
        self.published += 1;
        debug!(%event, code = event.code(), sink = %self.sink.id(), "event published");
        Ok(PublishOutcome::Published)
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Events delivered so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Events dropped by throttling so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn publisher(interval_ms: u64) -> RateLimitedPublisher<MemorySink> {
        let tuning = PublisherTuning {
            min_interval_ms: interval_ms,
            ..PublisherTuning::default()
        };
        RateLimitedPublisher::new(MemorySink::new(), &tuning).unwrap()
    }

    #[test]
    fn second_publish_within_interval_is_dropped() {
        let mut p = publisher(1000);
        assert_eq!(p.publish(TofEvent::PersonEnteredFov, 0).unwrap(), PublishOutcome::Published);
        assert_eq!(p.publish(TofEvent::PersonTooClose, 999).unwrap(), PublishOutcome::Throttled);
        assert_eq!(p.sink().payloads(), vec!["1"]);
        assert_eq!((p.published(), p.dropped()), (1, 1));
    }

    #[test]
    fn publish_allowed_again_after_interval() {
        let mut p = publisher(1000);
        p.publish(TofEvent::PersonEnteredFov, 5_000).unwrap();
        assert_eq!(p.publish(TofEvent::PersonLeftFov, 6_000).unwrap(), PublishOutcome::Published);
        assert_eq!(p.sink().payloads(), vec!["1", "2"]);
    }

    #[test]
    fn throttle_follows_loop_time_not_wall_clock() {
        let mut p = publisher(1000);
        for (i, now_ms) in [0, 1_000, 2_000, 3_000].into_iter().enumerate() {
            let event = if i % 2 == 0 { TofEvent::PersonEnteredFov } else { TofEvent::PersonLeftFov };
            assert_eq!(p.publish(event, now_ms).unwrap(), PublishOutcome::Published);
        }
        assert_eq!(p.dropped(), 0);
    }

    #[test]
    fn dropped_events_are_not_replayed() {
        let mut p = publisher(1000);
        p.publish(TofEvent::PersonEnteredFov, 0).unwrap();
        p.publish(TofEvent::PersonTooClose, 500).unwrap();
        p.publish(TofEvent::PersonLeftQuickly, 1_200).unwrap();
        assert_eq!(p.sink().payloads(), vec!["1", "4"]);
    }

    #[test]
    fn earlier_timestamp_does_not_rewind() {
        let mut p = publisher(1000);
        p.publish(TofEvent::PersonEnteredFov, 2_000).unwrap();
        assert_eq!(p.publish(TofEvent::PersonLeftFov, 1_000).unwrap(), PublishOutcome::Throttled);
    }

    #[test]
    fn uses_configured_event_name() {
        let tuning = PublisherTuning {
            event_name: "eyes".to_string(),
            min_interval_ms: 1000,
        };
        let mut p = RateLimitedPublisher::new(MemorySink::new(), &tuning).unwrap();
        p.publish(TofEvent::PuppetIsReady, 0).unwrap();
        assert_eq!(p.sink().events()[0], ("eyes".to_string(), "5".to_string()));
    }

    #[test]
    fn zero_interval_is_a_config_error() {
        let tuning = PublisherTuning {
            min_interval_ms: 0,
            ..PublisherTuning::default()
        };
        let result = RateLimitedPublisher::new(MemorySink::new(), &tuning);
        assert!(matches!(result, Err(GazeError::Config(_))));
    }

    #[test]
    fn sink_failure_is_propagated() {
        let mut p = RateLimitedPublisher::new(MemorySink::offline(), &PublisherTuning::default())
            .unwrap();
        assert!(matches!(
            p.publish(TofEvent::PersonEnteredFov, 0),
            Err(GazeError::Publish { .. })
        ));
        assert_eq!(p.published(), 0);
    }
}

//! The event transport seam.
//!
//! The eye firmware publishes presence events as a named event with a string
//! payload.  Transports implement [`EventSink`]; the publisher in front of
//! them owns throttling.

use gaze_types::GazeError;
use tracing::info;

/// A named-event transport.
pub trait EventSink: Send {
    /// Stable identifier for the transport, e.g. `"cloud"`.
    fn id(&self) -> &str;

    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Returns [`GazeError::Publish`] when the transport rejects the event.
    fn publish(&mut self, event_name: &str, payload: &str) -> Result<(), GazeError>;
}

/// Writes every event to the `tracing` log.  Used when no transport is wired.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn id(&self) -> &str {
        "log"
    }

    fn publish(&mut self, event_name: &str, payload: &str) -> Result<(), GazeError> {
        info!(event_name, payload, "event published");
        Ok(())
    }
}

/// Records every event in memory; optionally refuses them.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<(String, String)>,
    offline: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every publish fails, as if the link were down.
    pub fn offline() -> Self {
        Self {
            events: Vec::new(),
            offline: true,
        }
    }

    /// `(event_name, payload)` pairs in delivery order.
    pub fn events(&self) -> &[(String, String)] {
        &self.events
    }

    /// Payloads only, in delivery order.
    pub fn payloads(&self) -> Vec<&str> {
        self.events.iter().map(|(_, p)| p.as_str()).collect()
    }
}

impl EventSink for MemorySink {
    fn id(&self) -> &str {
        "memory"
    }

    fn publish(&mut self, event_name: &str, payload: &str) -> Result<(), GazeError> {
        if self.offline {
            return Err(GazeError::Publish {
                event: event_name.to_string(),
                details: "link is down".to_string(),
            });
        }
        self.events.push((event_name.to_string(), payload.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let mut sink = MemorySink::new();
        sink.publish("tofEvent", "1").unwrap();
        sink.publish("tofEvent", "3").unwrap();
        assert_eq!(sink.payloads(), vec!["1", "3"]);
        assert_eq!(sink.events()[0].0, "tofEvent");
    }

    #[test]
    fn offline_sink_rejects() {
        let mut sink = MemorySink::offline();
        let err = sink.publish("tofEvent", "2").unwrap_err();
        assert!(err.to_string().contains("link is down"));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn log_sink_accepts_everything() {
        let mut sink = LogSink;
        assert!(sink.publish("tofEvent", "5").is_ok());
        assert_eq!(sink.id(), "log");
    }
}

//! Presence State Machine.
//!
//! Classifies the filtered detection stream into presence events.  Every
//! change of state restarts the state timer; staying in a state does not.
//!
//! | State | Input | Next | Emits |
//! |---|---|---|---|
//! | `Idle` | nothing | `Idle` | – |
//! | `Idle` | too close | `TooClose` | `Person_too_close` |
//! | `Idle` | detection | `Normal` | `Person_entered_fov` |
//! | `Normal` | too close | `TooClose` | `Person_too_close` |
//! | `Normal` | detection | `Normal` | – |
//! | `Normal` / `TooClose` | nothing, visit < `left_quickly_ms` | `PersonLeft` | `Person_left_quickly` |
//! | `Normal` / `TooClose` | nothing, visit ≥ `left_quickly_ms` | `PersonLeft` | `Person_left_fov` |
//! | `TooClose` | detection, not too close | `Normal` | – |
//! | `TooClose` | too close | `TooClose` | – |
//! | `PersonLeft` | detection | `PersonLeft` | – |
//! | `PersonLeft` | nothing, < `person_left_hold_ms` | `PersonLeft` | – |
//! | `PersonLeft` | nothing, ≥ `person_left_hold_ms` | `Idle` | – |

use gaze_perception::poi::PointOfInterest;
use gaze_types::{PresenceTuning, TofEvent};
use tracing::info;

/// Who is in front of the eyes, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceState {
    Idle,
    Normal,
    TooClose,
    PersonLeft,
}

/// The head state machine.
#[derive(Debug, Clone)]
pub struct PresenceMachine {
    tuning: PresenceTuning,
    state: PresenceState,
    state_start_ms: u64,
}

impl PresenceMachine {
    /// Start in [`PresenceState::Idle`] at `now_ms`.
    pub fn new(tuning: PresenceTuning, now_ms: u64) -> Self {
        Self {
            tuning,
            state: PresenceState::Idle,
            state_start_ms: now_ms,
        }
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Timestamp at which the current state was entered.
    pub fn state_start_ms(&self) -> u64 {
        self.state_start_ms
    }

    pub fn time_in_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.state_start_ms)
    }

    /// Feed one filtered POI.  Stale polls are ignored.
    pub fn observe(&mut self, poi: &PointOfInterest, now_ms: u64) -> Option<TofEvent> {
        if !poi.got_new_sensor_data {
            return None;
        }
        let distance_mm = poi.detection.map_or(0, |d| d.distance_mm);
        self.update(poi.has_detection(), distance_mm, now_ms)
    }

    /// Advance the machine by one tick.  Returns the event to emit, if any.
    pub fn update(&mut self, has_detection: bool, distance_mm: i32, now_ms: u64) -> Option<TofEvent> {
        use PresenceState::{Idle, Normal, PersonLeft, TooClose};

        let too_close = has_detection && distance_mm < self.tuning.too_close_mm;
        let elapsed = self.time_in_state(now_ms);

        let (next, event) = match (self.state, has_detection) {
            (Idle, false) => (Idle, None),
            (Idle, true) if too_close => (TooClose, Some(TofEvent::PersonTooClose)),
            (Idle, true) => (Normal, Some(TofEvent::PersonEnteredFov)),

            (Normal, true) if too_close => (TooClose, Some(TofEvent::PersonTooClose)),
            (Normal, true) => (Normal, None),

            (TooClose, true) if too_close => (TooClose, None),
            (TooClose, true) => (Normal, None),

            (Normal | TooClose, false) if elapsed < self.tuning.left_quickly_ms => {
                (PersonLeft, Some(TofEvent::PersonLeftQuickly))
            }
            (Normal | TooClose, false) => (PersonLeft, Some(TofEvent::PersonLeftFov)),

            (PersonLeft, true) => (PersonLeft, None),
            (PersonLeft, false) if elapsed >= self.tuning.person_left_hold_ms => (Idle, None),
            (PersonLeft, false) => (PersonLeft, None),
        };

        if next != self.state {
            info!(
                from = ?self.state,
                to = ?next,
                after_ms = elapsed,
                event = event.map(TofEvent::name),
                "presence state changed"
            );
            self.state = next;
            self.state_start_ms = now_ms;
        }
        event
    }
}

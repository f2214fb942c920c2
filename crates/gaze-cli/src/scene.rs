//! Scripted visitor for headless runs.
//!
//! A person walks in from one side, approaches the sensor until they are
//! too close, backs off, and walks out.  Each frame is one sensor sample.

use gaze_hal::sensor::SensorFrame;

/// Status reported for every simulated zone.
const GOOD_STATUS: u8 = 5;

/// Frames for one visit over a `background_mm` wall on a `width`×`width` grid.
pub fn visitor_walk(width: usize, background_mm: i32) -> Vec<SensorFrame> {
    let empty = SensorFrame::uniform(width, background_mm, GOOD_STATUS);
    let last = width.saturating_sub(1);
    let mid = width / 2;

    let mut frames = vec![empty.clone(); 10];
    // Walk across, about 1.2 m away.
    for x in 0..=last {
        frames.extend(std::iter::repeat_n(person(&empty, x, mid, 1200), 3));
    }
    // Step towards the eyes, then lean in.
    for mm in (150..=1200).rev().step_by(75) {
        frames.push(person(&empty, mid, mid, mm));
    }
    frames.extend(std::iter::repeat_n(person(&empty, mid, mid, 150), 20));
    // Back off and walk away.
    for mm in (150..=1200).step_by(150) {
        frames.push(person(&empty, mid, mid, mm));
    }
    for x in mid..=last {
        frames.extend(std::iter::repeat_n(person(&empty, x, mid, 1200), 2));
    }
    frames.extend(std::iter::repeat_n(empty, 10));
    frames
}

/// A 3×3 body centred on `(cx, cy)`, clipped to the grid.
fn person(empty: &SensorFrame, cx: usize, cy: usize, distance_mm: i32) -> SensorFrame {
    let mut frame = empty.clone();
    for y in cy.saturating_sub(1)..=cy + 1 {
        for x in cx.saturating_sub(1)..=cx + 1 {
            frame = frame.with_zone(x, y, distance_mm, GOOD_STATUS);
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_starts_and_ends_empty() {
        let frames = visitor_walk(8, 2000);
        let empty = SensorFrame::uniform(8, 2000, GOOD_STATUS);
        assert_eq!(frames.first(), Some(&empty));
        assert_eq!(frames.last(), Some(&empty));
        assert!(frames.iter().all(|f| f.width() == 8));
    }

    #[test]
    fn visitor_gets_too_close() {
        let frames = visitor_walk(8, 2000);
        let nearest = frames
            .iter()
            .flat_map(|f| f.zones().iter().map(|z| z.distance_mm))
            .min();
        assert_eq!(nearest, Some(150));
    }

    #[test]
    fn person_is_clipped_at_edges() {
        let empty = SensorFrame::uniform(4, 2000, GOOD_STATUS);
        let frame = person(&empty, 0, 0, 500);
        let near = frame.zones().iter().filter(|z| z.distance_mm == 500).count();
        assert_eq!(near, 4);
    }
}

//! Zone Analyzer.
//!
//! Pure functions over an [`AdjustedFrame`] that look at the 3×3
//! neighborhood of a zone (clipped to the grid, the zone itself included).
//! An isolated foreground hit has a low score and is treated as noise.

use gaze_types::PerceptionTuning;

use crate::frame::{AdjustedFrame, AdjustedZone};

/// Number of foreground zones in the neighborhood of `index`, self included.
pub fn score(frame: &AdjustedFrame, index: usize) -> usize {
    frame.neighborhood(index).filter(|z| z.is_foreground()).count()
}

/// Mean of the foreground distances around `index` (integer division).
///
/// A zone that is not itself foreground is returned unchanged.
pub fn neighborhood_average(frame: &AdjustedFrame, index: usize) -> AdjustedZone {
    let own = frame.get(index);
    if !own.is_foreground() {
        return own;
    }
    let (total, count) = frame
        .neighborhood(index)
        .filter_map(AdjustedZone::foreground)
        .fold((0i64, 0i64), |(total, count), mm| (total + i64::from(mm), count + 1));
    // `own` is foreground, so `count >= 1`.
    AdjustedZone::Foreground((total / count) as i32)
}

/// `true` when a zone's score is high enough to be considered at all.
pub fn is_valid(score: usize, tuning: &PerceptionTuning) -> bool {
    score >= tuning.min_valid_score
}

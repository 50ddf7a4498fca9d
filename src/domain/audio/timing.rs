//! Turns provider timepoints into per-unit boundaries inside one batch's
//! audio.

use crate::domain::tts::Timepoint;

/// A unit's span within its own batch audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkSegment {
    pub mark_name: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Each mark runs until the next one starts; the last runs to the end of
/// the probed audio.
///
/// Timepoints without a name get an empty name and negative or non-finite
/// times are treated as zero.
pub fn reconcile(batch_duration_ms: u64, timepoints: &[Timepoint]) -> Vec<MarkSegment> {
    let mut starts: Vec<(String, u64)> = timepoints
        .iter()
        .map(|tp| {
            let start = if tp.time_seconds.is_finite() && tp.time_seconds > 0.0 {
                (tp.time_seconds * 1000.0).round() as u64
            } else {
                0
            };
            (tp.mark_name.clone().unwrap_or_default(), start)
        })
        .collect();
    starts.sort_by_key(|(_, start)| *start);

    let mut segments = Vec::with_capacity(starts.len());
    for (i, (mark_name, start_ms)) in starts.iter().enumerate() {
        let end_ms = match starts.get(i + 1) {
            Some((_, next_start)) => *next_start,
            None => batch_duration_ms.max(*start_ms),
        };
        segments.push(MarkSegment {
            mark_name: mark_name.clone(),
            start_ms: *start_ms,
            end_ms,
        });
    }
    segments
}

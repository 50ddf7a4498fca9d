//! Rough spoken-duration estimates for scripts that have not been
//! synthesized yet.
//!
//! These are empirical approximations, not bounds on the real audio length.

use crate::domain::script::{effective_speed, reading, ScriptUnit};

const NARRATION_WORDS_PER_SECOND: f64 = 3.0;
const TARGET_CHARS_PER_WORD: f64 = 5.0;
const TARGET_SECONDS_PER_WORD: f64 = 1.5;
const UNIT_OVERHEAD_SECONDS: f64 = 0.5;

pub fn estimate_unit_seconds(unit: &ScriptUnit) -> f64 {
    match unit {
        ScriptUnit::Narration { text, .. } => {
            text.split_whitespace().count() as f64 / NARRATION_WORDS_PER_SECOND
                + UNIT_OVERHEAD_SECONDS
        }
        ScriptUnit::Target {
            text,
            reading: unit_reading,
            speed,
            ..
        } => {
            let spoken = match unit_reading.as_deref().map(str::trim) {
                Some(r) if !r.is_empty() => reading::strip_annotations(r),
                _ => text.clone(),
            };
            let speed = effective_speed(*speed);
            let chars = spoken.chars().count() as f64;
            (chars / TARGET_CHARS_PER_WORD) * TARGET_SECONDS_PER_WORD / speed
                + UNIT_OVERHEAD_SECONDS
        }
        ScriptUnit::Pause { seconds } => {
            if seconds.is_finite() {
                seconds.max(0.0)
            } else {
                0.0
            }
        }
        ScriptUnit::Marker { .. } => 0.0,
    }
}

pub fn estimate_seconds(units: &[ScriptUnit]) -> f64 {
    units.iter().map(estimate_unit_seconds).sum()
}

//! Grouping of script units into provider calls.
//!
//! Consecutive units that share language, voice and speed are synthesized in
//! one call. Pauses close the running batch and are recorded out of band so
//! the assembler can insert silence; markers are invisible here.

use crate::domain::script::{effective_speed, reading, ScriptUnit};
use std::collections::BTreeMap;

const MARK_PREFIX: &str = "unit_";

/// Silence to insert, keyed by the original index of the pause unit.
pub type PauseRecord = BTreeMap<usize, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct BatchedUnit {
    pub original_index: usize,
    pub mark_name: String,
    pub rendered_text: String,
}

/// A run of units synthesizable in one provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub voice_id: String,
    pub language_code: String,
    pub speed: f64,
    pub pitch: Option<f64>,
    pub units: Vec<BatchedUnit>,
}

impl Batch {
    fn matches(&self, key: &BatchKey<'_>) -> bool {
        self.language_code == key.language_code
            && self.voice_id == key.voice_id
            && self.speed == key.speed
    }

    pub fn characters(&self) -> usize {
        self.units.iter().map(|u| u.rendered_text.chars().count()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPlan {
    pub batches: Vec<Batch>,
    pub pauses: PauseRecord,
}

impl BatchPlan {
    pub fn unit_count(&self) -> usize {
        self.batches.iter().map(|b| b.units.len()).sum()
    }
}

struct BatchKey<'a> {
    language_code: &'a str,
    voice_id: &'a str,
    speed: f64,
    pitch: Option<f64>,
}

/// Deterministic mark name for the unit at `index` in the original sequence.
pub fn mark_name(index: usize) -> String {
    format!("{}{}", MARK_PREFIX, index)
}

/// Split `units` into batches.
///
/// `native_language` is used for narration, `target_language` for target
/// units. Units with nothing to say are skipped with a warning and do not
/// affect batch boundaries.
pub fn group(units: &[ScriptUnit], native_language: &str, target_language: &str) -> BatchPlan {
    let mut plan = BatchPlan::default();
    let mut current: Option<Batch> = None;

    for (index, unit) in units.iter().enumerate() {
        let (key, text) = match unit {
            ScriptUnit::Marker { .. } => continue,
            ScriptUnit::Pause { seconds } => {
                if let Some(batch) = current.take() {
                    plan.batches.push(batch);
                }
                if seconds.is_finite() && *seconds >= 0.0 {
                    plan.pauses.insert(index, *seconds);
                } else {
                    tracing::warn!(
                        index = index,
                        seconds = seconds,
                        "Skipping pause with invalid duration"
                    );
                }
                continue;
            }
            ScriptUnit::Narration { text, voice_id } => (
                BatchKey {
                    language_code: native_language,
                    voice_id,
                    speed: 1.0,
                    pitch: None,
                },
                text.clone(),
            ),
            ScriptUnit::Target {
                text,
                reading,
                voice_id,
                speed,
                pitch,
                ..
            } => {
                let spoken = match reading.as_deref().map(str::trim) {
                    Some(r) if !r.is_empty() => reading::to_spoken(r),
                    _ => text.clone(),
                };
                (
                    BatchKey {
                        language_code: target_language,
                        voice_id,
                        speed: effective_speed(*speed),
                        pitch: *pitch,
                    },
                    spoken,
                )
            }
        };

        if text.trim().is_empty() {
            tracing::warn!(
                index = index,
                kind = unit.kind(),
                "Skipping script unit with empty text"
            );
            continue;
        }

        let batched = BatchedUnit {
            original_index: index,
            mark_name: mark_name(index),
            rendered_text: text,
        };

        match current.as_mut() {
            Some(batch) if batch.matches(&key) => batch.units.push(batched),
            _ => {
                if let Some(batch) = current.take() {
                    plan.batches.push(batch);
                }
                current = Some(Batch {
                    voice_id: key.voice_id.to_string(),
                    language_code: key.language_code.to_string(),
                    speed: key.speed,
                    pitch: key.pitch,
                    units: vec![batched],
                });
            }
        }
    }

    if let Some(batch) = current.take() {
        plan.batches.push(batch);
    }

    tracing::debug!(
        unit_count = units.len(),
        batch_count = plan.batches.len(),
        pause_count = plan.pauses.len(),
        "Script units grouped into batches"
    );

    plan
}

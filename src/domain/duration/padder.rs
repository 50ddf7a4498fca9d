use super::estimate::estimate_seconds;
use crate::domain::script::{Exchange, ReviewRoundBuilder, ScriptUnit};

pub const MAX_REVIEW_ROUNDS: usize = 5;
const FLOOR_RATIO: f64 = 0.9;
const CEILING_RATIO: f64 = 1.05;

#[derive(Debug, Clone, PartialEq)]
pub struct PaddingOutcome {
    pub units: Vec<ScriptUnit>,
    pub rounds_added: usize,
    pub estimated_seconds: f64,
    /// Whether the estimate ended inside the target band.
    pub within_target: bool,
}

/// Appends review rounds to a script until its estimated duration reaches
/// the target band `[0.9 * target, 1.05 * target]`.
///
/// The search is greedy and bounded by [`MAX_REVIEW_ROUNDS`]; when the band
/// cannot be reached the best effort is returned and logged.
#[derive(Debug, Clone)]
pub struct DurationPadder {
    rounds: ReviewRoundBuilder,
}

impl DurationPadder {
    pub fn new(narrator_voice_id: impl Into<String>) -> Self {
        Self {
            rounds: ReviewRoundBuilder::new(narrator_voice_id),
        }
    }

    pub fn pad_to_target(
        &self,
        units: Vec<ScriptUnit>,
        target_seconds: f64,
        review_material: &[Exchange],
    ) -> PaddingOutcome {
        let base_seconds = estimate_seconds(&units);
        let floor = target_seconds * FLOOR_RATIO;
        let ceiling = target_seconds * CEILING_RATIO;

        if !target_seconds.is_finite() || target_seconds <= 0.0 || base_seconds >= floor {
            return PaddingOutcome {
                within_target: base_seconds >= floor && base_seconds <= ceiling,
                units,
                rounds_added: 0,
                estimated_seconds: base_seconds,
            };
        }

        let mut rounds: Vec<(Vec<ScriptUnit>, f64)> = Vec::new();
        let mut total = base_seconds;

        while total < floor && rounds.len() < MAX_REVIEW_ROUNDS {
            let probe = self.rounds.build(rounds.len() + 1, review_material);
            let round_cost = estimate_seconds(&probe);
            if round_cost <= 0.0 {
                tracing::debug!("Review round has no cost, padding skipped");
                break;
            }

            let needed = ((floor - total) / round_cost).ceil().max(1.0) as usize;
            let to_add = needed.min(MAX_REVIEW_ROUNDS - rounds.len());
            for _ in 0..to_add {
                let round = self.rounds.build(rounds.len() + 1, review_material);
                let cost = estimate_seconds(&round);
                total += cost;
                rounds.push((round, cost));
            }
        }

        while total > ceiling {
            let Some((_, cost)) = rounds.pop() else { break };
            total -= cost;
        }

        let within_target = total >= floor && total <= ceiling;
        if !within_target {
            tracing::info!(
                target_seconds = target_seconds,
                estimated_seconds = total,
                rounds = rounds.len(),
                "Duration target not reachable, continuing with best effort"
            );
        }

        tracing::debug!(
            base_seconds = base_seconds,
            estimated_seconds = total,
            rounds_added = rounds.len(),
            "Script padded with review rounds"
        );

        let rounds_added = rounds.len();
        let mut units = units;
        for (round, _) in rounds {
            units.extend(round);
        }

        PaddingOutcome {
            units,
            rounds_added,
            estimated_seconds: total,
            within_target,
        }
    }
}

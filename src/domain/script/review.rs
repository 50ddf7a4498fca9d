use super::model::{Exchange, ScriptUnit};
use super::reading::annotate_reading;

/// Silence left for the learner to answer before hearing the line.
pub const ANTICIPATION_PAUSE_SECONDS: f64 = 3.0;
pub const SLOW_SPEED: f64 = 0.7;
pub const NORMAL_SPEED: f64 = 1.0;

/// Builds spaced-repetition review rounds out of a lesson's exchanges.
#[derive(Debug, Clone)]
pub struct ReviewRoundBuilder {
    narrator_voice_id: String,
}

impl ReviewRoundBuilder {
    pub fn new(narrator_voice_id: impl Into<String>) -> Self {
        Self {
            narrator_voice_id: narrator_voice_id.into(),
        }
    }

    /// Build review round `round` (1-based).
    ///
    /// Each contentful exchange contributes a prompt, an anticipation pause,
    /// a slow repeat and a normal-speed repeat. Successive rounds rotate the
    /// exchange order so the same line does not always open the round.
    /// Returns an empty vector when no exchange has content.
    pub fn build(&self, round: usize, exchanges: &[Exchange]) -> Vec<ScriptUnit> {
        let contentful: Vec<&Exchange> = exchanges.iter().filter(|e| e.is_contentful()).collect();
        if contentful.is_empty() {
            return Vec::new();
        }

        let offset = round.saturating_sub(1) % contentful.len();
        let mut units = Vec::with_capacity(contentful.len() * 4 + 1);
        units.push(ScriptUnit::marker(format!("review-round-{}", round)));

        for exchange in contentful.iter().cycle().skip(offset).take(contentful.len()) {
            units.push(ScriptUnit::narration(
                format!("How do you say \"{}\"?", exchange.translation.trim()),
                self.narrator_voice_id.clone(),
            ));
            units.push(ScriptUnit::pause(ANTICIPATION_PAUSE_SECONDS));
            units.push(drill_line(exchange, SLOW_SPEED));
            units.push(drill_line(exchange, NORMAL_SPEED));
        }

        units
    }
}

/// A target-language unit for one exchange at the given speed.
pub fn drill_line(exchange: &Exchange, speed: f64) -> ScriptUnit {
    ScriptUnit::Target {
        text: exchange.text.clone(),
        reading: exchange
            .reading
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(|r| annotate_reading(&exchange.text, r)),
        translation: Some(exchange.translation.clone()),
        voice_id: exchange.speaker_voice_id.clone(),
        speed,
        pitch: None,
        phrase_context: None,
    }
}

use super::error::ScriptError;
use super::model::{Exchange, ScriptUnit};
use super::review::{drill_line, ANTICIPATION_PAUSE_SECONDS, NORMAL_SPEED, SLOW_SPEED};
use async_trait::async_trait;

const SHORT_PAUSE_SECONDS: f64 = 1.0;

/// What a script generator needs to know about the lesson it writes.
#[derive(Debug, Clone)]
pub struct LessonContext {
    pub title: String,
    pub narrator_voice_id: String,
    pub native_language: String,
    pub target_language: String,
}

/// Produces lesson scripts from exchanges.
///
/// Content selection lives behind this trait; the audio pipeline only
/// consumes its output.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Build the initial script for a lesson.
    async fn generate(
        &self,
        lesson: &LessonContext,
        exchanges: &[Exchange],
    ) -> Result<Vec<ScriptUnit>, ScriptError>;

    /// Exchanges to draw review rounds from when a lesson runs short.
    async fn review_material(
        &self,
        _lesson: &LessonContext,
        exchanges: &[Exchange],
    ) -> Result<Vec<Exchange>, ScriptError> {
        Ok(exchanges.iter().filter(|e| e.is_contentful()).cloned().collect())
    }
}

/// Template-based generator: every exchange becomes a fixed drill pattern.
#[derive(Debug, Default)]
pub struct DrillScriptGenerator;

impl DrillScriptGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptGenerator for DrillScriptGenerator {
    async fn generate(
        &self,
        lesson: &LessonContext,
        exchanges: &[Exchange],
    ) -> Result<Vec<ScriptUnit>, ScriptError> {
        let mut ordered: Vec<&Exchange> = exchanges.iter().filter(|e| e.is_contentful()).collect();
        if ordered.is_empty() {
            return Err(ScriptError::NoContent);
        }
        ordered.sort_by_key(|e| e.order);

        let narrator = lesson.narrator_voice_id.as_str();
        let mut units = Vec::with_capacity(ordered.len() * 8 + 3);

        units.push(ScriptUnit::marker("intro"));
        units.push(ScriptUnit::narration(
            format!("Welcome to {}. Listen, then repeat each line.", lesson.title),
            narrator,
        ));
        units.push(ScriptUnit::pause(SHORT_PAUSE_SECONDS));

        for exchange in ordered {
            units.push(ScriptUnit::marker(format!("exchange-{}", exchange.order)));
            units.push(ScriptUnit::narration(
                format!("{} says: {}", exchange.speaker_name, exchange.translation.trim()),
                narrator,
            ));
            units.push(drill_line(exchange, NORMAL_SPEED));
            units.push(ScriptUnit::pause(SHORT_PAUSE_SECONDS));
            units.push(drill_line(exchange, SLOW_SPEED));
            units.push(ScriptUnit::pause(ANTICIPATION_PAUSE_SECONDS));
            units.push(drill_line(exchange, NORMAL_SPEED));
        }

        units.push(ScriptUnit::marker("outro"));
        units.push(ScriptUnit::narration("Great work. See you next time.", narrator));

        tracing::debug!(
            title = %lesson.title,
            exchange_count = exchanges.len(),
            unit_count = units.len(),
            "Drill script generated"
        );

        Ok(units)
    }
}

pub mod error;
pub mod generator;
pub mod model;
pub mod reading;
pub mod review;

pub use error::ScriptError;
pub use generator::{DrillScriptGenerator, LessonContext, ScriptGenerator};
pub use model::{decode_units, effective_speed, Exchange, ScriptUnit};
pub use review::ReviewRoundBuilder;

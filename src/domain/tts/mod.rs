pub mod batch;
pub mod error;
pub mod language;
pub mod model;
pub mod provider;
pub mod service;
pub mod ssml;

pub use batch::{group, Batch, BatchPlan, BatchedUnit, PauseRecord};
pub use error::TtsError;
pub use model::{SynthesisOutput, SynthesisRequest, Timepoint};
pub use provider::ProviderKind;
pub use service::TtsService;

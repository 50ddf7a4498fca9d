pub mod assembler;
pub mod error;
pub mod model;
pub mod silence;
pub mod timing;

pub use assembler::{scale_speed, AudioAssembler};
pub use error::AudioError;
pub use model::{AssemblyResult, SegmentTiming};
pub use silence::SilenceCache;
pub use timing::{reconcile, MarkSegment};

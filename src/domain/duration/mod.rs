pub mod estimate;
pub mod padder;

pub use estimate::{estimate_seconds, estimate_unit_seconds};
pub use padder::{DurationPadder, PaddingOutcome, MAX_REVIEW_ROUNDS};

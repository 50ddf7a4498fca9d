use serde::{Deserialize, Serialize};

/// Where one script unit sits in the final concatenated audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentTiming {
    pub unit_index: usize,
    pub start_time_ms: u64,
    pub end_time_ms: u64,
}

impl SegmentTiming {
    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }
}

/// The published artifact of one assembly run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyResult {
    pub audio_url: String,
    pub segments: Vec<SegmentTiming>,
    pub total_duration_ms: u64,
}

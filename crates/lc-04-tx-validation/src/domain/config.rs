use shared_types::Timestamp;

/// Tunables for the format stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Oldest acceptable transaction timestamp (Unix seconds).
    pub min_timestamp: Timestamp,
    /// How far past the local clock a timestamp may be.
    pub max_clock_skew_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            // 2020-01-01T00:00:00Z
            min_timestamp: 1_577_836_800,
            max_clock_skew_secs: 300,
        }
    }
}

use crate::join::ProbePolicy;
use crate::stream::ScanOptions;

/// Configuration shared by every pipeline pass.
///
/// Paths are not part of it: callers open their inputs and outputs and pass
/// them in, so passes run the same against files and in-memory buffers.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Streaming options for the large dump
    pub scan: ScanOptions,

    /// Log progress every N scanned records (0 = never)
    pub progress_every: u64,

    /// How probing records fall back across identifier kinds
    pub probe_policy: ProbePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            scan: ScanOptions::default(),
            progress_every: 100_000,
            probe_policy: ProbePolicy::Strict,
        }
    }
}

impl PipelineConfig {
    pub fn should_report(&self, scanned: u64) -> bool {
        self.progress_every != 0 && scanned % self.progress_every == 0
    }
}

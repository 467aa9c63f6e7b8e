//! Runtime counters for the scanning pipeline

/// Counters updated once per cycle (not persisted)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames that reached the pipeline
    pub frames_received: u64,
    /// Frames released without recognition because scanning was paused
    pub discarded_while_paused: u64,
    /// Cycles skipped because the target region had no area
    pub degenerate_regions: u64,
    /// Frames submitted to the recognizer
    pub recognitions: u64,
    /// Recognizer failures
    pub recognition_failures: u64,
    /// Recognized frames without a qualifying block
    pub no_match: u64,
    /// Qualifying matches
    pub matches: u64,
    /// Notifications handed to the link
    pub deliveries: u64,
    /// Notifications the link refused
    pub delivery_failures: u64,
    /// Last matched text
    pub last_match: Option<String>,
    /// Last error message (if any)
    pub last_error: Option<String>,
}

impl PipelineStats {
    /// Set an error message
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    /// Frames that ran to the end of a cycle, whatever the outcome
    pub fn completed_cycles(&self) -> u64 {
        self.discarded_while_paused
            + self.degenerate_regions
            + self.recognition_failures
            + self.no_match
            + self.matches
    }
}

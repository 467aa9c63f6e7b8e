//! Recognizer that replays canned responses
//!
//! Used in place of an OCR engine when running without one. Responses are
//! read from a JSON array such as:
//!
//! ```json
//! [
//!   { "outcome": "blocks", "blocks": [
//!       { "text": "EXIT", "bounding_box": { "left": 120, "top": 480, "right": 300, "bottom": 520 } }
//!   ] },
//!   { "outcome": "failure", "message": "motion blur" },
//!   { "outcome": "unavailable" }
//! ]
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

use super::{OcrError, TextBlock, TextRecognizer};
use crate::capture::Frame;

/// One scripted recognition result
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScriptStep {
    Blocks { blocks: Vec<TextBlock> },
    Failure { message: String },
    Unavailable,
}

/// Replays a fixed queue of results, then reports no text
pub struct ScriptedRecognizer {
    steps: Mutex<VecDeque<ScriptStep>>,
    latency: Duration,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Parse a script from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let steps: Vec<ScriptStep> =
            serde_json::from_str(json).context("Failed to parse recognizer script")?;
        Ok(Self::new(steps))
    }

    /// Load a script from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recognizer script: {:?}", path))?;
        Self::from_json(&content)
    }

    /// Simulated processing time per call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of frames submitted so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Steps not yet replayed
    pub fn remaining(&self) -> usize {
        self.steps.lock().len()
    }
}

#[async_trait]
impl TextRecognizer for ScriptedRecognizer {
    async fn recognize(&self, frame: &Frame) -> Result<Vec<TextBlock>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let step = self.steps.lock().pop_front();
        debug!(
            "Scripted recognizer: frame {} (rotation {}°) -> {:?}",
            frame.sequence(),
            frame.rotation().degrees(),
            step.as_ref().map(|s| match s {
                ScriptStep::Blocks { blocks } => blocks.len(),
                ScriptStep::Failure { .. } | ScriptStep::Unavailable => 0,
            })
        );

        match step {
            None => Ok(vec![]),
            Some(ScriptStep::Blocks { blocks }) => Ok(blocks),
            Some(ScriptStep::Failure { message }) => Err(OcrError::Engine(message)),
            Some(ScriptStep::Unavailable) => Err(OcrError::Unavailable),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{BufferPool, Rotation};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SCRIPT: &str = r#"[
        { "outcome": "blocks", "blocks": [
            { "text": "EXIT", "bounding_box": { "left": 120, "top": 480, "right": 300, "bottom": 520 } },
            { "text": "floating" }
        ] },
        { "outcome": "failure", "message": "motion blur" },
        { "outcome": "unavailable" }
    ]"#;

    #[tokio::test]
    async fn test_replays_script_in_order() {
        let recognizer = ScriptedRecognizer::from_json(SCRIPT).unwrap();
        let pool = BufferPool::new(1, 4);
        let frame = pool.frame(1, 2, 2, Rotation::Deg0).unwrap();

        let blocks = recognizer.recognize(&frame).await.unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "EXIT");
        assert!(blocks[0].bounding_box.is_some());
        assert!(blocks[1].bounding_box.is_none());

        let err = recognizer.recognize(&frame).await.unwrap_err();
        assert!(matches!(err, OcrError::Engine(ref m) if m == "motion blur"));

        let err = recognizer.recognize(&frame).await.unwrap_err();
        assert!(matches!(err, OcrError::Unavailable));

        // Exhausted script reports no text
        assert!(recognizer.recognize(&frame).await.unwrap().is_empty());
        assert_eq!(recognizer.calls(), 4);
        assert_eq!(recognizer.remaining(), 0);
    }

    #[test]
    fn test_load_script_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SCRIPT).unwrap();

        let recognizer = ScriptedRecognizer::load(file.path()).unwrap();
        assert_eq!(recognizer.remaining(), 3);
    }

    #[test]
    fn test_invalid_script_is_rejected() {
        assert!(ScriptedRecognizer::from_json("{ not a list }").is_err());
        assert!(ScriptedRecognizer::from_json(r#"[{ "outcome": "maybe" }]"#).is_err());
    }
}

//! Shared state and messaging between the pipeline and the operator
//!
//! The pipeline records counters into [`PipelineStats`] and reports every
//! notable cycle outcome as a [`PipelineEvent`] over a channel drained by the
//! application.

pub mod messages;
pub mod state;

pub use messages::PipelineEvent;
pub use state::PipelineStats;

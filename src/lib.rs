pub mod config;
pub mod error;
pub mod experiment;
pub mod logging;
pub mod metrics;
pub mod scoring;
pub mod submit;
pub mod sweep;

// Re-export commonly used types
pub use error::{Result, SweepError};
pub use experiment::{ExperimentBuilder, ExperimentConfig, FeedbackConfig, RetrievalAlgorithm};
pub use metrics::{MetricsExtractor, SubmissionResult};
pub use sweep::{ExperimentRecord, Orchestrator, SweepPlan};

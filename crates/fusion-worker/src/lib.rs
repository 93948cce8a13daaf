//! Fusion clip worker.
//!
//! Runs the pipeline for one channel:
//! 1. Cut every analysed source video into per-scene clips
//! 2. Aggregate the cut scenes, resolve characters and persist the table
//! 3. Copy two-character clips into the delivery directory
//! 4. Write the report, the mapping and a run summary

pub mod config;
pub mod cut_stage;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod summary;

pub use config::WorkerConfig;
pub use cut_stage::{CutReport, CutStage};
pub use error::{WorkerError, WorkerResult};
pub use executor::ChannelRunner;
pub use logging::StageLogger;
pub use summary::RunSummary;

//! Post-processing of cut fusion scenes.
//!
//! This crate provides:
//! - Scene aggregation across per-video final documents
//! - The entity registry: stable character ids with exact and fuzzy matching
//! - Character table persistence so ids survive across runs
//! - The appearance index (character -> clips)
//! - Pairing of two-character clips and their materialization into a
//!   delivery directory
//! - The final report table
//!
//! Everything here is synchronous. Identity assignment is sequential by
//! nature; only the file copies of materialization run in parallel.

pub mod aggregate;
pub mod appearance;
pub mod error;
pub mod fs_utils;
pub mod layout;
pub mod normalize;
pub mod pairing;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod table;

pub use aggregate::{discover_final_documents, write_merged_document, AggregateReport, Aggregation, SceneAggregator};
pub use appearance::AppearanceIndex;
pub use error::{CatalogError, CatalogResult};
pub use fs_utils::CopyOutcome;
pub use layout::ChannelLayout;
pub use normalize::{normalize_name, similarity};
pub use pairing::{pair_clips, ClipPair, MaterializeReport, Materialization, Materializer, PairingEntry};
pub use pipeline::{run_post_process, PostProcessOptions, PostProcessSummary};
pub use registry::{EntityRegistry, RegistryConfig, RegistryReport, DEFAULT_FUZZY_THRESHOLD};
pub use report::{build_report, write_report, ReportRow};
pub use table::{CharacterRow, CharacterTable};

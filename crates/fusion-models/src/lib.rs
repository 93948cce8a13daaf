//! Shared data models for the FusionClip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Analysis documents written by the AI scene-detection stage
//! - Final scene documents written by the cutting stage
//! - Canonical characters and their appearances
//! - Timestamps and channel names

pub mod analysis;
pub mod channel;
pub mod character;
pub mod flag;
pub mod scene;
pub mod timestamp;

// Re-export common types
pub use analysis::{AnalysisDocument, CostBreakdown, DetectedScene, TokenPricing, TokenUsage};
pub use channel::{channel_name, ChannelNameError};
pub use character::{Appearance, Character, CharacterId, CharacterIdError, MAX_CHARACTERS};
pub use flag::Flag;
pub use scene::{FinalDocument, SceneRecord};
pub use timestamp::{format_seconds, parse_timestamp, TimestampError};

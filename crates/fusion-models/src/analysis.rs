//! Analysis documents written by the AI scene-detection stage.
//!
//! One `{video}-result.json` per source video. The scenes carry raw model
//! timestamps; the cutting stage turns them into [`SceneRecord`](crate::SceneRecord)s.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Flag;

/// A fusion scene as reported by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedScene {
    /// Brief description of the scene
    #[serde(default)]
    pub text: String,

    /// Start timestamp, `MM:SS` or `MM:SS.mmm`
    #[serde(default)]
    pub time: String,

    #[serde(default)]
    pub original_entities: Vec<String>,

    #[serde(default)]
    pub fused_result: String,

    #[serde(default)]
    #[schemars(with = "String")]
    pub watermark: Flag,

    #[serde(default)]
    #[schemars(with = "String")]
    pub other_texts: Flag,
}

/// Cost of one analysis call in dollars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostBreakdown {
    #[serde(default)]
    pub input_cost: f64,
    #[serde(default)]
    pub output_cost: f64,
    #[serde(default)]
    pub total_cost: f64,
}

/// Per-million-token prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Default for TokenPricing {
    fn default() -> Self {
        Self {
            input_per_million: 0.10,
            output_per_million: 0.40,
        }
    }
}

/// Token accounting reported by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub candidates_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Compute the cost of this usage. Input and output costs are rounded to
    /// 5 decimals, the total to 4.
    pub fn cost(&self, pricing: &TokenPricing) -> CostBreakdown {
        let input = self.prompt_tokens as f64 / 1_000_000.0 * pricing.input_per_million;
        let output = self.candidates_tokens as f64 / 1_000_000.0 * pricing.output_per_million;

        CostBreakdown {
            input_cost: round_to(input, 5),
            output_cost: round_to(output, 5),
            total_cost: round_to(input + output, 4),
        }
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.candidates_tokens += other.candidates_tokens;
        self.total_tokens += other.total_tokens;
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Full `{video}-result.json` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisDocument {
    #[serde(default)]
    pub scenes: Vec<DetectedScene>,

    #[serde(default)]
    pub prompt_token_count: u64,

    #[serde(default)]
    pub candidates_token_count: u64,

    #[serde(default)]
    pub total_token_count: u64,

    #[serde(default)]
    pub cost: CostBreakdown,
}

impl AnalysisDocument {
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_token_count,
            candidates_tokens: self.candidates_token_count,
            total_tokens: self.total_token_count,
        }
    }
}

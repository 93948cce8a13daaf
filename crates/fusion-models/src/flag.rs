//! Tri-state yes/no flags reported by the scene-detection model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A yes/no answer that may also be missing or unintelligible.
///
/// The model answers free-form strings (`"yes"`, `"No"`, `""`), so anything
/// that is not recognisably yes or no collapses to [`Flag::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Flag {
    Yes,
    No,
    #[default]
    Unknown,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Yes => "yes",
            Flag::No => "no",
            Flag::Unknown => "unknown",
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Flag::Yes)
    }
}

impl From<&str> for Flag {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Flag::Yes,
            "no" | "n" | "false" => Flag::No,
            _ => Flag::Unknown,
        }
    }
}

impl From<String> for Flag {
    fn from(s: String) -> Self {
        Flag::from(s.as_str())
    }
}

impl From<Flag> for String {
    fn from(flag: Flag) -> Self {
        flag.as_str().to_string()
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Canonical character identities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Size of the identifier space (`001`..=`999`).
pub const MAX_CHARACTERS: u16 = 999;

/// Stable identifier of a character, rendered as a 3-digit zero-padded string.
///
/// Fixed width means lexicographic and numeric order agree, which the pairing
/// filenames rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharacterId(u16);

/// Error parsing a character id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CharacterIdError {
    #[error("Character id is not a number: {0}")]
    NotNumeric(String),

    #[error("Character id {0} is outside 001..=999")]
    OutOfRange(u32),
}

impl CharacterId {
    /// Create an id from its numeric value (1..=999).
    pub fn new(value: u16) -> Option<Self> {
        (1..=MAX_CHARACTERS).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// The id that follows this one, if the id space is not exhausted.
    pub fn next(&self) -> Option<Self> {
        Self::new(self.0 + 1)
    }
}

impl FromStr for CharacterId {
    type Err = CharacterIdError;

    /// Accepts padded (`"007"`) and legacy unpadded (`"7"`) forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value: u32 = s
            .parse()
            .map_err(|_| CharacterIdError::NotNumeric(s.to_string()))?;
        u16::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(CharacterIdError::OutOfRange(value))
    }
}

impl TryFrom<String> for CharacterId {
    type Error = CharacterIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CharacterId> for String {
    fn from(id: CharacterId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// A canonical entity identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,

    /// First raw spelling seen, kept for display
    pub canonical_name: String,

    /// Normalized spellings known to map to this identity
    pub variations: BTreeSet<String>,
}

/// A (character, clip) membership fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Appearance {
    pub character_id: CharacterId,
    pub clip_name: String,
}

impl Appearance {
    pub fn new(character_id: CharacterId, clip_name: impl Into<String>) -> Self {
        Self {
            character_id,
            clip_name: clip_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_id_display_is_zero_padded() {
        assert_eq!(CharacterId::new(1).unwrap().to_string(), "001");
        assert_eq!(CharacterId::new(42).unwrap().to_string(), "042");
        assert_eq!(CharacterId::new(999).unwrap().to_string(), "999");
    }

    #[test]
    fn test_character_id_range() {
        assert!(CharacterId::new(0).is_none());
        assert!(CharacterId::new(1000).is_none());
        assert!(CharacterId::new(999).unwrap().next().is_none());
    }

    #[test]
    fn test_character_id_parse_legacy_forms() {
        assert_eq!("007".parse::<CharacterId>().unwrap().value(), 7);
        assert_eq!("7".parse::<CharacterId>().unwrap().value(), 7);
        assert!(matches!(
            "abc".parse::<CharacterId>(),
            Err(CharacterIdError::NotNumeric(_))
        ));
        assert!(matches!(
            "1000".parse::<CharacterId>(),
            Err(CharacterIdError::OutOfRange(1000))
        ));
    }

    #[test]
    fn test_string_order_matches_numeric_order() {
        let nine = CharacterId::new(9).unwrap();
        let ten = CharacterId::new(10).unwrap();
        assert!(nine < ten);
        assert!(nine.to_string() < ten.to_string());
    }

    #[test]
    fn test_character_id_serde() {
        let id = CharacterId::new(12).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"012\"");
        let back: CharacterId = serde_json::from_str("\"012\"").unwrap();
        assert_eq!(back, id);
    }
}

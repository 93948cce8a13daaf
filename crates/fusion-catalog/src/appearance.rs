//! Read-only view of character appearances.

use fusion_models::{Appearance, CharacterId};

/// Character -> clips view over the registry's appearances.
#[derive(Debug, Clone, Copy)]
pub struct AppearanceIndex<'a> {
    appearances: &'a [Appearance],
}

impl<'a> AppearanceIndex<'a> {
    pub fn new(appearances: &'a [Appearance]) -> Self {
        Self { appearances }
    }

    /// Clips the character appears in, in insertion order.
    pub fn videos_for(&self, id: CharacterId) -> Vec<&'a str> {
        self.appearances
            .iter()
            .filter(|a| a.character_id == id)
            .map(|a| a.clip_name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.appearances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appearances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_videos_for_preserves_insertion_order() {
        let fox = CharacterId::new(1).unwrap();
        let bear = CharacterId::new(2).unwrap();
        let appearances = vec![
            Appearance::new(fox, "b.mp4"),
            Appearance::new(bear, "b.mp4"),
            Appearance::new(fox, "a.mp4"),
        ];
        let index = AppearanceIndex::new(&appearances);

        assert_eq!(index.videos_for(fox), vec!["b.mp4", "a.mp4"]);
        assert_eq!(index.videos_for(bear), vec!["b.mp4"]);
        assert!(index.videos_for(CharacterId::new(3).unwrap()).is_empty());
    }
}

//! Scene records produced by the cutting stage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Flag;

/// One detected fusion event, cut into its own clip.
///
/// Serialized with the field names of the per-video final documents, so
/// `clip_name` appears as `"name"` and `duration` as `"total time"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneRecord {
    /// Path of the cut clip as written by the cutter
    #[serde(rename = "name")]
    pub clip_name: String,

    /// Raw entity names, usually two
    #[serde(rename = "original_entities", default)]
    pub entities: Vec<String>,

    /// Description of the fused entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fused_result: Option<String>,

    /// Clip duration in seconds
    #[serde(rename = "total time", default)]
    pub duration: f64,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "watermark", default)]
    #[schemars(with = "String")]
    pub watermark_flag: Flag,

    /// Absent in documents written before on-screen text detection existed
    #[serde(rename = "other_texts", default)]
    #[schemars(with = "String")]
    pub extra_text_flag: Flag,
}

impl SceneRecord {
    /// Base filename of the clip (`static/a/cut/x-1.mp4` -> `x-1.mp4`).
    pub fn file_name(&self) -> &str {
        Path::new(&self.clip_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.clip_name)
    }
}

/// Per-video final document (`{video}-final.json`), also the shape of the
/// merged channel document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinalDocument {
    pub scenes: Vec<SceneRecord>,
}

impl FinalDocument {
    pub fn new(scenes: Vec<SceneRecord>) -> Self {
        Self { scenes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_record_from_final_json() {
        let json = r#"{
            "name": "static/wild/cut/7301-2.mp4",
            "original_entities": ["Fox", "Bear"],
            "total time": 4.5,
            "description": "A fox and a bear merge",
            "watermark": "no",
            "other_texts": "yes"
        }"#;

        let scene: SceneRecord = serde_json::from_str(json).unwrap();
        assert_eq!(scene.clip_name, "static/wild/cut/7301-2.mp4");
        assert_eq!(scene.file_name(), "7301-2.mp4");
        assert_eq!(scene.entities, vec!["Fox", "Bear"]);
        assert_eq!(scene.watermark_flag, Flag::No);
        assert_eq!(scene.extra_text_flag, Flag::Yes);
        assert!(scene.fused_result.is_none());
    }

    #[test]
    fn test_legacy_record_without_other_texts() {
        let json = r#"{"name": "a-1.mp4", "original_entities": [], "total time": 2, "description": "", "watermark": ""}"#;

        let scene: SceneRecord = serde_json::from_str(json).unwrap();
        assert_eq!(scene.extra_text_flag, Flag::Unknown);
        assert_eq!(scene.watermark_flag, Flag::Unknown);
    }

    #[test]
    fn test_serialized_field_names() {
        let doc = FinalDocument::new(vec![SceneRecord {
            clip_name: "a-1.mp4".to_string(),
            entities: vec!["Owl".to_string()],
            fused_result: None,
            duration: 1.0,
            description: String::new(),
            watermark_flag: Flag::Yes,
            extra_text_flag: Flag::No,
        }]);

        let value = serde_json::to_value(&doc).unwrap();
        let scene = &value["scenes"][0];
        assert_eq!(scene["name"], "a-1.mp4");
        assert_eq!(scene["total time"], 1.0);
        assert_eq!(scene["watermark"], "yes");
        assert_eq!(scene["other_texts"], "no");
        assert!(scene.get("fused_result").is_none());
    }

    #[test]
    fn test_document_schema_names_wire_fields() {
        let schema = schemars::schema_for!(FinalDocument);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("total time"));
        assert!(json.contains("original_entities"));
    }
}

use crate::workflow::StepKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output of one adapter call, tagged with the kind of media it produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GenerationResult {
    #[serde(rename_all = "camelCase")]
    Audio {
        file_path: PathBuf,
        /// Estimated length in seconds
        duration: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    Image { file_path: PathBuf, prompt: String },
    #[serde(rename_all = "camelCase")]
    Video {
        file_path: PathBuf,
        operation_name: String,
    },
}

impl GenerationResult {
    pub fn file_path(&self) -> &Path {
        match self {
            GenerationResult::Audio { file_path, .. }
            | GenerationResult::Image { file_path, .. }
            | GenerationResult::Video { file_path, .. } => file_path,
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            GenerationResult::Audio { .. } => StepKind::Tts,
            GenerationResult::Image { .. } => StepKind::Image,
            GenerationResult::Video { .. } => StepKind::Video,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_result_wire_shape() {
        let result = GenerationResult::Audio {
            file_path: PathBuf::from("audio/tts_1.wav"),
            duration: Some(2),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "audio");
        assert_eq!(value["filePath"], "audio/tts_1.wav");
        assert_eq!(value["duration"], 2);
    }
}

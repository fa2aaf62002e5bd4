use serde::{Deserialize, Serialize};
use std::fmt;

pub type WorkflowId = String;
pub type StepId = String;

/// Complete workflow definition as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    /// Run every step concurrently instead of in declaration order
    #[serde(default)]
    pub parallel: bool,
}

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            steps: Vec::new(),
            parallel: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// One generation call inside a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: StepId,
    #[serde(flatten)]
    pub config: StepConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<StepId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>, config: impl Into<StepConfig>) -> Self {
        Self {
            id: id.into(),
            config: config.into(),
            depends_on: Vec::new(),
            output_key: None,
        }
    }

    pub fn depends_on(mut self, step_id: impl Into<String>) -> Self {
        self.depends_on.push(step_id.into());
        self
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn kind(&self) -> StepKind {
        self.config.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Tts,
    #[serde(alias = "imagen")]
    Image,
    #[serde(alias = "veo")]
    Video,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Tts => "tts",
            StepKind::Image => "image",
            StepKind::Video => "video",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-specific payload, keyed on the wire by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum StepConfig {
    Tts(TtsRequest),
    #[serde(alias = "imagen")]
    Image(ImageRequest),
    #[serde(alias = "veo")]
    Video(VideoRequest),
}

impl StepConfig {
    pub fn kind(&self) -> StepKind {
        match self {
            StepConfig::Tts(_) => StepKind::Tts,
            StepConfig::Image(_) => StepKind::Image,
            StepConfig::Video(_) => StepKind::Video,
        }
    }
}

impl From<TtsRequest> for StepConfig {
    fn from(r: TtsRequest) -> Self {
        StepConfig::Tts(r)
    }
}

impl From<ImageRequest> for StepConfig {
    fn from(r: ImageRequest) -> Self {
        StepConfig::Image(r)
    }
}

impl From<VideoRequest> for StepConfig {
    fn from(r: VideoRequest) -> Self {
        StepConfig::Video(r)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speakers: Vec<SpeakerConfig>,
}

impl TtsRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerConfig {
    pub name: String,
    pub voice: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_generation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_generation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

impl VideoRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_step_config_by_type_tag() {
        let json = r#"{
            "id": "t1",
            "name": "x",
            "steps": [
                {"id": "s1", "type": "tts", "config": {"text": "hi"}, "outputKey": "audio"},
                {"id": "s2", "type": "imagen", "config": {"prompt": "a lake", "aspectRatio": "16:9"}, "dependsOn": ["s1"]},
                {"id": "s3", "type": "veo", "config": {"prompt": "a cat", "durationSeconds": 5}}
            ]
        }"#;

        let def: WorkflowDefinition = serde_json::from_str(json).unwrap();
        assert!(!def.parallel);
        assert_eq!(def.steps.len(), 3);
        assert_eq!(def.steps[0].kind(), StepKind::Tts);
        assert_eq!(def.steps[0].output_key.as_deref(), Some("audio"));
        assert_eq!(def.steps[1].kind(), StepKind::Image);
        assert_eq!(def.steps[1].depends_on, vec!["s1".to_string()]);
        match &def.steps[2].config {
            StepConfig::Video(v) => assert_eq!(v.duration_seconds, Some(5)),
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn serializes_with_canonical_kind_names() {
        let step = WorkflowStep::new("img", ImageRequest::new("sunset")).with_output_key("image");
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["config"]["prompt"], "sunset");
        assert_eq!(value["outputKey"], "image");
        assert!(value.get("dependsOn").is_none());
    }
}

use crate::audio;
use crate::client::GeminiClient;
use crate::config::GatewayConfig;
use crate::storage::{timestamped_name, MediaKind, MediaStore};
use async_trait::async_trait;
use base64::Engine;
use mediacore::{
    AdapterError, GenerationAdapter, GenerationResult, StepConfig, StepContext, StepKind,
    TtsRequest,
};
use serde_json::{json, Value};
use std::path::PathBuf;

const VOICES: &[&str] = &[
    "Kore", "Puck", "Charon", "Fenrir", "Aoede", "Juno", "Leda", "Seda", "Rei", "Ayla",
];

/// Synthesized speech as returned by the provider
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub data: Vec<u8>,
    pub content_type: String,
    /// Estimated length in seconds
    pub duration: u64,
}

/// Speech written to the audio directory
#[derive(Debug, Clone)]
pub struct SavedSpeech {
    pub path: PathBuf,
    pub filename: String,
    pub content_type: String,
}

/// Text-to-speech adapter
pub struct TtsAdapter {
    client: GeminiClient,
    store: MediaStore,
    model: String,
    voice: String,
    ffmpeg: String,
}

impl TtsAdapter {
    pub fn new(client: GeminiClient, store: MediaStore, config: &GatewayConfig) -> Self {
        Self {
            client,
            store,
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            ffmpeg: config.ffmpeg().to_string(),
        }
    }

    pub fn voices(&self) -> &'static [&'static str] {
        VOICES
    }

    pub fn build_request_body(&self, request: &TtsRequest) -> Value {
        let speech_config = if request.speakers.is_empty() {
            json!({
                "voiceConfig": {
                    "prebuiltVoiceConfig": {
                        "voiceName": request.voice.as_deref().unwrap_or(&self.voice)
                    }
                }
            })
        } else {
            let speakers: Vec<Value> = request
                .speakers
                .iter()
                .map(|s| {
                    json!({
                        "speaker": s.name,
                        "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": s.voice } }
                    })
                })
                .collect();
            json!({ "multiSpeakerVoiceConfig": { "speakerVoiceConfigs": speakers } })
        };

        json!({
            "contents": [{ "parts": [{ "text": request.text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": speech_config
            },
            "model": request.model.as_deref().unwrap_or(&self.model)
        })
    }

    pub async fn synthesize(&self, request: &TtsRequest) -> Result<SpeechAudio, AdapterError> {
        if request.text.trim().is_empty() {
            return Err(AdapterError::InvalidInput("Text is required".to_string()));
        }

        let model = request.model.as_deref().unwrap_or(&self.model);
        tracing::info!(
            "TTS request: model={} voice={} chars={}",
            model,
            request.voice.as_deref().unwrap_or(&self.voice),
            request.text.chars().count()
        );

        let url = self.client.model_url(model, "generateContent");
        let response = self.client.post_json(&url, &self.build_request_body(request)).await?;
        let (data, content_type) = parse_speech_response(&response)?;

        tracing::debug!("TTS audio: {} bytes, {}", data.len(), content_type);
        Ok(SpeechAudio {
            data,
            content_type,
            duration: estimate_duration(&request.text),
        })
    }

    /// Persist synthesized speech, converting raw samples to WAV
    pub async fn save(&self, audio: &SpeechAudio) -> Result<SavedSpeech, AdapterError> {
        if audio::is_raw_pcm(&audio.content_type) {
            let filename = timestamped_name("tts", "wav");
            let output = self.store.dir(MediaKind::Audio).join(&filename);
            let path = audio::convert_to_wav(&self.ffmpeg, &audio.data, &output, &audio.content_type).await?;
            Ok(SavedSpeech {
                path,
                filename,
                content_type: "audio/wav".to_string(),
            })
        } else {
            let filename = timestamped_name("tts", "mp3");
            let path = self.store.save(MediaKind::Audio, &filename, &audio.data).await?;
            let content_type = if audio.content_type.is_empty() {
                "audio/mpeg".to_string()
            } else {
                audio.content_type.clone()
            };
            Ok(SavedSpeech {
                path,
                filename,
                content_type,
            })
        }
    }
}

#[async_trait]
impl GenerationAdapter for TtsAdapter {
    fn kind(&self) -> StepKind {
        StepKind::Tts
    }

    async fn execute(&self, ctx: StepContext) -> Result<GenerationResult, AdapterError> {
        let StepConfig::Tts(request) = &ctx.config else {
            return Err(ctx.mismatched(StepKind::Tts));
        };

        ctx.events.info(format!("Synthesizing {} characters", request.text.chars().count()));
        let audio = self.synthesize(request).await?;
        let saved = self.save(&audio).await?;
        ctx.events.info(format!("Audio saved to {}", saved.path.display()));

        Ok(GenerationResult::Audio {
            file_path: saved.path,
            duration: Some(audio.duration),
        })
    }
}

/// Pull the inline audio out of a `generateContent` response
pub fn parse_speech_response(value: &Value) -> Result<(Vec<u8>, String), AdapterError> {
    let inline = &value["candidates"][0]["content"]["parts"][0]["inlineData"];
    let encoded = inline["data"]
        .as_str()
        .ok_or_else(|| AdapterError::malformed("Invalid response structure from TTS API"))?;

    let data = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| AdapterError::malformed(format!("Invalid audio payload: {}", e)))?;

    let content_type = inline["mimeType"].as_str().unwrap_or("audio/pcm").to_string();
    Ok((data, content_type))
}

/// Rough speaking time: three Latin words or two other characters per second
pub fn estimate_duration(text: &str) -> u64 {
    let words = text.split_whitespace().count().max(1) as f64;
    let other_chars = text
        .chars()
        .filter(|c| !c.is_ascii_alphanumeric() && !c.is_whitespace())
        .count() as f64;

    (words / 3.0 + other_chars / 2.0).ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediacore::SpeakerConfig;

    fn adapter() -> TtsAdapter {
        let config = GatewayConfig::default();
        let client = GeminiClient::new(&config).unwrap();
        TtsAdapter::new(client, MediaStore::new("."), &config)
    }

    #[test]
    fn single_speaker_body_uses_default_voice() {
        let body = adapter().build_request_body(&TtsRequest::new("hello"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Kore"
        );
        assert_eq!(body["model"], "gemini-2.5-flash-preview-tts");
    }

    #[test]
    fn multi_speaker_body_lists_every_speaker() {
        let mut request = TtsRequest::new("Joe: hi. Jane: hello.");
        request.speakers = vec![
            SpeakerConfig { name: "Joe".to_string(), voice: "Kore".to_string() },
            SpeakerConfig { name: "Jane".to_string(), voice: "Puck".to_string() },
        ];

        let body = adapter().build_request_body(&request);
        let configs = &body["generationConfig"]["speechConfig"]["multiSpeakerVoiceConfig"]["speakerVoiceConfigs"];
        assert_eq!(configs.as_array().unwrap().len(), 2);
        assert_eq!(configs[1]["speaker"], "Jane");
        assert_eq!(configs[1]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"], "Puck");
    }

    #[test]
    fn parses_inline_audio() {
        let response = json!({
            "candidates": [{"content": {"parts": [{"inlineData": {
                "mimeType": "audio/L16;codec=pcm;rate=24000",
                "data": "AAECAw=="
            }}]}}]
        });
        let (data, mime) = parse_speech_response(&response).unwrap();
        assert_eq!(data, vec![0, 1, 2, 3]);
        assert_eq!(mime, "audio/L16;codec=pcm;rate=24000");

        assert!(parse_speech_response(&json!({"candidates": []})).is_err());
    }

    #[test]
    fn duration_estimate() {
        assert_eq!(estimate_duration("hi"), 1);
        assert_eq!(estimate_duration("one two three four five six"), 2);
        assert_eq!(estimate_duration("你好世界"), 3);
    }

    #[tokio::test]
    async fn blank_text_is_invalid_input() {
        let err = adapter().synthesize(&TtsRequest::new("   ")).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidInput(_)));
    }
}

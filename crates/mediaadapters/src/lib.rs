//! Generation adapters
//!
//! Gemini-backed text-to-speech, image and video adapters, plus the media
//! store they write into and the gateway configuration they are built from.

pub mod audio;
mod client;
mod config;
mod imagen;
pub mod storage;
mod tts;
mod veo;

pub use client::{upstream_message, GeminiClient};
pub use config::GatewayConfig;
pub use imagen::{parse_predictions, GeneratedImages, ImageAdapter};
pub use storage::{MediaFile, MediaKind, MediaStore};
pub use tts::{estimate_duration, parse_speech_response, SavedSpeech, SpeechAudio, TtsAdapter};
pub use veo::{operation_id, parse_operation, OperationStatus, VideoAdapter, VideoOperation};

use mediacore::AdapterError;
use mediaruntime::AdapterRegistry;
use std::sync::Arc;

/// The three provider adapters sharing one HTTP client and media store
#[derive(Clone)]
pub struct Adapters {
    pub tts: Arc<TtsAdapter>,
    pub image: Arc<ImageAdapter>,
    pub video: Arc<VideoAdapter>,
    pub store: MediaStore,
}

impl Adapters {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, AdapterError> {
        let client = GeminiClient::new(config)?;
        let store = MediaStore::new(&config.media_root);

        if config.gemini_api_key.is_empty() {
            tracing::warn!("GEMINI_API_KEY is not set; provider calls will be rejected");
        }

        Ok(Self {
            tts: Arc::new(TtsAdapter::new(client.clone(), store.clone(), config)),
            image: Arc::new(ImageAdapter::new(client.clone(), store.clone(), config)),
            video: Arc::new(VideoAdapter::new(client, store.clone(), config)),
            store,
        })
    }
}

/// Register every adapter with a registry
pub fn register_all(registry: &mut AdapterRegistry, adapters: &Adapters) {
    registry.register(adapters.tts.clone());
    registry.register(adapters.image.clone());
    registry.register(adapters.video.clone());
}

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Gateway settings, read from the process environment (and `.env`).
///
/// Every key is optional; an empty `GEMINI_API_KEY` makes every provider
/// call fail with an authentication error.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub gemini_api_key: String,
    #[serde(default = "default_base_url")]
    pub gemini_base_url: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub ffmpeg_path: Option<String>,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
    #[serde(default = "default_imagen_model")]
    pub imagen_model: String,
    #[serde(default = "default_imagen_sample_count")]
    pub imagen_sample_count: u32,
    #[serde(default = "default_veo_model")]
    pub veo_model: String,
    #[serde(default = "default_veo_aspect_ratio")]
    pub veo_aspect_ratio: String,
    #[serde(default = "default_veo_person_generation")]
    pub veo_person_generation: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_video_poll_interval_ms")]
    pub video_poll_interval_ms: u64,
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}

fn default_tts_voice() -> String {
    "Kore".to_string()
}

fn default_imagen_model() -> String {
    "imagen-3.0-generate-002".to_string()
}

fn default_imagen_sample_count() -> u32 {
    1
}

fn default_veo_model() -> String {
    "veo-3.0-generate-preview".to_string()
}

fn default_veo_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_veo_person_generation() -> String {
    "allow_all".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_video_poll_interval_ms() -> u64 {
    5000
}

fn default_media_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

impl GatewayConfig {
    /// Load `.env` if present, then read the environment
    pub fn from_env() -> Result<Self, envy::Error> {
        if let Err(e) = dotenv::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        envy::from_env()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn video_poll_interval(&self) -> Duration {
        Duration::from_millis(self.video_poll_interval_ms)
    }

    pub fn ffmpeg(&self) -> &str {
        self.ffmpeg_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or("ffmpeg")
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_base_url: default_base_url(),
            proxy_url: None,
            ffmpeg_path: None,
            tts_model: default_tts_model(),
            tts_voice: default_tts_voice(),
            imagen_model: default_imagen_model(),
            imagen_sample_count: default_imagen_sample_count(),
            veo_model: default_veo_model(),
            veo_aspect_ratio: default_veo_aspect_ratio(),
            veo_person_generation: default_veo_person_generation(),
            request_timeout_secs: default_request_timeout_secs(),
            video_poll_interval_ms: default_video_poll_interval_ms(),
            media_root: default_media_root(),
            bind_address: default_bind_address(),
        }
    }
}

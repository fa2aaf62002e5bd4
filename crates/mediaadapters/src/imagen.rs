use crate::client::GeminiClient;
use crate::config::GatewayConfig;
use crate::storage::{timestamped_name, MediaKind, MediaStore};
use async_trait::async_trait;
use base64::Engine;
use mediacore::{
    AdapterError, GenerationAdapter, GenerationResult, ImageRequest, StepConfig, StepContext,
    StepKind,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;

const ASPECT_RATIOS: &[&str] = &["1:1", "9:16", "16:9", "4:3", "3:4", "3:2", "2:3"];

pub(crate) const PERSON_GENERATION: &[&str] = &["dont_allow", "allow_adult", "allow_all"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters<'a> {
    sample_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    person_generation: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

/// Decoded images from one `:predict` call
#[derive(Debug, Clone)]
pub struct GeneratedImages {
    pub images: Vec<Vec<u8>>,
    pub prompt: String,
}

/// Image generation adapter
pub struct ImageAdapter {
    client: GeminiClient,
    store: MediaStore,
    model: String,
    sample_count: u32,
}

impl ImageAdapter {
    pub fn new(client: GeminiClient, store: MediaStore, config: &GatewayConfig) -> Self {
        Self {
            client,
            store,
            model: config.imagen_model.clone(),
            sample_count: config.imagen_sample_count,
        }
    }

    pub fn aspect_ratios(&self) -> &'static [&'static str] {
        ASPECT_RATIOS
    }

    pub fn person_generation_options(&self) -> &'static [&'static str] {
        PERSON_GENERATION
    }

    pub fn build_request_body(&self, request: &ImageRequest) -> Value {
        let parameters = PredictParameters {
            sample_count: request.sample_count.unwrap_or(self.sample_count),
            aspect_ratio: request.aspect_ratio.as_deref(),
            person_generation: request.person_generation.as_deref(),
            negative_prompt: request.negative_prompt.as_deref(),
            seed: request.seed,
        };

        json!({
            "instances": [{ "prompt": request.prompt }],
            "parameters": parameters
        })
    }

    pub async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImages, AdapterError> {
        if request.prompt.trim().is_empty() {
            return Err(AdapterError::InvalidInput("Prompt is required".to_string()));
        }

        tracing::info!(
            "Imagen request: model={} aspect_ratio={:?} samples={}",
            self.model,
            request.aspect_ratio,
            request.sample_count.unwrap_or(self.sample_count)
        );

        let url = self.client.model_url(&self.model, "predict");
        let response = self.client.post_json(&url, &self.build_request_body(request)).await?;
        let images = parse_predictions(&response)?;

        tracing::info!("Imagen returned {} image(s)", images.len());
        Ok(GeneratedImages {
            images,
            prompt: request.prompt.clone(),
        })
    }

    /// Write the first image as `imagen_<millis>_<suffix>.png`
    pub async fn save_first(&self, generated: &GeneratedImages) -> Result<PathBuf, AdapterError> {
        let bytes = generated
            .images
            .first()
            .ok_or_else(|| AdapterError::malformed("No images generated"))?;

        let filename = timestamped_name("imagen", "png");
        Ok(self.store.save(MediaKind::Image, &filename, bytes).await?)
    }
}

#[async_trait]
impl GenerationAdapter for ImageAdapter {
    fn kind(&self) -> StepKind {
        StepKind::Image
    }

    async fn execute(&self, ctx: StepContext) -> Result<GenerationResult, AdapterError> {
        let StepConfig::Image(request) = &ctx.config else {
            return Err(ctx.mismatched(StepKind::Image));
        };

        let generated = self.generate(request).await?;
        if generated.images.len() > 1 {
            ctx.events.warn(format!(
                "{} images generated, keeping the first",
                generated.images.len()
            ));
        }
        let file_path = self.save_first(&generated).await?;
        ctx.events.info(format!("Image saved to {}", file_path.display()));

        Ok(GenerationResult::Image {
            file_path,
            prompt: generated.prompt,
        })
    }
}

/// Decode every `bytesBase64Encoded` prediction; none at all is an upstream failure
pub fn parse_predictions(value: &Value) -> Result<Vec<Vec<u8>>, AdapterError> {
    let predictions = value["predictions"]
        .as_array()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AdapterError::malformed("No images generated"))?;

    let engine = base64::engine::general_purpose::STANDARD;
    let mut images = Vec::with_capacity(predictions.len());
    for prediction in predictions {
        let Some(encoded) = prediction["bytesBase64Encoded"].as_str() else {
            tracing::warn!("Skipping prediction without image bytes");
            continue;
        };
        let bytes = engine
            .decode(encoded)
            .map_err(|e| AdapterError::malformed(format!("Invalid image payload: {}", e)))?;
        images.push(bytes);
    }

    if images.is_empty() {
        return Err(AdapterError::malformed("No images generated"));
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ImageAdapter {
        let config = GatewayConfig::default();
        let client = GeminiClient::new(&config).unwrap();
        ImageAdapter::new(client, MediaStore::new("."), &config)
    }

    #[test]
    fn body_omits_unset_parameters() {
        let body = adapter().build_request_body(&ImageRequest::new("a red fox").with_aspect_ratio("16:9"));
        assert_eq!(body["instances"][0]["prompt"], "a red fox");
        assert_eq!(body["parameters"]["sampleCount"], 1);
        assert_eq!(body["parameters"]["aspectRatio"], "16:9");
        assert!(body["parameters"].get("seed").is_none());
        assert!(body["parameters"].get("negativePrompt").is_none());
    }

    #[test]
    fn empty_predictions_are_an_upstream_error() {
        let err = parse_predictions(&json!({"predictions": []})).unwrap_err();
        assert!(matches!(err, AdapterError::Upstream { .. }));
        assert!(err.to_string().contains("No images generated"));

        assert!(parse_predictions(&json!({})).is_err());
    }

    #[test]
    fn decodes_predictions() {
        let images = parse_predictions(&json!({
            "predictions": [
                {"bytesBase64Encoded": "iVBORw==", "mimeType": "image/png"},
                {"bytesBase64Encoded": "AQI="}
            ]
        }))
        .unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1], vec![1, 2]);
    }

    #[test]
    fn option_lists() {
        let a = adapter();
        assert_eq!(a.aspect_ratios().len(), 7);
        assert_eq!(a.person_generation_options(), &["dont_allow", "allow_adult", "allow_all"]);
    }
}

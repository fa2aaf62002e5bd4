use crate::client::GeminiClient;
use crate::config::GatewayConfig;
use crate::imagen::PERSON_GENERATION;
use crate::storage::{timestamped_name, MediaKind, MediaStore};
use async_trait::async_trait;
use mediacore::{
    AdapterError, GenerationAdapter, GenerationResult, StepConfig, StepContext, StepKind,
    VideoRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

const ASPECT_RATIOS: &[&str] = &["16:9", "9:16", "1:1", "4:3", "3:4", "21:9", "9:21"];
const DURATIONS: &[u32] = &[2, 3, 4, 5, 6, 7, 8];

/// One attempt plus three retries
const DOWNLOAD_ATTEMPTS: u32 = 4;
const DOWNLOAD_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Snapshot of a long-running video operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOperation {
    pub operation_name: String,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VideoOperation {
    fn new(operation_name: &str, status: OperationStatus) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            status,
            video_uri: None,
            error: None,
        }
    }

    /// Last path segment of the operation name
    pub fn operation_id(&self) -> &str {
        operation_id(&self.operation_name)
    }
}

pub fn operation_id(operation_name: &str) -> &str {
    operation_name
        .rsplit('/')
        .next()
        .unwrap_or(operation_name)
}

/// Video generation adapter over the long-running `predictLongRunning` API
pub struct VideoAdapter {
    client: GeminiClient,
    store: MediaStore,
    model: String,
    aspect_ratio: String,
    person_generation: String,
    poll_interval: Duration,
    retry_delay: Duration,
}

impl VideoAdapter {
    pub fn new(client: GeminiClient, store: MediaStore, config: &GatewayConfig) -> Self {
        Self {
            client,
            store,
            model: config.veo_model.clone(),
            aspect_ratio: config.veo_aspect_ratio.clone(),
            person_generation: config.veo_person_generation.clone(),
            poll_interval: config.video_poll_interval(),
            retry_delay: DOWNLOAD_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn aspect_ratios(&self) -> &'static [&'static str] {
        ASPECT_RATIOS
    }

    pub fn durations(&self) -> &'static [u32] {
        DURATIONS
    }

    pub fn person_generation_options(&self) -> &'static [&'static str] {
        PERSON_GENERATION
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    pub fn build_request_body(&self, request: &VideoRequest) -> Value {
        let mut parameters = json!({
            "aspectRatio": request.aspect_ratio.as_deref().unwrap_or(&self.aspect_ratio),
            "personGeneration": request.person_generation.as_deref().unwrap_or(&self.person_generation),
        });
        if let Some(seconds) = request.duration_seconds {
            parameters["durationSeconds"] = json!(seconds);
        }

        json!({
            "instances": [{ "prompt": request.prompt }],
            "parameters": parameters
        })
    }

    /// Start a generation; the returned operation is always `pending`
    pub async fn submit(&self, request: &VideoRequest) -> Result<VideoOperation, AdapterError> {
        if request.prompt.trim().is_empty() {
            return Err(AdapterError::InvalidInput("Prompt is required".to_string()));
        }

        tracing::info!(
            "Veo request: model={} aspect_ratio={}",
            self.model,
            request.aspect_ratio.as_deref().unwrap_or(&self.aspect_ratio)
        );

        let url = self.client.model_url(&self.model, "predictLongRunning");
        let response = self.client.post_json(&url, &self.build_request_body(request)).await?;

        let name = response["name"]
            .as_str()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AdapterError::malformed("No operation name returned"))?;

        tracing::info!("Video operation started: {}", name);
        Ok(VideoOperation::new(name, OperationStatus::Pending))
    }

    pub async fn check_status(&self, operation_name: &str) -> Result<VideoOperation, AdapterError> {
        if operation_name.trim().is_empty() {
            return Err(AdapterError::InvalidInput("Operation name is required".to_string()));
        }

        let response = self.client.get_json(&self.client.resource_url(operation_name)).await?;
        let operation = parse_operation(operation_name, &response)?;
        tracing::debug!("Operation {} is {:?}", operation_name, operation.status);
        Ok(operation)
    }

    /// Poll until the operation completes or fails. There is no attempt limit.
    pub async fn wait_for_completion(
        &self,
        operation_name: &str,
        interval: Duration,
    ) -> Result<VideoOperation, AdapterError> {
        loop {
            let operation = self.check_status(operation_name).await?;
            match operation.status {
                OperationStatus::Completed => return Ok(operation),
                OperationStatus::Failed => {
                    let message = operation
                        .error
                        .unwrap_or_else(|| "Video generation failed".to_string());
                    return Err(AdapterError::malformed(message));
                }
                OperationStatus::Pending | OperationStatus::Running => {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    /// Download a finished video into the videos directory.
    ///
    /// Retried three times after the first attempt; an empty body counts as a failure.
    pub async fn download(&self, uri: &str, filename: &str) -> Result<PathBuf, AdapterError> {
        let mut last_error = None;

        for attempt in 1..=DOWNLOAD_ATTEMPTS {
            tracing::info!("Downloading video {} (attempt {}/{})", filename, attempt, DOWNLOAD_ATTEMPTS);

            match self.client.download(uri).await {
                Ok(bytes) if !bytes.is_empty() => {
                    return Ok(self.store.save(MediaKind::Video, filename, &bytes).await?);
                }
                Ok(_) => {
                    tracing::warn!("Downloaded video {} is empty", filename);
                    last_error = Some(AdapterError::malformed("Downloaded file is empty"));
                }
                Err(e) => {
                    tracing::warn!("Video download failed: {}", e);
                    last_error = Some(e);
                }
            }

            if attempt < DOWNLOAD_ATTEMPTS {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(AdapterError::malformed(format!("Download failed after retries: {}", cause)))
    }

    /// Reuse a video already saved for this operation, otherwise download it as
    /// `veo_<operationId>_<millis>_<suffix>.mp4`
    pub async fn ensure_downloaded(&self, operation: &VideoOperation) -> Result<PathBuf, AdapterError> {
        let id = operation.operation_id();
        let prefix = format!("veo_{}_", id);
        if let Some(existing) = self.store.find_with_prefix(MediaKind::Video, &prefix).await? {
            tracing::debug!("Video for {} already at {}", id, existing.display());
            return Ok(existing);
        }

        let uri = operation
            .video_uri
            .as_deref()
            .ok_or_else(|| AdapterError::malformed("No video URI found in response"))?;
        let filename = timestamped_name(&format!("veo_{}", id), "mp4");
        self.download(uri, &filename).await
    }
}

#[async_trait]
impl GenerationAdapter for VideoAdapter {
    fn kind(&self) -> StepKind {
        StepKind::Video
    }

    async fn execute(&self, ctx: StepContext) -> Result<GenerationResult, AdapterError> {
        let StepConfig::Video(request) = &ctx.config else {
            return Err(ctx.mismatched(StepKind::Video));
        };

        let submitted = self.submit(request).await?;
        ctx.events.progress(format!("Video operation {} submitted", submitted.operation_name));

        let finished = self
            .wait_for_completion(&submitted.operation_name, self.poll_interval)
            .await?;
        let uri = finished
            .video_uri
            .as_deref()
            .ok_or_else(|| AdapterError::malformed("No video URI found in response"))?;

        let file_path = self.download(uri, &timestamped_name("veo", "mp4")).await?;
        ctx.events.info(format!("Video saved to {}", file_path.display()));

        Ok(GenerationResult::Video {
            file_path,
            operation_name: submitted.operation_name,
        })
    }
}

/// Interpret an operation resource returned by `GET {base}/{operationName}`
pub fn parse_operation(operation_name: &str, value: &Value) -> Result<VideoOperation, AdapterError> {
    if !value["done"].as_bool().unwrap_or(false) {
        return Ok(VideoOperation::new(operation_name, OperationStatus::Running));
    }

    if !value["error"].is_null() {
        let mut failed = VideoOperation::new(operation_name, OperationStatus::Failed);
        failed.error = Some(
            value["error"]["message"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string(),
        );
        return Ok(failed);
    }

    let response = &value["response"];
    let samples = &response["generateVideoResponse"]["generatedSamples"];
    let uri = if samples.is_array() {
        let first = &samples[0];
        first["video"]["uri"]
            .as_str()
            .or_else(|| first["videoUri"].as_str())
            .or_else(|| first["uri"].as_str())
    } else {
        let first = &response["predictions"][0];
        first["videoUri"]
            .as_str()
            .or_else(|| first["uri"].as_str())
            .or_else(|| first["url"].as_str())
    };

    let uri = uri.ok_or_else(|| AdapterError::malformed("No video URI found in response"))?;
    let mut completed = VideoOperation::new(operation_name, OperationStatus::Completed);
    completed.video_uri = Some(uri.to_string());
    Ok(completed)
}

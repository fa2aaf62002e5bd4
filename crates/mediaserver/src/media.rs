use crate::{success, ApiError, AppState};
use actix_files::NamedFile;
use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, post, web, HttpResponse};
use mediaadapters::{MediaKind, OperationStatus, VideoOperation};
use mediacore::{ImageRequest, TtsRequest, VideoRequest};
use serde::Serialize;
use serde_json::json;
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    file_path: String,
    prompt: String,
    image_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatusResponse {
    #[serde(flatten)]
    operation: VideoOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<String>,
}

/// Synthesize speech and answer with the audio bytes
#[post("/api/ai/tts")]
async fn synthesize(
    data: web::Data<AppState>,
    request: web::Json<TtsRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    let tts = &data.adapters.tts;

    let audio = tts.synthesize(&request).await?;
    let saved = tts.save(&audio).await?;
    let bytes = tokio::fs::read(&saved.path).await?;

    info!("TTS audio ready: {} ({} bytes)", saved.filename, bytes.len());
    Ok(HttpResponse::Ok()
        .content_type(saved.content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", saved.filename),
        ))
        .body(bytes))
}

#[get("/api/ai/tts/voices")]
async fn list_voices(data: web::Data<AppState>) -> HttpResponse {
    success(data.adapters.tts.voices())
}

#[get("/api/ai/tts/audios")]
async fn list_audios(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(success(data.adapters.store.list(MediaKind::Audio).await?))
}

/// Generate images and keep the first one
#[post("/api/ai/imagen")]
async fn generate_image(
    data: web::Data<AppState>,
    request: web::Json<ImageRequest>,
) -> Result<HttpResponse, ApiError> {
    let image = &data.adapters.image;

    let generated = image.generate(&request).await?;
    let path = image.save_first(&generated).await?;

    Ok(success(ImageResponse {
        file_path: path.display().to_string(),
        prompt: generated.prompt,
        image_count: generated.images.len(),
    }))
}

#[get("/api/ai/imagen/options")]
async fn image_options(data: web::Data<AppState>) -> HttpResponse {
    let image = &data.adapters.image;
    success(json!({
        "aspectRatios": image.aspect_ratios(),
        "personGenerationOptions": image.person_generation_options(),
    }))
}

#[get("/api/ai/imagen/images")]
async fn list_images(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(success(data.adapters.store.list(MediaKind::Image).await?))
}

/// Start a video generation; clients poll the status route
#[post("/api/ai/veo")]
async fn submit_video(
    data: web::Data<AppState>,
    request: web::Json<VideoRequest>,
) -> Result<HttpResponse, ApiError> {
    let operation = data.adapters.video.submit(&request).await?;
    Ok(success(operation))
}

/// Poll an operation. The first `completed` observation downloads the video;
/// later polls reuse the file saved under the operation id.
#[get("/api/ai/veo/status/{name:.*}")]
async fn video_status(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let name = path.into_inner();
    let video = &data.adapters.video;
    let operation = video.check_status(&name).await?;

    if operation.status != OperationStatus::Completed || operation.video_uri.is_none() {
        return Ok(success(VideoStatusResponse {
            operation,
            file_path: None,
            video_url: None,
        }));
    }

    let file_path = video.ensure_downloaded(&operation).await?;
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(success(VideoStatusResponse {
        operation,
        file_path: Some(file_path.display().to_string()),
        video_url: Some(format!("/videos/{}", file_name)),
    }))
}

#[get("/api/ai/veo/options")]
async fn video_options(data: web::Data<AppState>) -> HttpResponse {
    let video = &data.adapters.video;
    success(json!({
        "aspectRatios": video.aspect_ratios(),
        "durationOptions": video.durations(),
        "personGenerationOptions": video.person_generation_options(),
    }))
}

#[get("/api/ai/veo/videos")]
async fn list_videos(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(success(data.adapters.store.list(MediaKind::Video).await?))
}

#[get("/api/ai/veo/videos/{filename}")]
async fn download_video(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<NamedFile, ApiError> {
    let filename = path.into_inner();
    let file = open_media(&data, MediaKind::Video, &filename).await?;
    Ok(file.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    }))
}

#[get("/audio/{filename}")]
async fn static_audio(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<NamedFile, ApiError> {
    open_media(&data, MediaKind::Audio, &path.into_inner()).await
}

#[get("/images/{filename}")]
async fn static_image(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<NamedFile, ApiError> {
    open_media(&data, MediaKind::Image, &path.into_inner()).await
}

#[get("/videos/{filename}")]
async fn static_video(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<NamedFile, ApiError> {
    open_media(&data, MediaKind::Video, &path.into_inner()).await
}

/// Open a stored file for streaming; range and conditional requests are answered by `NamedFile`
async fn open_media(data: &AppState, kind: MediaKind, filename: &str) -> Result<NamedFile, ApiError> {
    let path = data
        .adapters
        .store
        .resolve(kind, filename)
        .await
        .ok_or_else(|| ApiError::not_found("File not found"))?;
    Ok(NamedFile::open_async(path).await?)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(synthesize)
        .service(list_voices)
        .service(list_audios)
        .service(generate_image)
        .service(image_options)
        .service(list_images)
        .service(submit_video)
        .service(video_status)
        .service(video_options)
        .service(list_videos)
        .service(download_video)
        .service(static_audio)
        .service(static_image)
        .service(static_video);
}

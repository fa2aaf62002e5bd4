// crates/mediaadapters/tests/upstream_test.rs

use actix_web::{http::Method, web, App, HttpRequest, HttpResponse, HttpServer};
use mediaadapters::{
    Adapters, GatewayConfig, MediaKind, OperationStatus, VideoOperation,
};
use mediacore::{
    AdapterError, ErrorKind, EventBus, EventEmitter, ExecutionEvent, ExecutionStatus,
    GenerationAdapter, GenerationResult, ImageRequest, StepConfig, StepContext, StepEvent,
    TtsRequest, VideoRequest, WorkflowDefinition, WorkflowStep,
};
use mediaruntime::{AdapterRegistry, MediaRuntime, RuntimeConfig};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Start a provider double that answers every request with `status` and `body`
fn fake_provider(status: u16, body: Value) -> SocketAddr {
    let server = HttpServer::new(move || {
        let body = body.clone();
        App::new().default_service(web::to(move || {
            let body = body.clone();
            async move {
                let code = actix_web::http::StatusCode::from_u16(status).unwrap();
                HttpResponse::build(code).json(body)
            }
        }))
    })
    .workers(1)
    .bind("127.0.0.1:0")
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

/// File host whose first `empty_responses` answers carry no bytes
fn fake_file_host(empty_responses: usize, hits: Arc<AtomicUsize>) -> SocketAddr {
    let server = HttpServer::new(move || {
        let hits = hits.clone();
        App::new().default_service(web::to(move || {
            let hits = hits.clone();
            async move {
                let n = hits.fetch_add(1, Ordering::SeqCst);
                if n < empty_responses {
                    HttpResponse::Ok().body(Vec::<u8>::new())
                } else {
                    HttpResponse::Ok().content_type("video/mp4").body(b"fake-mp4".to_vec())
                }
            }
        }))
    })
    .workers(1)
    .bind("127.0.0.1:0")
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

const OPERATION: &str = "models/veo/operations/op5";

/// Video provider double: answers submits with `OPERATION`, reports it unfinished
/// for the first `pending_polls` polls and then answers with `outcome`
fn fake_video_provider(pending_polls: usize, outcome: Value, polls: Arc<AtomicUsize>) -> SocketAddr {
    let server = HttpServer::new(move || {
        let polls = polls.clone();
        let outcome = outcome.clone();
        App::new().default_service(web::to(move |req: HttpRequest| {
            let polls = polls.clone();
            let outcome = outcome.clone();
            async move {
                if *req.method() == Method::POST {
                    return HttpResponse::Ok().json(json!({"name": OPERATION}));
                }
                if polls.fetch_add(1, Ordering::SeqCst) < pending_polls {
                    HttpResponse::Ok().json(json!({"name": OPERATION, "done": false}))
                } else {
                    HttpResponse::Ok().json(outcome)
                }
            }
        }))
    })
    .workers(1)
    .bind("127.0.0.1:0")
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

fn config_for(addr: SocketAddr, root: &std::path::Path) -> GatewayConfig {
    GatewayConfig {
        gemini_api_key: "test-key".to_string(),
        gemini_base_url: format!("http://{}/v1beta", addr),
        ffmpeg_path: Some("mediaflow-no-such-ffmpeg".to_string()),
        media_root: root.to_path_buf(),
        request_timeout_secs: 5,
        ..GatewayConfig::default()
    }
}

fn step(id: &str, config: impl Into<StepConfig>) -> StepContext {
    StepContext::new(id, config.into(), EventEmitter::detached())
}

#[actix_web::test]
async fn tts_step_writes_wav_from_raw_pcm() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = fake_provider(
        200,
        json!({"candidates": [{"content": {"parts": [{"inlineData": {
            "mimeType": "audio/L16;codec=pcm;rate=24000",
            "data": "AAABAAIAAwA="
        }}]}}]}),
    );
    let adapters = Adapters::from_config(&config_for(addr, tmp.path())).unwrap();

    let result = adapters
        .tts
        .execute(step("narrate", TtsRequest::new("Hello world")))
        .await
        .unwrap();

    let GenerationResult::Audio { file_path, duration } = result else {
        panic!("expected audio result");
    };
    assert_eq!(duration, Some(1));
    assert!(file_path.starts_with(tmp.path().join("audio")));
    assert_eq!(file_path.extension().unwrap(), "wav");

    let bytes = tokio::fs::read(&file_path).await.unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(bytes.len(), 44 + 8);
}

#[actix_web::test]
async fn image_step_saves_first_prediction() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = fake_provider(
        200,
        json!({"predictions": [
            {"bytesBase64Encoded": "iVBORw0KGgo=", "mimeType": "image/png"},
            {"bytesBase64Encoded": "AQID"}
        ]}),
    );
    let adapters = Adapters::from_config(&config_for(addr, tmp.path())).unwrap();
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();

    let ctx = StepContext::new(
        "cover",
        ImageRequest::new("a lighthouse at dusk").into(),
        bus.create_emitter("exec_1".to_string(), "cover".to_string()),
    );
    let result = adapters.image.execute(ctx).await.unwrap();

    let mut warnings = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ExecutionEvent::StepEvent { event: StepEvent::Warning { message }, .. } = event {
            warnings.push(message);
        }
    }
    assert_eq!(warnings, vec!["2 images generated, keeping the first".to_string()]);

    let GenerationResult::Image { file_path, prompt } = result else {
        panic!("expected image result");
    };
    assert_eq!(prompt, "a lighthouse at dusk");
    let name = file_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("imagen_") && name.ends_with(".png"));
    assert_eq!(tokio::fs::read(&file_path).await.unwrap(), b"\x89PNG\r\n\x1a\n");
}

#[actix_web::test]
async fn rate_limit_is_classified_at_the_source() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = fake_provider(429, json!({"error": {"code": 429, "message": "Resource has been exhausted"}}));
    let adapters = Adapters::from_config(&config_for(addr, tmp.path())).unwrap();

    let err = adapters
        .image
        .generate(&ImageRequest::new("anything"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert!(err.to_string().contains("Resource has been exhausted"));
}

#[actix_web::test]
async fn rejected_key_is_an_auth_error() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = fake_provider(403, json!({"error": {"message": "API key not valid"}}));
    let adapters = Adapters::from_config(&config_for(addr, tmp.path())).unwrap();

    let err = adapters.tts.synthesize(&TtsRequest::new("hi")).await.unwrap_err();
    assert!(matches!(err, AdapterError::Upstream { status: Some(403), .. }));
    assert_eq!(err.kind(), ErrorKind::Auth);
}

#[actix_web::test]
async fn video_submit_returns_pending_operation() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = fake_provider(200, json!({"name": "models/veo/operations/op42"}));
    let adapters = Adapters::from_config(&config_for(addr, tmp.path())).unwrap();

    let op = adapters
        .video
        .submit(&mediacore::VideoRequest::new("surf at sunrise"))
        .await
        .unwrap();
    assert_eq!(op.operation_name, "models/veo/operations/op42");
    assert_eq!(op.status, OperationStatus::Pending);
}

#[actix_web::test]
async fn unfinished_operation_is_running_and_downloads_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = fake_provider(200, json!({"name": "models/veo/operations/op7", "done": false}));
    let adapters = Adapters::from_config(&config_for(addr, tmp.path())).unwrap();

    let op = adapters
        .video
        .check_status("models/veo/operations/op7")
        .await
        .unwrap();

    assert_eq!(op.status, OperationStatus::Running);
    assert!(op.video_uri.is_none());
    assert!(adapters.store.list(MediaKind::Video).await.unwrap().is_empty());
}

#[actix_web::test]
async fn download_retries_empty_bodies_then_caches_by_operation() {
    let tmp = tempfile::tempdir().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let files = fake_file_host(1, hits.clone());
    let provider = fake_provider(404, json!({}));

    let adapters = Adapters::from_config(&config_for(provider, tmp.path())).unwrap();
    let video = Arc::try_unwrap(adapters.video)
        .ok()
        .unwrap()
        .with_retry_delay(Duration::from_millis(10));

    let op = VideoOperation {
        operation_name: "models/veo/operations/op99".to_string(),
        status: OperationStatus::Completed,
        video_uri: Some(format!("http://{}/files/op99:download?alt=media", files)),
        error: None,
    };

    let first = video.ensure_downloaded(&op).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(first.file_name().unwrap().to_string_lossy().starts_with("veo_op99_"));
    assert_eq!(tokio::fs::read(&first).await.unwrap(), b"fake-mp4");

    let second = video.ensure_downloaded(&op).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[actix_web::test]
async fn download_gives_up_after_three_retries() {
    let tmp = tempfile::tempdir().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let files = fake_file_host(usize::MAX, hits.clone());
    let provider = fake_provider(404, json!({}));

    let adapters = Adapters::from_config(&config_for(provider, tmp.path())).unwrap();
    let video = Arc::try_unwrap(adapters.video)
        .ok()
        .unwrap()
        .with_retry_delay(Duration::from_millis(10));

    let err = video
        .download(&format!("http://{}/files/x", files), "veo_x.mp4")
        .await
        .unwrap_err();

    assert_eq!(hits.load(Ordering::SeqCst), 4);
    assert!(err.to_string().contains("Download failed after retries"));
}

#[actix_web::test]
async fn parallel_image_steps_write_separate_files() {
    let tmp = tempfile::tempdir().unwrap();
    let addr = fake_provider(
        200,
        json!({"predictions": [{"bytesBase64Encoded": "iVBORw0KGgo=", "mimeType": "image/png"}]}),
    );
    let adapters = Adapters::from_config(&config_for(addr, tmp.path())).unwrap();

    let mut registry = AdapterRegistry::new();
    mediaadapters::register_all(&mut registry, &adapters);
    let runtime = MediaRuntime::with_registry(Arc::new(registry), RuntimeConfig::default());

    for round in 0..10 {
        let workflow = WorkflowDefinition::new(format!("wf_{}", round), "Covers")
            .parallel(true)
            .with_step(WorkflowStep::new("a", ImageRequest::new("a red door")))
            .with_step(WorkflowStep::new("b", ImageRequest::new("a blue door")));

        let id = runtime.submit(workflow).await.unwrap().wait().await;
        let execution = runtime.execution(&id).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Completed);

        let a = execution.results["a"].file_path();
        let b = execution.results["b"].file_path();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }

    assert_eq!(adapters.store.list(MediaKind::Image).await.unwrap().len(), 20);
}

#[actix_web::test]
async fn video_step_polls_until_done_then_downloads() {
    let tmp = tempfile::tempdir().unwrap();
    let file_hits = Arc::new(AtomicUsize::new(0));
    let files = fake_file_host(0, file_hits.clone());
    let polls = Arc::new(AtomicUsize::new(0));
    let provider = fake_video_provider(
        2,
        json!({
            "name": OPERATION,
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": format!("http://{}/files/op5:download?alt=media", files)}}
            ]}}
        }),
        polls.clone(),
    );

    let config = GatewayConfig {
        video_poll_interval_ms: 1,
        ..config_for(provider, tmp.path())
    };
    let adapters = Adapters::from_config(&config).unwrap();

    let result = adapters
        .video
        .execute(step("clip", VideoRequest::new("surf at sunrise")))
        .await
        .unwrap();

    assert_eq!(polls.load(Ordering::SeqCst), 3);
    assert_eq!(file_hits.load(Ordering::SeqCst), 1);

    let GenerationResult::Video { file_path, operation_name } = result else {
        panic!("expected video result");
    };
    assert_eq!(operation_name, OPERATION);
    assert!(file_path.starts_with(tmp.path().join("videos")));
    assert_eq!(tokio::fs::read(&file_path).await.unwrap(), b"fake-mp4");
}

#[actix_web::test]
async fn failed_video_operation_fails_the_workflow() {
    let tmp = tempfile::tempdir().unwrap();
    let polls = Arc::new(AtomicUsize::new(0));
    let provider = fake_video_provider(
        1,
        json!({"name": OPERATION, "done": true, "error": {"code": 3, "message": "blocked by safety filter"}}),
        polls.clone(),
    );

    let config = GatewayConfig {
        video_poll_interval_ms: 1,
        ..config_for(provider, tmp.path())
    };
    let adapters = Adapters::from_config(&config).unwrap();

    let mut registry = AdapterRegistry::new();
    mediaadapters::register_all(&mut registry, &adapters);
    let runtime = MediaRuntime::with_registry(Arc::new(registry), RuntimeConfig::default());

    let workflow = WorkflowDefinition::new("wf_clip", "Clip")
        .with_step(WorkflowStep::new("clip", VideoRequest::new("surf at sunrise")));
    let id = runtime.submit(workflow).await.unwrap().wait().await;
    let execution = runtime.execution(&id).await.unwrap();

    assert_eq!(polls.load(Ordering::SeqCst), 2);
    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert!(execution.error.as_deref().unwrap().contains("blocked by safety filter"));
    assert!(execution.results.is_empty());
    assert!(adapters.store.list(MediaKind::Video).await.unwrap().is_empty());
}

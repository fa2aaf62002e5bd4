//! HTTP surface of the media gateway
//!
//! Provider proxy routes under `/api/ai/*`, the workflow API, static media
//! downloads and a WebSocket stream of execution events.

mod error;
mod media;
mod workflow;

pub use error::ApiError;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder, Result as ActixResult};
use actix_ws::Message;
use mediaadapters::Adapters;
use mediaruntime::MediaRuntime;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    pub runtime: Arc<MediaRuntime>,
    pub adapters: Adapters,
}

impl AppState {
    pub fn new(runtime: Arc<MediaRuntime>, adapters: Adapters) -> Self {
        Self { runtime, adapters }
    }
}

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

/// `{success: true, data}`
pub(crate) fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope {
        success: true,
        data,
    })
}

/// Health check endpoint
#[get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Service index
#[get("/api")]
async fn service_index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "AI Services API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "tts": "/api/ai/tts",
            "imagen": "/api/ai/imagen",
            "veo": "/api/ai/veo",
            "workflow": "/api/ai/workflow",
            "events": "/api/events"
        }
    }))
}

/// WebSocket endpoint for real-time execution events
#[get("/api/events")]
async fn websocket_events(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    info!("WebSocket client connected");
    let mut events = data.runtime.subscribe_events();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if let Ok(json) = serde_json::to_string(&event) {
                                if session.text(json).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("WebSocket client lagged, {} events skipped", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }

                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }

                else => break,
            }
        }

        info!("WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}

/// Fallback for unmatched routes
pub async fn route_not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "success": false,
        "error": "Route not found",
        "code": "NOT_FOUND",
        "path": req.path(),
        "method": req.method().as_str(),
    }))
}

/// Register every route plus JSON extractor settings
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(10 * 1024 * 1024)
            .error_handler(|err, _req| ApiError::invalid(err.to_string()).into()),
    )
    .service(health_check)
    .service(service_index)
    .service(websocket_events)
    .configure(media::configure)
    .configure(workflow::configure);
}

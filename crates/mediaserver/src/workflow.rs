use crate::{success, ApiError, AppState};
use actix_web::{get, post, web, HttpResponse};
use mediacore::WorkflowDefinition;
use mediaruntime::sample_workflows;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    execution_id: String,
    message: &'static str,
}

/// Submit a workflow definition; execution continues in the background
#[post("/api/ai/workflow")]
async fn submit_workflow(
    data: web::Data<AppState>,
    definition: web::Json<WorkflowDefinition>,
) -> Result<HttpResponse, ApiError> {
    let definition = definition.into_inner();
    info!(
        "Submitting workflow: {} ({} steps, parallel={})",
        definition.id,
        definition.steps.len(),
        definition.parallel
    );

    let handle = data.runtime.submit(definition).await?;

    Ok(success(SubmitResponse {
        execution_id: handle.execution_id,
        message: "Workflow execution started",
    }))
}

#[get("/api/ai/workflow/templates")]
async fn list_templates() -> HttpResponse {
    success(sample_workflows())
}

#[get("/api/ai/workflow")]
async fn list_executions(data: web::Data<AppState>) -> HttpResponse {
    success(data.runtime.list_executions().await)
}

#[get("/api/ai/workflow/{id}")]
async fn get_execution(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let execution = data.runtime.execution(&path.into_inner()).await?;
    Ok(success(execution))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // templates before {id}
    cfg.service(list_templates)
        .service(submit_workflow)
        .service(list_executions)
        .service(get_execution);
}

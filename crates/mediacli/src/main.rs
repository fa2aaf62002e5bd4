// crates/mediacli/src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mediaadapters::{Adapters, GatewayConfig};
use mediacore::{ExecutionEvent, ExecutionStatus, StepEvent, WorkflowDefinition};
use mediaruntime::{
    check_dependencies, sample_workflows, templates::find_template, AdapterRegistry, MediaRuntime,
    RuntimeConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mediaflow")]
#[command(about = "Media generation workflow CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List built-in workflow templates
    Templates {
        /// Print full definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a template to disk
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,

        /// Template id
        #[arg(short, long, default_value = "simple_tts")]
        template: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, verbose } => {
            let default_level = if verbose { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
                )
                .init();

            run_workflow(&file).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(&file)?;
        }

        Commands::Templates { json } => {
            list_templates(json)?;
        }

        Commands::Init { output, template } => {
            create_workflow_file(&output, &template)?;
        }
    }

    Ok(())
}

fn load_workflow(file: &Path) -> Result<WorkflowDefinition> {
    let workflow_json = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let workflow: WorkflowDefinition = serde_json::from_str(&workflow_json)
        .with_context(|| format!("parsing {}", file.display()))?;
    Ok(workflow)
}

async fn run_workflow(file: &Path) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let workflow = load_workflow(file)?;

    println!("📋 Workflow: {}", workflow.name);
    println!("   Steps: {}", workflow.steps.len());
    println!("   Mode: {}", if workflow.parallel { "parallel" } else { "sequential" });
    println!();

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    let adapters = Adapters::from_config(&config)?;
    adapters.store.ensure_dirs().await?;

    let mut registry = AdapterRegistry::new();
    mediaadapters::register_all(&mut registry, &adapters);
    tracing::debug!("Adapters registered: {:?}", registry.list_kinds());
    let runtime = MediaRuntime::with_registry(Arc::new(registry), RuntimeConfig::default());

    // Subscribe before submitting so the start event is not missed
    let mut events = runtime.subscribe_events();

    let handle = runtime.submit(workflow).await?;
    let execution_id = handle.execution_id.clone();

    let watched = execution_id.clone();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if print_event(&watched, event) {
                break;
            }
        }
    });

    handle.wait().await;
    if tokio::time::timeout(Duration::from_millis(500), event_task).await.is_err() {
        tracing::debug!("Event printer did not see the completion event");
    }

    let execution = runtime.execution(&execution_id).await?;

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", execution.id);
    println!("   Status: {:?}", execution.status);
    if let Some(end) = execution.end_time {
        println!("   Duration: {}ms", (end - execution.start_time).num_milliseconds());
    }

    if !execution.results.is_empty() {
        println!();
        println!("📤 Results:");
        let mut keys: Vec<_> = execution.results.keys().collect();
        keys.sort();
        for key in keys {
            let result = &execution.results[key];
            println!("   {} ({}): {}", key, result.kind(), result.file_path().display());
        }
    }

    if execution.status == ExecutionStatus::Failed {
        bail!(
            "workflow failed: {}",
            execution.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

/// Print one event; true once the watched execution has finished
fn print_event(execution_id: &str, event: ExecutionEvent) -> bool {
    match event {
        ExecutionEvent::WorkflowStarted { parallel, .. } => {
            println!("▶️  Workflow started ({})", if parallel { "parallel" } else { "sequential" });
        }
        ExecutionEvent::StepStarted { step_id, kind, .. } => {
            println!("  ⚡ Starting step: {} ({})", step_id, kind);
        }
        ExecutionEvent::StepCompleted { step_id, file_path, duration_ms, .. } => {
            println!("  ✅ Step {} completed in {}ms -> {}", step_id, duration_ms, file_path);
        }
        ExecutionEvent::StepFailed { step_id, error, .. } => {
            println!("  ❌ Step {} failed: {}", step_id, error);
        }
        ExecutionEvent::StepEvent { step_id, event, .. } => match event {
            StepEvent::Info { message } => println!("     ℹ️  [{}] {}", step_id, message),
            StepEvent::Warning { message } => println!("     ⚠️  [{}] {}", step_id, message),
            StepEvent::Progress { message } => println!("     📊 [{}] {}", step_id, message),
        },
        ExecutionEvent::WorkflowCompleted {
            execution_id: finished,
            status,
            error,
            duration_ms,
            ..
        } => {
            if status == ExecutionStatus::Completed {
                println!("✨ Workflow completed successfully in {}ms", duration_ms);
            } else {
                println!(
                    "💥 Workflow failed after {}ms: {}",
                    duration_ms,
                    error.unwrap_or_default()
                );
            }
            return finished == execution_id;
        }
    }
    false
}

fn validate_workflow(file: &Path) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let workflow = load_workflow(file)?;
    if workflow.steps.is_empty() {
        bail!("workflow {} has no steps", workflow.id);
    }

    let issues = check_dependencies(&workflow);
    if !issues.is_empty() {
        println!("❌ Found {} problem(s):", issues.len());
        for issue in &issues {
            println!("   • {}", issue);
        }
        bail!("workflow {} is not runnable as declared", workflow.id);
    }

    println!("✅ Workflow is valid:");
    println!("   Name: {}", workflow.name);
    println!("   Steps: {}", workflow.steps.len());
    for step in &workflow.steps {
        if step.depends_on.is_empty() {
            println!("     • {} ({})", step.id, step.kind());
        } else {
            println!("     • {} ({}) after {}", step.id, step.kind(), step.depends_on.join(", "));
        }
    }

    Ok(())
}

fn list_templates(json: bool) -> Result<()> {
    let templates = sample_workflows();

    if json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    println!("📦 Built-in Templates:");
    println!();
    for template in &templates {
        let mode = if template.parallel { ", parallel" } else { "" };
        println!("  • {} ({} steps{})", template.id, template.steps.len(), mode);
        println!("    {}", template.description.as_deref().unwrap_or(&template.name));
    }

    Ok(())
}

fn create_workflow_file(output: &Path, template: &str) -> Result<()> {
    let Some(workflow) = find_template(template) else {
        let known: Vec<String> = sample_workflows().into_iter().map(|t| t.id).collect();
        bail!("unknown template {} (available: {})", template, known.join(", "));
    };

    let json = serde_json::to_string_pretty(&workflow)?;
    std::fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;

    println!("✨ Created workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  GEMINI_API_KEY=... mediaflow run --file {}", output.display());

    Ok(())
}

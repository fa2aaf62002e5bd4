use crate::registry::AdapterRegistry;
use crate::store::ExecutionRegistry;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use mediacore::{
    generate_execution_id, EventBus, ExecutionEvent, ExecutionId, ExecutionStatus,
    GenerationResult, StepContext, WorkflowDefinition, WorkflowError, WorkflowExecution,
    WorkflowStep,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Runs workflow definitions against the registered adapters.
///
/// Each submission becomes a spawned task; the caller gets the execution id
/// back before any step has started.
#[derive(Clone)]
pub struct WorkflowEngine {
    adapters: Arc<AdapterRegistry>,
    executions: Arc<ExecutionRegistry>,
    event_bus: Arc<EventBus>,
}

impl WorkflowEngine {
    pub fn new(
        adapters: Arc<AdapterRegistry>,
        executions: Arc<ExecutionRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            adapters,
            executions,
            event_bus,
        }
    }

    /// Register a pending execution and start processing it in the background
    pub async fn submit(
        &self,
        definition: WorkflowDefinition,
    ) -> Result<ExecutionHandle, WorkflowError> {
        if definition.steps.is_empty() {
            return Err(WorkflowError::EmptyWorkflow);
        }

        let execution_id = generate_execution_id();
        self.executions
            .create(WorkflowExecution::new(execution_id.clone(), definition.id.clone()))
            .await;

        tracing::info!(
            "Accepted workflow {} as execution {} ({} steps, parallel={})",
            definition.id,
            execution_id,
            definition.steps.len(),
            definition.parallel
        );

        let engine = self.clone();
        let id = execution_id.clone();
        let task = tokio::spawn(async move {
            let worker = engine.clone();
            let worker_id = id.clone();
            let run = tokio::spawn(async move { worker.run(&worker_id, &definition).await });

            if let Err(e) = run.await {
                let err = WorkflowError::Join(e.to_string());
                tracing::error!("Execution {} aborted: {}", id, err);
                engine.executions.fail(&id, err.to_string(), err.kind()).await;
            }
        });

        Ok(ExecutionHandle { execution_id, task })
    }

    async fn run(&self, execution_id: &str, definition: &WorkflowDefinition) {
        let start_time = Instant::now();
        self.executions.mark_running(execution_id).await;

        self.event_bus.emit(ExecutionEvent::WorkflowStarted {
            execution_id: execution_id.to_string(),
            workflow_id: definition.id.clone(),
            parallel: definition.parallel,
            timestamp: Utc::now(),
        });

        let outcome = if definition.parallel {
            self.run_parallel(execution_id, definition).await
        } else {
            self.run_sequential(execution_id, definition).await
        };

        let (status, error) = match outcome {
            Ok(()) => {
                tracing::info!("Execution {} completed", execution_id);
                self.executions.complete(execution_id).await;
                (ExecutionStatus::Completed, None)
            }
            Err(e) => {
                tracing::error!("Execution {} failed: {}", execution_id, e);
                let message = e.to_string();
                self.executions.fail(execution_id, message.clone(), e.kind()).await;
                (ExecutionStatus::Failed, Some(message))
            }
        };

        self.event_bus.emit(ExecutionEvent::WorkflowCompleted {
            execution_id: execution_id.to_string(),
            status,
            error,
            duration_ms: start_time.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });
    }

    /// Declaration order, gated on which steps have already run.
    ///
    /// The gate checks ordering only: a step id enters `executed` once its
    /// adapter call returns, and a failed call ends the run before that.
    async fn run_sequential(
        &self,
        execution_id: &str,
        definition: &WorkflowDefinition,
    ) -> Result<(), WorkflowError> {
        let mut executed: HashSet<&str> = HashSet::new();

        for step in &definition.steps {
            if let Some(missing) = step
                .depends_on
                .iter()
                .find(|dep| !executed.contains(dep.as_str()))
            {
                return Err(WorkflowError::DependencyNotExecuted {
                    dependency: missing.clone(),
                    step: step.id.clone(),
                });
            }

            self.execute_step(execution_id, step).await?;
            executed.insert(step.id.as_str());
        }

        Ok(())
    }

    /// All steps at once; the first failure wins and drops the rest
    async fn run_parallel(
        &self,
        execution_id: &str,
        definition: &WorkflowDefinition,
    ) -> Result<(), WorkflowError> {
        let mut running: FuturesUnordered<_> = definition
            .steps
            .iter()
            .map(|step| self.execute_step(execution_id, step))
            .collect();

        while let Some(result) = running.next().await {
            result?;
        }

        Ok(())
    }

    async fn execute_step(
        &self,
        execution_id: &str,
        step: &WorkflowStep,
    ) -> Result<GenerationResult, WorkflowError> {
        let adapter = self.adapters.get(step.kind())?;

        self.event_bus.emit(ExecutionEvent::StepStarted {
            execution_id: execution_id.to_string(),
            step_id: step.id.clone(),
            kind: step.kind(),
            timestamp: Utc::now(),
        });
        tracing::debug!("Execution {}: starting {} step {}", execution_id, step.kind(), step.id);

        let ctx = StepContext::new(
            step.id.clone(),
            step.config.clone(),
            self.event_bus
                .create_emitter(execution_id.to_string(), step.id.clone()),
        );

        let start = Instant::now();
        match adapter.execute(ctx).await {
            Ok(result) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                tracing::info!("Step {} completed in {}ms", step.id, duration_ms);

                let mut keys: Vec<&str> = Vec::with_capacity(2);
                if let Some(key) = step.output_key.as_deref() {
                    keys.push(key);
                }
                keys.push(step.id.as_str());
                self.executions
                    .record_result(execution_id, &keys, &result)
                    .await;

                self.event_bus.emit(ExecutionEvent::StepCompleted {
                    execution_id: execution_id.to_string(),
                    step_id: step.id.clone(),
                    file_path: result.file_path().display().to_string(),
                    duration_ms,
                    timestamp: Utc::now(),
                });

                Ok(result)
            }
            Err(e) => {
                tracing::error!("Step {} failed: {}", step.id, e);

                self.event_bus.emit(ExecutionEvent::StepFailed {
                    execution_id: execution_id.to_string(),
                    step_id: step.id.clone(),
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });

                Err(WorkflowError::Step {
                    step: step.id.clone(),
                    source: e,
                })
            }
        }
    }
}

/// Handle for a submitted execution.
///
/// Dropping it detaches the task; there is no way to cancel an execution.
pub struct ExecutionHandle {
    pub execution_id: ExecutionId,
    task: JoinHandle<()>,
}

impl ExecutionHandle {
    /// Wait until the execution has reached a terminal status
    pub async fn wait(self) -> ExecutionId {
        if let Err(e) = self.task.await {
            tracing::error!("Execution {} supervisor failed: {}", self.execution_id, e);
        }
        self.execution_id
    }
}

use crate::{registry::AdapterRegistry, store::ExecutionRegistry, ExecutionHandle, WorkflowEngine};
use mediacore::{
    EventBus, ExecutionEvent, WorkflowDefinition, WorkflowError, WorkflowExecution,
};
use std::sync::Arc;

/// Main runtime: execution store, engine and event bus in one place
pub struct MediaRuntime {
    executions: Arc<ExecutionRegistry>,
    engine: WorkflowEngine,
    event_bus: Arc<EventBus>,
}

impl MediaRuntime {
    /// Create a runtime with no adapters registered
    pub fn new() -> Self {
        Self::with_registry(Arc::new(AdapterRegistry::new()), RuntimeConfig::default())
    }

    /// Create a new runtime with a pre-configured adapter registry
    pub fn with_registry(adapters: Arc<AdapterRegistry>, config: RuntimeConfig) -> Self {
        let executions = Arc::new(ExecutionRegistry::new());
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        let engine = WorkflowEngine::new(adapters, executions.clone(), event_bus.clone());

        Self {
            executions,
            engine,
            event_bus,
        }
    }

    /// Submit a workflow; processing continues in the background
    pub async fn submit(
        &self,
        definition: WorkflowDefinition,
    ) -> Result<ExecutionHandle, WorkflowError> {
        self.engine.submit(definition).await
    }

    pub async fn execution(&self, id: &str) -> Result<WorkflowExecution, WorkflowError> {
        self.executions
            .get(id)
            .await
            .ok_or_else(|| WorkflowError::ExecutionNotFound(id.to_string()))
    }

    pub async fn list_executions(&self) -> Vec<WorkflowExecution> {
        self.executions.list_all().await
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }
}

impl Default for MediaRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 1000,
        }
    }
}

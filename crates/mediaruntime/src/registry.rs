use mediacore::{GenerationAdapter, StepKind, WorkflowError};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available generation adapters, one per step kind
pub struct AdapterRegistry {
    adapters: HashMap<StepKind, Arc<dyn GenerationAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter, replacing any previous one for the same kind
    pub fn register(&mut self, adapter: Arc<dyn GenerationAdapter>) {
        let kind = adapter.kind();
        tracing::info!("Registering adapter: {}", kind);
        self.adapters.insert(kind, adapter);
    }

    pub fn get(&self, kind: StepKind) -> Result<Arc<dyn GenerationAdapter>, WorkflowError> {
        self.adapters
            .get(&kind)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownStepKind(kind.to_string()))
    }

    pub fn list_kinds(&self) -> Vec<StepKind> {
        let mut kinds: Vec<StepKind> = self.adapters.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

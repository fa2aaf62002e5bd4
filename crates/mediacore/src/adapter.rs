use crate::{events::EventEmitter, AdapterError, GenerationResult, StepConfig, StepId, StepKind};
use async_trait::async_trait;

/// Core trait every generation backend implements
#[async_trait]
pub trait GenerationAdapter: Send + Sync {
    /// The step kind this adapter serves
    fn kind(&self) -> StepKind;

    /// Run one generation and persist its output
    async fn execute(&self, ctx: StepContext) -> Result<GenerationResult, AdapterError>;
}

/// Execution context passed to an adapter for one step
#[derive(Clone)]
pub struct StepContext {
    pub step_id: StepId,
    pub config: StepConfig,
    pub events: EventEmitter,
}

impl StepContext {
    pub fn new(step_id: impl Into<StepId>, config: StepConfig, events: EventEmitter) -> Self {
        Self {
            step_id: step_id.into(),
            config,
            events,
        }
    }

    /// Error for an adapter handed a config of another kind
    pub fn mismatched(&self, expected: StepKind) -> AdapterError {
        AdapterError::InvalidInput(format!(
            "step {} expects {} config, got {}",
            self.step_id,
            expected,
            self.config.kind()
        ))
    }
}

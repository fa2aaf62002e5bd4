//! Core abstractions for the media gateway
//!
//! This crate provides the workflow data model, the generation adapter
//! trait, the error taxonomy and execution events that every other crate
//! depends on. It performs no I/O of its own.

mod adapter;
mod error;
pub mod events;
mod execution;
mod result;
mod workflow;

pub use adapter::{GenerationAdapter, StepContext};
pub use error::{AdapterError, ErrorKind, GatewayError, UpstreamKind, WorkflowError};
pub use events::{EventBus, EventEmitter, ExecutionEvent, StepEvent};
pub use execution::{generate_execution_id, ExecutionId, ExecutionStatus, WorkflowExecution};
pub use result::GenerationResult;
pub use workflow::{
    ImageRequest, SpeakerConfig, StepConfig, StepId, StepKind, TtsRequest, VideoRequest,
    WorkflowDefinition, WorkflowId, WorkflowStep,
};

//! Workflow execution runtime
//!
//! This crate provides the execution engine that runs workflow definitions,
//! the adapter registry it dispatches through, and the in-memory registry of
//! executions that clients poll.

mod executor;
pub mod lint;
mod registry;
mod runtime;
mod store;
pub mod templates;

pub use executor::{ExecutionHandle, WorkflowEngine};
pub use lint::{check_dependencies, DependencyIssue};
pub use registry::AdapterRegistry;
pub use runtime::{MediaRuntime, RuntimeConfig};
pub use store::ExecutionRegistry;
pub use templates::sample_workflows;

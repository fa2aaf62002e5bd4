use crate::{ErrorKind, GenerationResult, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type ExecutionId = String;

/// Generate an execution id of the form `exec_<unix millis>_<9 chars>`.
///
/// Uniqueness is probabilistic: there is no collision check.
pub fn generate_execution_id() -> ExecutionId {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("exec_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

/// One run of a workflow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub id: ExecutionId,
    pub config_id: WorkflowId,
    pub status: ExecutionStatus,
    pub results: HashMap<String, GenerationResult>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorKind>,
}

impl WorkflowExecution {
    pub fn new(id: ExecutionId, config_id: impl Into<WorkflowId>) -> Self {
        Self {
            id,
            config_id: config_id.into(),
            status: ExecutionStatus::Pending,
            results: HashMap::new(),
            start_time: Utc::now(),
            end_time: None,
            error: None,
            error_code: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_ids_follow_time_and_suffix_layout() {
        let id = generate_execution_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "exec");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert_ne!(id, generate_execution_id());
    }

    #[test]
    fn new_execution_is_pending() {
        let exec = WorkflowExecution::new(generate_execution_id(), "wf");
        assert_eq!(exec.status, ExecutionStatus::Pending);
        assert!(!exec.is_finished());
        let value = serde_json::to_value(&exec).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["configId"], "wf");
        assert!(value.get("endTime").is_none());
    }
}

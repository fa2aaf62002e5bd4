use chrono::Utc;
use mediacore::{
    ErrorKind, ExecutionId, ExecutionStatus, GenerationResult, WorkflowExecution,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Entries {
    by_id: HashMap<ExecutionId, WorkflowExecution>,
    order: Vec<ExecutionId>,
}

/// In-memory store of workflow executions.
///
/// Records are never evicted and do not survive a restart. Once an execution
/// reaches a terminal status every further mutation is ignored.
#[derive(Default)]
pub struct ExecutionRegistry {
    entries: RwLock<Entries>,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, execution: WorkflowExecution) {
        let mut entries = self.entries.write().await;
        if entries.by_id.insert(execution.id.clone(), execution.clone()).is_none() {
            entries.order.push(execution.id);
        }
    }

    pub async fn get(&self, id: &str) -> Option<WorkflowExecution> {
        self.entries.read().await.by_id.get(id).cloned()
    }

    /// Snapshot of every execution in insertion order
    pub async fn list_all(&self) -> Vec<WorkflowExecution> {
        let entries = self.entries.read().await;
        entries
            .order
            .iter()
            .filter_map(|id| entries.by_id.get(id).cloned())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn mark_running(&self, id: &str) -> bool {
        self.update(id, |exec| exec.status = ExecutionStatus::Running).await
    }

    /// Store a step result under each of `keys`
    pub async fn record_result(&self, id: &str, keys: &[&str], result: &GenerationResult) -> bool {
        self.update(id, |exec| {
            for key in keys {
                exec.results.insert((*key).to_string(), result.clone());
            }
        })
        .await
    }

    pub async fn complete(&self, id: &str) -> bool {
        self.update(id, |exec| {
            exec.status = ExecutionStatus::Completed;
            exec.end_time = Some(Utc::now());
        })
        .await
    }

    pub async fn fail(&self, id: &str, message: impl Into<String>, kind: ErrorKind) -> bool {
        let message = message.into();
        self.update(id, |exec| {
            exec.status = ExecutionStatus::Failed;
            exec.error = Some(message);
            exec.error_code = Some(kind);
            exec.end_time = Some(Utc::now());
        })
        .await
    }

    async fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut WorkflowExecution),
    {
        let mut entries = self.entries.write().await;
        match entries.by_id.get_mut(id) {
            Some(exec) if !exec.status.is_terminal() => {
                f(exec);
                true
            }
            Some(_) => {
                tracing::warn!("Ignoring update to finished execution {}", id);
                false
            }
            None => {
                tracing::warn!("Update for unknown execution {}", id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediacore::generate_execution_id;
    use std::path::PathBuf;

    fn image(path: &str) -> GenerationResult {
        GenerationResult::Image {
            file_path: PathBuf::from(path),
            prompt: "p".to_string(),
        }
    }

    #[tokio::test]
    async fn lists_in_insertion_order() {
        let registry = ExecutionRegistry::new();
        let ids: Vec<String> = (0..5).map(|i| format!("exec_{}", i)).collect();
        for id in &ids {
            registry.create(WorkflowExecution::new(id.clone(), "wf")).await;
        }

        let listed: Vec<String> = registry.list_all().await.into_iter().map(|e| e.id).collect();
        assert_eq!(listed, ids);
        assert_eq!(registry.len().await, 5);
    }

    #[tokio::test]
    async fn terminal_state_is_final() {
        let registry = ExecutionRegistry::new();
        let id = generate_execution_id();
        registry.create(WorkflowExecution::new(id.clone(), "wf")).await;

        assert!(registry.mark_running(&id).await);
        assert!(registry.record_result(&id, &["a", "s1"], &image("one.png")).await);
        assert!(registry.complete(&id).await);

        assert!(!registry.fail(&id, "late", ErrorKind::Internal).await);
        assert!(!registry.record_result(&id, &["s2"], &image("two.png")).await);

        let exec = registry.get(&id).await.unwrap();
        assert_eq!(exec.status, ExecutionStatus::Completed);
        assert_eq!(exec.results.len(), 2);
        assert!(exec.error.is_none());
        assert!(exec.end_time.is_some());
    }

    #[tokio::test]
    async fn unknown_execution_is_none() {
        let registry = ExecutionRegistry::new();
        assert!(registry.get("exec_missing").await.is_none());
        assert!(!registry.mark_running("exec_missing").await);
        assert!(registry.is_empty().await);
    }
}

//! Static dependency checks for workflow definitions.
//!
//! The engine itself only discovers dependency problems while running. These
//! checks let tooling report them before a definition is submitted.

use mediacore::WorkflowDefinition;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyIssue {
    DuplicateStep { step: String },
    UnknownDependency { step: String, dependency: String },
    /// Sequential run would fail: the dependency is declared after the step
    ForwardReference { step: String, dependency: String },
    Cycle { step: String },
}

impl fmt::Display for DependencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyIssue::DuplicateStep { step } => write!(f, "step id {} is declared more than once", step),
            DependencyIssue::UnknownDependency { step, dependency } => {
                write!(f, "step {} depends on unknown step {}", step, dependency)
            }
            DependencyIssue::ForwardReference { step, dependency } => {
                write!(f, "step {} depends on {} which is declared later", step, dependency)
            }
            DependencyIssue::Cycle { step } => write!(f, "dependency cycle through step {}", step),
        }
    }
}

/// Build the dependency graph of a definition and report every problem found
pub fn check_dependencies(definition: &WorkflowDefinition) -> Vec<DependencyIssue> {
    let mut issues = Vec::new();
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut step_to_index = HashMap::new();
    let mut position = HashMap::new();

    for (i, step) in definition.steps.iter().enumerate() {
        if step_to_index.contains_key(step.id.as_str()) {
            issues.push(DependencyIssue::DuplicateStep {
                step: step.id.clone(),
            });
            continue;
        }
        let idx = graph.add_node(step.id.as_str());
        step_to_index.insert(step.id.as_str(), idx);
        position.insert(step.id.as_str(), i);
    }

    for (i, step) in definition.steps.iter().enumerate() {
        for dep in &step.depends_on {
            let Some(from_idx) = step_to_index.get(dep.as_str()) else {
                issues.push(DependencyIssue::UnknownDependency {
                    step: step.id.clone(),
                    dependency: dep.clone(),
                });
                continue;
            };

            if !definition.parallel && position[dep.as_str()] >= i {
                issues.push(DependencyIssue::ForwardReference {
                    step: step.id.clone(),
                    dependency: dep.clone(),
                });
            }

            graph.add_edge(*from_idx, step_to_index[step.id.as_str()], ());
        }
    }

    if let Err(cycle) = toposort(&graph, None) {
        issues.push(DependencyIssue::Cycle {
            step: graph[cycle.node_id()].to_string(),
        });
    }

    issues
}

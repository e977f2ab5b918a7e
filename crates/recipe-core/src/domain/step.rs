//! Workflow steps: the owners of per-step knob overrides.

use serde::{Deserialize, Serialize};

/// Pipeline stage a step belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Stage {
    Build,
    Test,
    Deploy,
}

/// Execution status of a step, as reported by the workflow runner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    #[serde(rename = "Not started")]
    NotStarted,
    Running,
    Complete,
    Failed,
}

/// One step of the build workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowStep {
    pub id: String,
    pub label: String,
    pub stage: Stage,
    #[serde(default)]
    pub status: StepStatus,
}

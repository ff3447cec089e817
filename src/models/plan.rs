use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{require_text, Validate};

/// A complete project plan: ordered phases, each with ordered tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectPlan {
    /// Project name
    pub project_name: String,
    /// Project overview
    pub overview: String,
    /// Project phases, in execution order
    pub phases: Vec<Phase>,
    /// Total estimated duration
    #[serde(default)]
    pub estimated_duration: Option<String>,
    /// Key project risks
    #[serde(default)]
    pub key_risks: Vec<String>,
    /// Technical requirements
    #[serde(default)]
    pub tech_requirements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Phase {
    /// Phase name
    pub name: String,
    /// Phase description
    pub description: String,
    /// Tasks in this phase, in execution order
    pub tasks: Vec<Task>,
    /// Key milestone for this phase
    #[serde(default)]
    pub milestone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    /// Unique task identifier
    pub id: String,
    /// Task title
    pub title: String,
    /// Detailed task description
    pub description: String,
    /// Task priority
    pub priority: Priority,
    /// Estimated time or effort
    #[serde(default)]
    pub estimated_effort: Option<String>,
    /// Task IDs this task depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Success criteria
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

/// Relative priority, shared by tasks, suggestion impact and fix confidence.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl Validate for ProjectPlan {
    fn validate(&self) -> Result<(), String> {
        require_text("project_name", &self.project_name)?;
        require_text("overview", &self.overview)?;
        if self.phases.is_empty() {
            return Err("plan has no phases".to_string());
        }
        for (i, phase) in self.phases.iter().enumerate() {
            require_text(&format!("phases[{}].name", i), &phase.name)?;
            if phase.tasks.is_empty() {
                return Err(format!("phase '{}' has no tasks", phase.name));
            }
            for (j, task) in phase.tasks.iter().enumerate() {
                require_text(&format!("phases[{}].tasks[{}].id", i, j), &task.id)?;
                require_text(&format!("phases[{}].tasks[{}].title", i, j), &task.title)?;
            }
        }
        Ok(())
    }
}

impl ProjectPlan {
    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }
}

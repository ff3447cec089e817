use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{require_text, Priority, Validate};

/// Analysis of a program run: what went wrong, why, and how to fix it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionAnalysis {
    /// Whether the execution met its intended goal
    pub success: bool,
    /// Analysis summary
    pub summary: String,
    /// Most likely root cause of the observed behavior
    pub root_cause: String,
    /// Issues found
    #[serde(default)]
    pub issues: Vec<ExecutionIssue>,
    /// Suggested fixes, best first
    #[serde(default)]
    pub suggested_fixes: Vec<CodeFix>,
    /// Recommended next steps
    pub next_steps: Vec<String>,
    /// Performance observations
    #[serde(default)]
    pub performance_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionIssue {
    /// Issue type
    #[serde(rename = "type")]
    pub category: String,
    /// Issue description
    pub description: String,
    /// Likely cause of the issue
    pub likely_cause: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CodeFix {
    /// Fix description
    pub description: String,
    /// Code that fixes the issue
    pub code_snippet: String,
    /// Why this fix works
    pub explanation: String,
    /// Confidence in this fix
    pub confidence: Priority,
}

impl Validate for ExecutionAnalysis {
    fn validate(&self) -> Result<(), String> {
        require_text("summary", &self.summary)?;
        require_text("root_cause", &self.root_cause)?;
        for (i, fix) in self.suggested_fixes.iter().enumerate() {
            require_text(&format!("suggested_fixes[{}].description", i), &fix.description)?;
        }
        Ok(())
    }
}

impl ExecutionAnalysis {
    /// The highest-confidence fix, if any were suggested.
    pub fn best_fix(&self) -> Option<&CodeFix> {
        self.suggested_fixes
            .iter()
            .find(|f| f.confidence == Priority::High)
            .or_else(|| self.suggested_fixes.first())
    }
}

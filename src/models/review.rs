use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{require_text, Priority, Validate};

/// Result of reviewing a snippet or a directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CodeReview {
    /// Review summary
    pub summary: String,
    /// Overall code quality
    pub overall_quality: Quality,
    /// Issues found, most important first
    #[serde(default)]
    pub issues: Vec<Finding>,
    /// Improvement suggestions
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    /// Code strengths
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Test coverage assessment
    #[serde(default)]
    pub test_coverage_assessment: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::NeedsImprovement => "needs-improvement",
        }
    }
}

/// A single review finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    /// Issue severity
    pub severity: Severity,
    /// Issue type (e.g. bug, security, performance)
    #[serde(rename = "type")]
    pub category: String,
    /// Issue description
    pub message: String,
    /// Line number where the issue occurs
    #[serde(default)]
    pub line_number: Option<u32>,
    /// Suggested fix
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Suggestion {
    /// Suggestion type
    #[serde(rename = "type")]
    pub category: SuggestionKind,
    /// Suggestion description
    pub message: String,
    /// Example implementation
    #[serde(default)]
    pub example_code: Option<String>,
    /// Impact level
    #[serde(default)]
    pub impact: Priority,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionKind {
    Performance,
    Readability,
    Security,
    BestPractice,
    Refactoring,
}

impl Validate for CodeReview {
    fn validate(&self) -> Result<(), String> {
        require_text("summary", &self.summary)?;
        for (i, finding) in self.issues.iter().enumerate() {
            require_text(&format!("issues[{}].type", i), &finding.category)?;
            require_text(&format!("issues[{}].message", i), &finding.message)?;
        }
        for (i, suggestion) in self.suggestions.iter().enumerate() {
            require_text(&format!("suggestions[{}].message", i), &suggestion.message)?;
        }
        Ok(())
    }
}

impl CodeReview {
    /// Number of findings at or above the given severity.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|f| f.severity <= severity).count()
    }
}

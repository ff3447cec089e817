use serde::Serialize;

use super::{
    CodeReview, ExecutionAnalysis, GeneratedArtifact, ImplementationComparison, OperationKind,
    ProjectPlan, Severity,
};

/// A fully-populated, validated result. The variant always matches the
/// [`OperationKind`] of the originating request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum StructuredResult {
    Plan(ProjectPlan),
    RefinedPlan(ProjectPlan),
    Review(CodeReview),
    Analysis(ExecutionAnalysis),
    Diagnosis(ExecutionAnalysis),
    DirectoryReview(CodeReview),
    Comparison(ImplementationComparison),
    Documentation(GeneratedArtifact),
    TestSuite(GeneratedArtifact),
}

impl StructuredResult {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Plan(_) => OperationKind::PlanProject,
            Self::RefinedPlan(_) => OperationKind::RefinePlan,
            Self::Review(_) => OperationKind::ReviewCode,
            Self::Analysis(_) => OperationKind::AnalyzeExecution,
            Self::Diagnosis(_) => OperationKind::DebugError,
            Self::DirectoryReview(_) => OperationKind::ReviewDirectory,
            Self::Comparison(_) => OperationKind::CompareImplementations,
            Self::Documentation(_) => OperationKind::GenerateDocs,
            Self::TestSuite(_) => OperationKind::GenerateTests,
        }
    }

    /// The result body as JSON, without the kind tag.
    pub fn body(&self) -> serde_json::Value {
        let value = match self {
            Self::Plan(plan) | Self::RefinedPlan(plan) => serde_json::to_value(plan),
            Self::Review(review) | Self::DirectoryReview(review) => serde_json::to_value(review),
            Self::Analysis(analysis) | Self::Diagnosis(analysis) => serde_json::to_value(analysis),
            Self::Comparison(comparison) => serde_json::to_value(comparison),
            Self::Documentation(artifact) | Self::TestSuite(artifact) => {
                serde_json::to_value(artifact)
            }
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    /// One-line description for logs.
    pub fn summary_line(&self) -> String {
        match self {
            Self::Plan(plan) | Self::RefinedPlan(plan) => format!(
                "plan with {} phases, {} tasks",
                plan.phases.len(),
                plan.task_count()
            ),
            Self::Review(review) | Self::DirectoryReview(review) => format!(
                "review {}, {} issues ({} major or worse), {} suggestions",
                review.overall_quality.as_str(),
                review.issues.len(),
                review.count_at_least(Severity::Major),
                review.suggestions.len()
            ),
            Self::Analysis(analysis) | Self::Diagnosis(analysis) => {
                let mut line = format!(
                    "analysis {}, {} issues, {} fixes",
                    if analysis.success { "success" } else { "failure" },
                    analysis.issues.len(),
                    analysis.suggested_fixes.len()
                );
                if let Some(fix) = analysis.best_fix() {
                    line.push_str(&format!(
                        ", best fix '{}' ({} confidence)",
                        fix.description,
                        fix.confidence.as_str()
                    ));
                }
                line
            }
            Self::Comparison(comparison) => format!(
                "comparison of {} differences, recommends {}",
                comparison.differences.len(),
                comparison.recommendation.as_str()
            ),
            Self::Documentation(artifact) | Self::TestSuite(artifact) => {
                format!("artifact of {} bytes", artifact.content.len())
            }
        }
    }
}

/// Why a reply could not be structured.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    EmptyReply,
    NoStructuredBlock,
    InvalidJson,
    SchemaViolation,
    Truncated,
}

impl DegradeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyReply => "empty_reply",
            Self::NoStructuredBlock => "no_structured_block",
            Self::InvalidJson => "invalid_json",
            Self::SchemaViolation => "schema_violation",
            Self::Truncated => "truncated",
        }
    }
}

/// A successful call whose reply could not be fully structured.
///
/// `raw_text` is the model reply exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradedResult {
    pub kind: OperationKind,
    pub reason: DegradeReason,
    pub detail: String,
    pub raw_text: String,
}

/// What the response parser produced. Parsing never fails outright.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Structured(StructuredResult),
    Degraded(DegradedResult),
}

impl ParseOutcome {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Structured(result) => result.kind(),
            Self::Degraded(degraded) => degraded.kind,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn structured(&self) -> Option<&StructuredResult> {
        match self {
            Self::Structured(result) => Some(result),
            Self::Degraded(_) => None,
        }
    }

    pub fn degraded(&self) -> Option<&DegradedResult> {
        match self {
            Self::Structured(_) => None,
            Self::Degraded(degraded) => Some(degraded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CodeFix, Finding, Priority, Quality};

    fn finding(severity: Severity) -> Finding {
        Finding {
            severity,
            category: "bug".into(),
            message: "off by one".into(),
            line_number: None,
            suggestion: None,
        }
    }

    #[test]
    fn review_summary_counts_serious_findings() {
        let review = CodeReview {
            summary: "ok".into(),
            overall_quality: Quality::Fair,
            issues: vec![
                finding(Severity::Critical),
                finding(Severity::Minor),
                finding(Severity::Major),
            ],
            suggestions: vec![],
            strengths: vec![],
            test_coverage_assessment: None,
        };
        assert_eq!(
            StructuredResult::Review(review).summary_line(),
            "review fair, 3 issues (2 major or worse), 0 suggestions"
        );
    }

    #[test]
    fn diagnosis_summary_names_the_best_fix() {
        let analysis = ExecutionAnalysis {
            success: false,
            summary: "crash".into(),
            root_cause: "null".into(),
            issues: vec![],
            suggested_fixes: vec![
                CodeFix {
                    description: "retry".into(),
                    code_snippet: String::new(),
                    explanation: String::new(),
                    confidence: Priority::Low,
                },
                CodeFix {
                    description: "check for None".into(),
                    code_snippet: String::new(),
                    explanation: String::new(),
                    confidence: Priority::High,
                },
            ],
            next_steps: vec![],
            performance_notes: None,
        };
        let result = StructuredResult::Diagnosis(analysis);

        assert_eq!(result.kind(), OperationKind::DebugError);
        assert_eq!(
            result.summary_line(),
            "analysis failure, 0 issues, 2 fixes, best fix 'check for None' (high confidence)"
        );
    }
}

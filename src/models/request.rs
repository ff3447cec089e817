use serde::{Deserialize, Serialize};

/// The operation a tool call performs.
///
/// Every [`ToolRequest`] and every [`super::StructuredResult`] carries exactly one
/// kind, and a parsed result always has the kind of the request that produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    PlanProject,
    RefinePlan,
    ReviewCode,
    AnalyzeExecution,
    DebugError,
    ReviewDirectory,
    CompareImplementations,
    GenerateDocs,
    GenerateTests,
}

impl OperationKind {
    pub const ALL: [OperationKind; 9] = [
        Self::PlanProject,
        Self::RefinePlan,
        Self::ReviewCode,
        Self::AnalyzeExecution,
        Self::DebugError,
        Self::ReviewDirectory,
        Self::CompareImplementations,
        Self::GenerateDocs,
        Self::GenerateTests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlanProject => "plan_project",
            Self::RefinePlan => "refine_plan",
            Self::ReviewCode => "review_code",
            Self::AnalyzeExecution => "analyze_execution",
            Self::DebugError => "debug_error",
            Self::ReviewDirectory => "review_directory",
            Self::CompareImplementations => "compare_implementations",
            Self::GenerateDocs => "generate_docs",
            Self::GenerateTests => "generate_tests",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name was not an operation this server performs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl std::str::FromStr for OperationKind {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

pub const DEFAULT_LANGUAGE: &str = "python";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanProjectRequest {
    pub description: String,
    pub requirements: Vec<String>,
    pub constraints: Vec<String>,
    pub tech_stack: Vec<String>,
}

/// Revision of an existing plan. `current_plan` is the plan as JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefinePlanRequest {
    pub current_plan: String,
    pub feedback: String,
    pub additional_context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewCodeRequest {
    pub code: String,
    pub language: String,
    pub context: Option<String>,
    pub focus_areas: Vec<String>,
    /// Feedback from an earlier review of this code, for re-reviews.
    pub previous_feedback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeExecutionRequest {
    pub code: String,
    pub execution_output: String,
    pub expected_behavior: Option<String>,
    pub error_messages: Vec<String>,
    pub language: String,
    /// Descriptions of earlier attempts, oldest first.
    pub previous_attempts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugErrorRequest {
    pub code: String,
    pub error_message: String,
    pub stack_trace: Option<String>,
    pub language: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareImplementationsRequest {
    pub code1: String,
    pub code2: String,
    pub language: String,
    pub comparison_criteria: Vec<String>,
}

/// Review of a whole directory. `contents` is the rendered multi-file payload
/// produced by the workspace walker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewDirectoryRequest {
    pub directory_path: String,
    pub contents: String,
    pub focus_areas: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateDocsRequest {
    pub code: String,
    pub language: String,
    pub doc_style: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateTestsRequest {
    pub code: String,
    pub language: String,
    pub test_framework: Option<String>,
    pub context: Option<String>,
}

/// A validated, fully-populated request for one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolRequest {
    PlanProject(PlanProjectRequest),
    RefinePlan(RefinePlanRequest),
    ReviewCode(ReviewCodeRequest),
    AnalyzeExecution(AnalyzeExecutionRequest),
    DebugError(DebugErrorRequest),
    ReviewDirectory(ReviewDirectoryRequest),
    CompareImplementations(CompareImplementationsRequest),
    GenerateDocs(GenerateDocsRequest),
    GenerateTests(GenerateTestsRequest),
}

/// A required field was missing or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{field}' must be a non-empty string")]
pub struct FieldError {
    pub field: &'static str,
}

impl ToolRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::PlanProject(_) => OperationKind::PlanProject,
            Self::RefinePlan(_) => OperationKind::RefinePlan,
            Self::ReviewCode(_) => OperationKind::ReviewCode,
            Self::AnalyzeExecution(_) => OperationKind::AnalyzeExecution,
            Self::DebugError(_) => OperationKind::DebugError,
            Self::ReviewDirectory(_) => OperationKind::ReviewDirectory,
            Self::CompareImplementations(_) => OperationKind::CompareImplementations,
            Self::GenerateDocs(_) => OperationKind::GenerateDocs,
            Self::GenerateTests(_) => OperationKind::GenerateTests,
        }
    }

    /// Check required fields and normalize optional ones.
    ///
    /// Blank optional strings become `None`, blank list entries are dropped and
    /// a blank language falls back to [`DEFAULT_LANGUAGE`].
    pub fn validate(self) -> Result<Self, FieldError> {
        let request = match self {
            Self::PlanProject(r) => Self::PlanProject(PlanProjectRequest {
                description: required("description", r.description)?,
                requirements: clean_list(r.requirements),
                constraints: clean_list(r.constraints),
                tech_stack: clean_list(r.tech_stack),
            }),
            Self::RefinePlan(r) => Self::RefinePlan(RefinePlanRequest {
                current_plan: required("current_plan", r.current_plan)?,
                feedback: required("feedback", r.feedback)?,
                additional_context: clean_opt(r.additional_context),
            }),
            Self::ReviewCode(r) => Self::ReviewCode(ReviewCodeRequest {
                code: required("code", r.code)?,
                language: language_or_default(r.language),
                context: clean_opt(r.context),
                focus_areas: clean_list(r.focus_areas),
                previous_feedback: clean_opt(r.previous_feedback),
            }),
            Self::AnalyzeExecution(r) => Self::AnalyzeExecution(AnalyzeExecutionRequest {
                code: required("code", r.code)?,
                execution_output: required("execution_output", r.execution_output)?,
                expected_behavior: clean_opt(r.expected_behavior),
                error_messages: clean_list(r.error_messages),
                language: language_or_default(r.language),
                previous_attempts: clean_list(r.previous_attempts),
            }),
            Self::DebugError(r) => Self::DebugError(DebugErrorRequest {
                code: required("code", r.code)?,
                error_message: required("error_message", r.error_message)?,
                stack_trace: clean_opt(r.stack_trace),
                language: language_or_default(r.language),
                context: clean_opt(r.context),
            }),
            Self::ReviewDirectory(r) => Self::ReviewDirectory(ReviewDirectoryRequest {
                directory_path: required("directory_path", r.directory_path)?,
                contents: required("contents", r.contents)?,
                focus_areas: clean_list(r.focus_areas),
                include_patterns: clean_list(r.include_patterns),
                exclude_patterns: clean_list(r.exclude_patterns),
            }),
            Self::CompareImplementations(r) => {
                Self::CompareImplementations(CompareImplementationsRequest {
                    code1: required("code1", r.code1)?,
                    code2: required("code2", r.code2)?,
                    language: language_or_default(r.language),
                    comparison_criteria: clean_list(r.comparison_criteria),
                })
            }
            Self::GenerateDocs(r) => Self::GenerateDocs(GenerateDocsRequest {
                code: required("code", r.code)?,
                language: language_or_default(r.language),
                doc_style: clean_opt(r.doc_style),
                context: clean_opt(r.context),
            }),
            Self::GenerateTests(r) => Self::GenerateTests(GenerateTestsRequest {
                code: required("code", r.code)?,
                language: language_or_default(r.language),
                test_framework: clean_opt(r.test_framework),
                context: clean_opt(r.context),
            }),
        };
        Ok(request)
    }
}

fn required(field: &'static str, value: String) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        Err(FieldError { field })
    } else {
        Ok(value)
    }
}

fn clean_opt(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn language_or_default(language: String) -> String {
    let language = language.trim();
    if language.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        language.to_string()
    }
}

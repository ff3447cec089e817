//! Request and response types for MCP tools.

use rmcp::model::{CallToolResult, Content};
use rmcp::schemars::JsonSchema;
use rmcp::ErrorData as McpError;
use serde::{Deserialize, Serialize};

use crate::llm::ReplyMeta;
use crate::models::*;

pub const DEGRADED_NOTICE: &str = "Could not fully structure this response";

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct PlanProjectParams {
    #[schemars(description = "What the project should build, in plain language")]
    pub description: String,
    #[schemars(description = "Functional requirements the plan must cover")]
    #[serde(default)]
    pub requirements: Vec<String>,
    #[schemars(description = "Constraints such as budget, deadlines or team size")]
    #[serde(default)]
    pub constraints: Vec<String>,
    #[schemars(description = "Technologies the project should use")]
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ReviewCodeParams {
    #[schemars(description = "The source code to review")]
    pub code: String,
    #[schemars(description = "Programming language of the code. Defaults to 'python'")]
    #[serde(default)]
    pub language: String,
    #[schemars(description = "What the code is for and where it runs")]
    #[serde(default)]
    pub context: Option<String>,
    #[schemars(
        description = "Aspects to concentrate on, e.g. 'security', 'performance', 'readability'"
    )]
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[schemars(description = "Feedback from an earlier review, when this is a revised version")]
    #[serde(default)]
    pub previous_feedback: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct RefinePlanParams {
    #[schemars(description = "The plan to revise, as returned by plan_project (object or JSON text)")]
    pub current_plan: serde_json::Value,
    #[schemars(description = "What should change in the plan")]
    pub feedback: String,
    #[schemars(description = "Anything else the planner should know")]
    #[serde(default)]
    pub additional_context: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DebugErrorParams {
    #[schemars(description = "The code that raised the error")]
    pub code: String,
    #[schemars(description = "The error message")]
    pub error_message: String,
    #[schemars(description = "Stack trace, if one was printed")]
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[schemars(description = "Programming language of the code. Defaults to 'python'")]
    #[serde(default)]
    pub language: String,
    #[schemars(description = "What the code was doing when it failed")]
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct CompareImplementationsParams {
    #[schemars(description = "The first implementation")]
    pub code1: String,
    #[schemars(description = "The second implementation")]
    pub code2: String,
    #[schemars(description = "Programming language of both. Defaults to 'python'")]
    #[serde(default)]
    pub language: String,
    #[schemars(description = "Criteria to weigh, e.g. 'memory use', 'testability'")]
    #[serde(default)]
    pub comparison_criteria: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AnalyzeExecutionParams {
    #[schemars(description = "The code that was executed")]
    pub code: String,
    #[schemars(description = "Everything the execution printed (stdout and stderr)")]
    pub execution_output: String,
    #[schemars(description = "What the code was supposed to do")]
    #[serde(default)]
    pub expected_behavior: Option<String>,
    #[schemars(description = "Error messages or stack traces raised during execution")]
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[schemars(description = "Programming language of the code. Defaults to 'python'")]
    #[serde(default)]
    pub language: String,
    #[schemars(description = "What was already tried, oldest first")]
    #[serde(default)]
    pub previous_attempts: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ReviewDirectoryParams {
    #[schemars(description = "Path of the directory to review")]
    pub directory_path: String,
    #[schemars(description = "Aspects to concentrate on")]
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[schemars(
        description = "Glob patterns of files to include, relative to the directory (e.g. 'src/**/*.rs'). Defaults to common source file extensions"
    )]
    #[serde(default)]
    pub include_patterns: Vec<String>,
    #[schemars(description = "Glob patterns of files to leave out")]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ReviewWorkspaceParams {
    #[schemars(
        description = "URI or name of the workspace root to review. Defaults to the first root the client exposes"
    )]
    #[serde(default)]
    pub root: Option<String>,
    #[schemars(description = "Aspects to concentrate on")]
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[schemars(description = "Glob patterns of files to include")]
    #[serde(default)]
    pub include_patterns: Vec<String>,
    #[schemars(description = "Glob patterns of files to leave out")]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GenerateDocsParams {
    #[schemars(description = "The source code to document")]
    pub code: String,
    #[schemars(description = "Programming language of the code. Defaults to 'python'")]
    #[serde(default)]
    pub language: String,
    #[schemars(description = "Documentation style, e.g. 'google', 'numpy', 'rustdoc'")]
    #[serde(default)]
    pub doc_style: Option<String>,
    #[schemars(description = "Extra context about the code's purpose or audience")]
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GenerateTestsParams {
    #[schemars(description = "The source code to write tests for")]
    pub code: String,
    #[schemars(description = "Programming language of the code. Defaults to 'python'")]
    #[serde(default)]
    pub language: String,
    #[schemars(description = "Test framework to target, e.g. 'pytest', 'jest', 'cargo test'")]
    #[serde(default)]
    pub test_framework: Option<String>,
    #[schemars(description = "Extra context about behaviour that must be covered")]
    #[serde(default)]
    pub context: Option<String>,
}

impl From<PlanProjectParams> for ToolRequest {
    fn from(p: PlanProjectParams) -> Self {
        ToolRequest::PlanProject(PlanProjectRequest {
            description: p.description,
            requirements: p.requirements,
            constraints: p.constraints,
            tech_stack: p.tech_stack,
        })
    }
}

impl From<ReviewCodeParams> for ToolRequest {
    fn from(p: ReviewCodeParams) -> Self {
        ToolRequest::ReviewCode(ReviewCodeRequest {
            code: p.code,
            language: p.language,
            context: p.context,
            focus_areas: p.focus_areas,
            previous_feedback: p.previous_feedback,
        })
    }
}

impl From<RefinePlanParams> for ToolRequest {
    fn from(p: RefinePlanParams) -> Self {
        let current_plan = match p.current_plan {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(text) => text,
            plan => serde_json::to_string_pretty(&plan).unwrap_or_default(),
        };
        ToolRequest::RefinePlan(RefinePlanRequest {
            current_plan,
            feedback: p.feedback,
            additional_context: p.additional_context,
        })
    }
}

impl From<DebugErrorParams> for ToolRequest {
    fn from(p: DebugErrorParams) -> Self {
        ToolRequest::DebugError(DebugErrorRequest {
            code: p.code,
            error_message: p.error_message,
            stack_trace: p.stack_trace,
            language: p.language,
            context: p.context,
        })
    }
}

impl From<CompareImplementationsParams> for ToolRequest {
    fn from(p: CompareImplementationsParams) -> Self {
        ToolRequest::CompareImplementations(CompareImplementationsRequest {
            code1: p.code1,
            code2: p.code2,
            language: p.language,
            comparison_criteria: p.comparison_criteria,
        })
    }
}

impl From<AnalyzeExecutionParams> for ToolRequest {
    fn from(p: AnalyzeExecutionParams) -> Self {
        ToolRequest::AnalyzeExecution(AnalyzeExecutionRequest {
            code: p.code,
            execution_output: p.execution_output,
            expected_behavior: p.expected_behavior,
            error_messages: p.error_messages,
            language: p.language,
            previous_attempts: p.previous_attempts,
        })
    }
}

impl From<GenerateDocsParams> for ToolRequest {
    fn from(p: GenerateDocsParams) -> Self {
        ToolRequest::GenerateDocs(GenerateDocsRequest {
            code: p.code,
            language: p.language,
            doc_style: p.doc_style,
            context: p.context,
        })
    }
}

impl From<GenerateTestsParams> for ToolRequest {
    fn from(p: GenerateTestsParams) -> Self {
        ToolRequest::GenerateTests(GenerateTestsRequest {
            code: p.code,
            language: p.language,
            test_framework: p.test_framework,
            context: p.context,
        })
    }
}

impl From<ReviewWorkspaceParams> for ReviewDirectoryParams {
    fn from(p: ReviewWorkspaceParams) -> Self {
        ReviewDirectoryParams {
            directory_path: String::new(),
            focus_areas: p.focus_areas,
            include_patterns: p.include_patterns,
            exclude_patterns: p.exclude_patterns,
        }
    }
}

// ============================================================
// Response Types
// ============================================================

/// What every model-backed tool returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutput {
    Structured {
        kind: OperationKind,
        result: serde_json::Value,
        model: ReplyMeta,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
    },
    Degraded {
        kind: OperationKind,
        notice: &'static str,
        reason: DegradeReason,
        detail: String,
        raw_text: String,
        model: ReplyMeta,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
    },
}

impl ToolOutput {
    pub fn new(outcome: ParseOutcome, model: ReplyMeta) -> Self {
        match outcome {
            ParseOutcome::Structured(result) => ToolOutput::Structured {
                kind: result.kind(),
                result: result.body(),
                model,
                context: None,
            },
            ParseOutcome::Degraded(degraded) => ToolOutput::Degraded {
                kind: degraded.kind,
                notice: DEGRADED_NOTICE,
                reason: degraded.reason,
                detail: degraded.detail,
                raw_text: degraded.raw_text,
                model,
                context: None,
            },
        }
    }

    /// Attach tool-specific metadata (directory walked, elicitation outcome).
    pub fn with_context(mut self, value: serde_json::Value) -> Self {
        match &mut self {
            ToolOutput::Structured { context, .. } | ToolOutput::Degraded { context, .. } => {
                *context = Some(value)
            }
        }
        self
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            ToolOutput::Structured { kind, .. } | ToolOutput::Degraded { kind, .. } => *kind,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ToolOutput::Degraded { .. })
    }
}

/// Pretty-printed JSON tool result.
pub fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootInfo {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootsResponse {
    /// `client` when the roots came from the peer, `server_cwd` otherwise.
    pub source: &'static str,
    pub roots: Vec<RootInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelReply;

    fn meta() -> ReplyMeta {
        ModelReply::from_text("", "gemini-test").meta()
    }

    #[test]
    fn degraded_output_carries_notice_and_raw_text() {
        let outcome = crate::parser::parse_text(OperationKind::ReviewCode, "Looks fine to me.", false);
        let output = ToolOutput::new(outcome, meta());
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["status"], "degraded");
        assert_eq!(json["kind"], "review_code");
        assert_eq!(json["notice"], DEGRADED_NOTICE);
        assert_eq!(json["reason"], "no_structured_block");
        assert_eq!(json["raw_text"], "Looks fine to me.");
        assert_eq!(json["model"]["model"], "gemini-test");
        assert!(json.get("context").is_none());
    }

    #[test]
    fn structured_output_has_result_body() {
        let reply = "```\nfn main() {}\n```";
        let outcome = crate::parser::parse_text(OperationKind::GenerateTests, reply, false);
        let output = ToolOutput::new(outcome, meta())
            .with_context(serde_json::json!({"source": "sampling"}));
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["status"], "structured");
        assert_eq!(json["kind"], "generate_tests");
        assert_eq!(json["result"]["content"], "fn main() {}");
        assert_eq!(json["context"]["source"], "sampling");
    }

    #[test]
    fn refine_params_accept_a_plan_object_or_text() {
        let params: RefinePlanParams = serde_json::from_value(serde_json::json!({
            "current_plan": { "project_name": "Blog", "phases": [] },
            "feedback": "add a launch phase"
        }))
        .unwrap();
        let ToolRequest::RefinePlan(request) = ToolRequest::from(params) else {
            panic!("kind changed");
        };
        assert!(request.current_plan.starts_with("{\n"));
        assert!(request.current_plan.contains("\"project_name\": \"Blog\""));

        let params: RefinePlanParams = serde_json::from_value(serde_json::json!({
            "current_plan": "{\"project_name\": \"Blog\"}",
            "feedback": "add a launch phase"
        }))
        .unwrap();
        let ToolRequest::RefinePlan(request) = ToolRequest::from(params) else {
            panic!("kind changed");
        };
        assert_eq!(request.current_plan, "{\"project_name\": \"Blog\"}");
    }

    #[test]
    fn missing_plan_fails_validation() {
        let params: RefinePlanParams =
            serde_json::from_value(serde_json::json!({ "current_plan": null, "feedback": "x" }))
                .unwrap();
        let err = ToolRequest::from(params).validate().unwrap_err();
        assert_eq!(err.field, "current_plan");
    }

    #[test]
    fn params_default_optional_fields() {
        let params: ReviewCodeParams = serde_json::from_str(r#"{"code":"x = 1"}"#).unwrap();
        let request = ToolRequest::from(params).validate().unwrap();
        match request {
            ToolRequest::ReviewCode(r) => {
                assert_eq!(r.language, DEFAULT_LANGUAGE);
                assert!(r.focus_areas.is_empty());
            }
            other => panic!("unexpected request {:?}", other),
        }
    }
}

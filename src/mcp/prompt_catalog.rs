//! MCP prompt catalog. Each prompt renders through the same builder the tools use.

use rmcp::model::{Prompt, PromptArgument};
use serde_json::{Map, Value};

use super::types::{
    CompareImplementationsParams, DebugErrorParams, PlanProjectParams, RefinePlanParams,
    ReviewCodeParams, ReviewDirectoryParams,
};
use crate::error::ToolError;
use crate::models::*;

struct PromptEntry {
    name: &'static str,
    description: &'static str,
    /// `(name, description, required)`
    arguments: &'static [(&'static str, &'static str, bool)],
}

const CATALOG: &[PromptEntry] = &[
    PromptEntry {
        name: "plan_project",
        description: "Turn a project description into a phased implementation plan",
        arguments: &[
            ("description", "What the project should build", true),
            ("requirements", "Comma-separated requirements", false),
            ("constraints", "Comma-separated constraints", false),
            ("tech_stack", "Comma-separated technologies", false),
        ],
    },
    PromptEntry {
        name: "refine_plan",
        description: "Revise an existing project plan based on feedback",
        arguments: &[
            ("current_plan", "The plan to revise, as JSON", true),
            ("feedback", "What should change", true),
            ("additional_context", "Anything else the planner should know", false),
        ],
    },
    PromptEntry {
        name: "review_code",
        description: "Review a piece of code for quality, bugs and security issues",
        arguments: &[
            ("code", "The code to review", true),
            ("language", "Programming language (default python)", false),
            ("context", "What the code is for", false),
            ("focus_areas", "Comma-separated focus areas", false),
            ("previous_feedback", "Feedback from an earlier review", false),
        ],
    },
    PromptEntry {
        name: "analyze_execution",
        description: "Explain why a program run failed or misbehaved and how to fix it",
        arguments: &[
            ("code", "The code that ran", true),
            ("execution_output", "Output of the run", true),
            ("expected_behavior", "What should have happened", false),
            ("error_messages", "Comma-separated error messages", false),
            ("language", "Programming language (default python)", false),
            ("previous_attempts", "Comma-separated earlier attempts", false),
        ],
    },
    PromptEntry {
        name: "debug_error",
        description: "Find the cause of a specific error and suggest fixes",
        arguments: &[
            ("code", "The code that raised the error", true),
            ("error_message", "The error message", true),
            ("stack_trace", "Stack trace, if any", false),
            ("language", "Programming language (default python)", false),
            ("context", "What the code was doing", false),
        ],
    },
    PromptEntry {
        name: "review_directory",
        description: "Review every source file in a directory as one codebase",
        arguments: &[
            ("directory_path", "Directory to review", true),
            ("focus_areas", "Comma-separated focus areas", false),
            ("include_patterns", "Comma-separated glob patterns to include", false),
            ("exclude_patterns", "Comma-separated glob patterns to exclude", false),
        ],
    },
    PromptEntry {
        name: "compare_implementations",
        description: "Compare two implementations and recommend one",
        arguments: &[
            ("code1", "The first implementation", true),
            ("code2", "The second implementation", true),
            ("language", "Programming language (default python)", false),
            ("comparison_criteria", "Comma-separated criteria", false),
        ],
    },
];

/// What a prompt needs before it can be rendered.
#[derive(Debug, Clone)]
pub enum PromptTarget {
    Request(ToolRequest),
    /// The directory has to be walked first.
    Directory(ReviewDirectoryParams),
}

pub fn list() -> Vec<Prompt> {
    CATALOG
        .iter()
        .map(|entry| {
            let arguments = entry
                .arguments
                .iter()
                .map(|(name, description, required)| PromptArgument {
                    name: name.to_string(),
                    title: None,
                    description: Some(description.to_string()),
                    required: Some(*required),
                })
                .collect();
            Prompt::new(entry.name, Some(entry.description), Some(arguments))
        })
        .collect()
}

pub fn description(name: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.description)
}

/// Bind string arguments to the prompt's request type.
pub fn resolve(name: &str, arguments: &Map<String, Value>) -> Result<PromptTarget, ToolError> {
    let entry = CATALOG
        .iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| ToolError::Validation(format!("Unknown prompt '{}'", name)))?;

    for (arg, _, required) in entry.arguments {
        if *required && text(arguments, arg).is_empty() {
            return Err(ToolError::Validation(format!(
                "Prompt '{}' requires argument '{}'",
                name, arg
            )));
        }
    }

    let kind: OperationKind = name
        .parse()
        .map_err(|e: UnknownOperation| ToolError::Validation(e.to_string()))?;
    let target = match kind {
        OperationKind::PlanProject => PromptTarget::Request(
            PlanProjectParams {
                description: text(arguments, "description"),
                requirements: list_arg(arguments, "requirements"),
                constraints: list_arg(arguments, "constraints"),
                tech_stack: list_arg(arguments, "tech_stack"),
            }
            .into(),
        ),
        OperationKind::RefinePlan => PromptTarget::Request(
            RefinePlanParams {
                current_plan: Value::String(text(arguments, "current_plan")),
                feedback: text(arguments, "feedback"),
                additional_context: optional(arguments, "additional_context"),
            }
            .into(),
        ),
        OperationKind::ReviewCode => PromptTarget::Request(
            ReviewCodeParams {
                code: text(arguments, "code"),
                language: text(arguments, "language"),
                context: optional(arguments, "context"),
                focus_areas: list_arg(arguments, "focus_areas"),
                previous_feedback: optional(arguments, "previous_feedback"),
            }
            .into(),
        ),
        OperationKind::AnalyzeExecution => PromptTarget::Request(ToolRequest::AnalyzeExecution(
            AnalyzeExecutionRequest {
                code: text(arguments, "code"),
                execution_output: text(arguments, "execution_output"),
                expected_behavior: optional(arguments, "expected_behavior"),
                error_messages: list_arg(arguments, "error_messages"),
                language: text(arguments, "language"),
                previous_attempts: list_arg(arguments, "previous_attempts"),
            },
        )),
        OperationKind::DebugError => PromptTarget::Request(
            DebugErrorParams {
                code: text(arguments, "code"),
                error_message: text(arguments, "error_message"),
                stack_trace: optional(arguments, "stack_trace"),
                language: text(arguments, "language"),
                context: optional(arguments, "context"),
            }
            .into(),
        ),
        OperationKind::ReviewDirectory => PromptTarget::Directory(ReviewDirectoryParams {
            directory_path: text(arguments, "directory_path"),
            focus_areas: list_arg(arguments, "focus_areas"),
            include_patterns: list_arg(arguments, "include_patterns"),
            exclude_patterns: list_arg(arguments, "exclude_patterns"),
        }),
        OperationKind::CompareImplementations => PromptTarget::Request(
            CompareImplementationsParams {
                code1: text(arguments, "code1"),
                code2: text(arguments, "code2"),
                language: text(arguments, "language"),
                comparison_criteria: list_arg(arguments, "comparison_criteria"),
            }
            .into(),
        ),
        OperationKind::GenerateDocs | OperationKind::GenerateTests => {
            return Err(ToolError::Validation(format!(
                "No prompt template for '{}'",
                name
            )))
        }
    };
    Ok(target)
}

fn text(arguments: &Map<String, Value>, key: &str) -> String {
    match arguments.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn optional(arguments: &Map<String, Value>, key: &str) -> Option<String> {
    Some(text(arguments, key)).filter(|s| !s.trim().is_empty())
}

fn list_arg(arguments: &Map<String, Value>, key: &str) -> Vec<String> {
    match arguments.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => text(arguments, key)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    }
}

//! Prompt builder.
//!
//! [`build_prompt`] renders a validated [`ToolRequest`] into the single prompt
//! string sent to the model: persona, request sections, then output-format
//! instructions. Sections for empty optional fields are omitted entirely.
//! Rendering is pure and deterministic.

pub mod templates;

use schemars::{schema_for, JsonSchema};

use crate::models::*;

const JSON_INSTRUCTION: &str = "Respond with exactly one fenced ```json block containing a single JSON object that conforms to the JSON schema below. Fill in every required field. Do not write anything outside the block.";

/// Render the full prompt for a request.
pub fn build_prompt(request: &ToolRequest) -> String {
    let sections = match request {
        ToolRequest::PlanProject(r) => plan_project(r),
        ToolRequest::RefinePlan(r) => refine_plan(r),
        ToolRequest::ReviewCode(r) => review_code(r),
        ToolRequest::AnalyzeExecution(r) => analyze_execution(r),
        ToolRequest::DebugError(r) => debug_error(r),
        ToolRequest::ReviewDirectory(r) => review_directory(r),
        ToolRequest::CompareImplementations(r) => compare_implementations(r),
        ToolRequest::GenerateDocs(r) => generate_docs(r),
        ToolRequest::GenerateTests(r) => generate_tests(r),
    };
    sections.join("\n\n")
}

/// Persona preamble for an operation.
pub fn persona(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::PlanProject | OperationKind::RefinePlan => templates::PROJECT_PLANNER,
        OperationKind::ReviewCode
        | OperationKind::ReviewDirectory
        | OperationKind::CompareImplementations => templates::CODE_REVIEWER,
        OperationKind::AnalyzeExecution | OperationKind::DebugError => {
            templates::EXECUTION_ANALYZER
        }
        OperationKind::GenerateDocs => templates::DOCUMENTATION_WRITER,
        OperationKind::GenerateTests => templates::TEST_WRITER,
    }
}

fn plan_project(r: &PlanProjectRequest) -> Vec<String> {
    let mut sections = vec![
        persona(OperationKind::PlanProject).to_string(),
        format!("Project Description: {}", r.description),
    ];
    push_bullets(&mut sections, "Requirements", &r.requirements);
    push_bullets(&mut sections, "Constraints", &r.constraints);
    if !r.tech_stack.is_empty() {
        sections.push(format!("Technology Stack: {}", r.tech_stack.join(", ")));
    }
    sections.push(
        "Please create a comprehensive project plan with phases, tasks, and estimates.".into(),
    );
    sections.push(json_instruction::<ProjectPlan>());
    sections
}

fn refine_plan(r: &RefinePlanRequest) -> Vec<String> {
    let mut sections = vec![
        persona(OperationKind::RefinePlan).to_string(),
        format!("Current Project Plan:\n{}", r.current_plan.trim_end()),
        format!("Feedback:\n{}", r.feedback),
    ];
    if let Some(context) = &r.additional_context {
        sections.push(format!("Additional Context: {}", context));
    }
    sections.push(
        "Please refine the project plan based on the feedback while maintaining its overall structure and quality."
            .into(),
    );
    sections.push(json_instruction::<ProjectPlan>());
    sections
}

fn review_code(r: &ReviewCodeRequest) -> Vec<String> {
    let mut sections = vec![
        persona(OperationKind::ReviewCode).to_string(),
        format!("Please review the following {} code:", r.language),
    ];
    if let Some(context) = &r.context {
        sections.push(format!("Context: {}", context));
    }
    sections.push(fenced(&r.language, &r.code));
    push_bullets(&mut sections, "Focus Areas", &r.focus_areas);
    if let Some(feedback) = &r.previous_feedback {
        sections.push(format!("This is a revision. Previous feedback:\n{}", feedback));
    }
    sections.push(json_instruction::<CodeReview>());
    sections
}

fn analyze_execution(r: &AnalyzeExecutionRequest) -> Vec<String> {
    let mut sections = vec![persona(OperationKind::AnalyzeExecution).to_string()];
    if let Some(expected) = &r.expected_behavior {
        sections.push(format!("Expected Behavior: {}", expected));
    }
    sections.push(format!("Code ({}):\n{}", r.language, fenced(&r.language, &r.code)));
    sections.push(format!("Execution Output:\n{}", fenced("", &r.execution_output)));
    push_bullets(&mut sections, "Error Messages", &r.error_messages);
    if !r.previous_attempts.is_empty() {
        let attempts: Vec<String> = r
            .previous_attempts
            .iter()
            .enumerate()
            .map(|(i, attempt)| format!("Attempt {}:\n{}", i + 1, attempt))
            .collect();
        sections.push(format!("Previous Attempts:\n\n{}", attempts.join("\n\n")));
    }
    sections.push("Please analyze the execution results and provide guidance.".into());
    sections.push(json_instruction::<ExecutionAnalysis>());
    sections
}

fn debug_error(r: &DebugErrorRequest) -> Vec<String> {
    let mut sections = vec![
        persona(OperationKind::DebugError).to_string(),
        format!("Debug this {} error:", r.language),
        format!("Code:\n{}", fenced(&r.language, &r.code)),
        format!("Error Message:\n{}", r.error_message),
    ];
    if let Some(trace) = &r.stack_trace {
        sections.push(format!("Stack Trace:\n{}", fenced("", trace)));
    }
    if let Some(context) = &r.context {
        sections.push(format!("Context: {}", context));
    }
    sections.push("Please provide a detailed analysis of the error and specific fixes.".into());
    sections.push(json_instruction::<ExecutionAnalysis>());
    sections
}

fn review_directory(r: &ReviewDirectoryRequest) -> Vec<String> {
    let mut sections = vec![
        persona(OperationKind::ReviewDirectory).to_string(),
        format!("Please review the project in directory {}.", r.directory_path),
        format!("Context: Full directory review of {}", r.directory_path),
    ];
    if !r.include_patterns.is_empty() {
        sections.push(format!("Included patterns: {}", r.include_patterns.join(", ")));
    }
    if !r.exclude_patterns.is_empty() {
        sections.push(format!("Excluded patterns: {}", r.exclude_patterns.join(", ")));
    }
    sections.push(r.contents.trim_end().to_string());
    push_bullets(&mut sections, "Focus Areas", &r.focus_areas);
    sections.push(json_instruction::<CodeReview>());
    sections
}

fn compare_implementations(r: &CompareImplementationsRequest) -> Vec<String> {
    let mut sections = vec![
        persona(OperationKind::CompareImplementations).to_string(),
        format!("Compare these two {} implementations:", r.language),
        format!("Implementation 1:\n{}", fenced(&r.language, &r.code1)),
        format!("Implementation 2:\n{}", fenced(&r.language, &r.code2)),
    ];
    if !r.comparison_criteria.is_empty() {
        sections.push(format!(
            "Comparison Criteria: {}",
            r.comparison_criteria.join(", ")
        ));
    }
    sections.push(templates::COMPARISON_COVERAGE.into());
    sections.push(json_instruction::<ImplementationComparison>());
    sections
}

fn generate_docs(r: &GenerateDocsRequest) -> Vec<String> {
    let mut sections = vec![
        persona(OperationKind::GenerateDocs).to_string(),
        format!("Write documentation for the following {} code.", r.language),
    ];
    if let Some(style) = &r.doc_style {
        sections.push(format!("Documentation style: {}", style));
    }
    if let Some(context) = &r.context {
        sections.push(format!("Context: {}", context));
    }
    sections.push(fenced(&r.language, &r.code));
    sections.push(
        "Return the complete documentation as Markdown inside exactly one fenced ```markdown block. Do not write anything outside the block."
            .into(),
    );
    sections
}

fn generate_tests(r: &GenerateTestsRequest) -> Vec<String> {
    let mut sections = vec![
        persona(OperationKind::GenerateTests).to_string(),
        format!("Write automated tests for the following {} code.", r.language),
    ];
    if let Some(framework) = &r.test_framework {
        sections.push(format!("Test framework: {}", framework));
    }
    if let Some(context) = &r.context {
        sections.push(format!("Context: {}", context));
    }
    sections.push(fenced(&r.language, &r.code));
    sections.push(format!(
        "Return the complete test file inside exactly one fenced ```{} block. Do not write anything outside the block.",
        r.language
    ));
    sections
}

fn push_bullets(sections: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let bullets: Vec<String> = items.iter().map(|item| format!("- {}", item)).collect();
    sections.push(format!("{}:\n{}", heading, bullets.join("\n")));
}

/// Output-format instruction with the JSON schema of `T` embedded.
pub fn json_instruction<T: JsonSchema>() -> String {
    let schema = schema_for!(T);
    let schema = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());
    format!("{}\n\nJSON schema:\n{}", JSON_INSTRUCTION, schema)
}

/// Wrap content in a code fence longer than any backtick run inside it.
pub fn fenced(info: &str, content: &str) -> String {
    let fence = "`".repeat(longest_backtick_run(content).max(2) + 1);
    format!("{fence}{info}\n{}\n{fence}", content.trim_end_matches('\n'))
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

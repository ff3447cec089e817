//! Response parser and validator.
//!
//! [`parse`] turns a raw model reply into a [`ParseOutcome`]. It never fails:
//! anything that cannot be located, decoded or validated comes back as a
//! [`DegradedResult`] carrying the reply text unmodified.
//!
//! # Grammar
//!
//! For JSON operations the structured block is, in order of preference:
//! 1. the first fenced block whose info string is `json` (any case);
//! 2. the first fenced block with no info string whose body starts with `{`;
//! 3. the whole reply, if it starts with `{` and ends with `}` once trimmed.
//!
//! The block must decode to a JSON object matching the operation's schema, with
//! every required field present and non-empty. Partial results are rejected.
//!
//! For docs and tests the structured block is the first closed fenced block of
//! any info string, and its body must be non-empty.

pub mod fence;

use serde::de::DeserializeOwned;

use crate::llm::ModelReply;
use crate::models::*;

struct Failure {
    reason: DegradeReason,
    detail: String,
}

impl Failure {
    fn new(reason: DegradeReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

/// Parse a model reply for the given operation.
pub fn parse(kind: OperationKind, reply: &ModelReply) -> ParseOutcome {
    parse_text(kind, &reply.text, reply.truncated)
}

/// Parse raw reply text. `truncated` marks replies cut off by the token limit.
pub fn parse_text(kind: OperationKind, text: &str, truncated: bool) -> ParseOutcome {
    if text.trim().is_empty() {
        let failure = Failure::new(DegradeReason::EmptyReply, "model returned no text");
        return degrade(kind, text, failure);
    }

    let parsed = match kind {
        OperationKind::PlanProject => decode_json::<ProjectPlan>(text).map(StructuredResult::Plan),
        OperationKind::RefinePlan => {
            decode_json::<ProjectPlan>(text).map(StructuredResult::RefinedPlan)
        }
        OperationKind::ReviewCode => decode_json::<CodeReview>(text).map(StructuredResult::Review),
        OperationKind::AnalyzeExecution => {
            decode_json::<ExecutionAnalysis>(text).map(StructuredResult::Analysis)
        }
        OperationKind::DebugError => {
            decode_json::<ExecutionAnalysis>(text).map(StructuredResult::Diagnosis)
        }
        OperationKind::ReviewDirectory => {
            decode_json::<CodeReview>(text).map(StructuredResult::DirectoryReview)
        }
        OperationKind::CompareImplementations => {
            decode_json::<ImplementationComparison>(text).map(StructuredResult::Comparison)
        }
        OperationKind::GenerateDocs => extract_artifact(text).map(StructuredResult::Documentation),
        OperationKind::GenerateTests => extract_artifact(text).map(StructuredResult::TestSuite),
    };

    match parsed {
        Ok(result) if result.kind() == kind => ParseOutcome::Structured(result),
        Ok(result) => degrade(
            kind,
            text,
            Failure::new(
                DegradeReason::SchemaViolation,
                format!("parsed a {} result for a {} request", result.kind(), kind),
            ),
        ),
        Err(failure) if truncated => degrade(
            kind,
            text,
            Failure::new(
                DegradeReason::Truncated,
                format!("reply hit the output token limit ({})", failure.detail),
            ),
        ),
        Err(failure) => degrade(kind, text, failure),
    }
}

fn degrade(kind: OperationKind, text: &str, failure: Failure) -> ParseOutcome {
    tracing::warn!(
        kind = kind.as_str(),
        reason = failure.reason.as_str(),
        "Could not structure model reply: {}",
        failure.detail
    );
    ParseOutcome::Degraded(DegradedResult {
        kind,
        reason: failure.reason,
        detail: failure.detail,
        raw_text: text.to_string(),
    })
}

/// Locate the structured JSON block in a reply.
pub fn locate_json_block(text: &str) -> Option<&str> {
    let blocks = fence::blocks(text);

    if let Some(block) = blocks.iter().find(|b| b.info == "json") {
        return Some(block.body);
    }
    if let Some(block) = blocks
        .iter()
        .find(|b| b.info.is_empty() && b.body.trim_start().starts_with('{'))
    {
        return Some(block.body);
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }
    None
}

fn decode_json<T: DeserializeOwned + Validate>(text: &str) -> Result<T, Failure> {
    let block = locate_json_block(text).ok_or_else(|| {
        Failure::new(DegradeReason::NoStructuredBlock, "no JSON block found in reply")
    })?;

    let value: serde_json::Value = serde_json::from_str(block)
        .map_err(|e| Failure::new(DegradeReason::InvalidJson, e.to_string()))?;
    if !value.is_object() {
        return Err(Failure::new(
            DegradeReason::SchemaViolation,
            "structured block is not a JSON object",
        ));
    }

    let decoded: T = serde_json::from_value(value)
        .map_err(|e| Failure::new(DegradeReason::SchemaViolation, e.to_string()))?;
    decoded
        .validate()
        .map_err(|e| Failure::new(DegradeReason::SchemaViolation, e))?;
    Ok(decoded)
}

fn extract_artifact(text: &str) -> Result<GeneratedArtifact, Failure> {
    let block = fence::blocks(text)
        .into_iter()
        .find(|b| b.closed)
        .ok_or_else(|| {
            Failure::new(DegradeReason::NoStructuredBlock, "no closed code block found in reply")
        })?;

    let artifact = GeneratedArtifact {
        language: Some(block.info).filter(|info| !info.is_empty()),
        content: block.body.to_string(),
    };
    artifact
        .validate()
        .map_err(|e| Failure::new(DegradeReason::SchemaViolation, e))?;
    Ok(artifact)
}

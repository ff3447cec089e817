//! Domain models for plan-mcp.
//!
//! # Request side
//!
//! - [`ToolRequest`]: one validated request per operation, tagged by [`OperationKind`].
//!
//! # Result side
//!
//! - [`ProjectPlan`], [`CodeReview`], [`ExecutionAnalysis`], [`ImplementationComparison`]:
//!   JSON shapes the model is asked to produce. Their JSON schema is embedded in the prompt.
//! - [`GeneratedArtifact`]: documentation or test code taken from a fenced block.
//! - [`StructuredResult`] / [`DegradedResult`]: the two outcomes of parsing a reply.
//!
//! All of these are request-scoped values; nothing is stored between calls.

mod analysis;
mod artifact;
mod comparison;
mod outcome;
mod plan;
mod request;
mod review;

pub use analysis::*;
pub use artifact::*;
pub use comparison::*;
pub use outcome::*;
pub use plan::*;
pub use request::*;
pub use review::*;

/// Semantic checks applied after a reply decodes into its typed shape.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("required field '{}' is empty", field))
    } else {
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use super::{require_text, Validate};

/// Generated documentation or test code, lifted out of a fenced block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Info string of the fence (`rust`, `markdown`, ...), if one was given.
    pub language: Option<String>,
    pub content: String,
}

impl Validate for GeneratedArtifact {
    fn validate(&self) -> Result<(), String> {
        require_text("content", &self.content)
    }
}

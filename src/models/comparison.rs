use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{require_text, Validate};

/// Side-by-side assessment of two implementations of the same behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImplementationComparison {
    /// Comparison summary
    pub summary: String,
    /// Functional and structural differences between the two
    #[serde(default)]
    pub differences: Vec<String>,
    /// Performance implications of each
    #[serde(default)]
    pub performance: Option<String>,
    /// Code quality and readability of each
    #[serde(default)]
    pub readability: Option<String>,
    /// How well each follows best practices
    #[serde(default)]
    pub best_practices: Option<String>,
    /// Which implementation to use
    pub recommendation: Preference,
    /// Why that implementation is recommended
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    First,
    Second,
    Either,
}

impl Preference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
            Self::Either => "either",
        }
    }
}

impl Validate for ImplementationComparison {
    fn validate(&self) -> Result<(), String> {
        require_text("summary", &self.summary)?;
        require_text("rationale", &self.rationale)
    }
}

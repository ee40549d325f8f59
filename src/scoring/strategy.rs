use serde::{Deserialize, Serialize};

/// Scoring backend selection; the only externally configurable knob of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringStrategy {
    /// Decode and compute on every call.
    #[default]
    Default,
    /// Decode once per document, shared across cursors of one factory.
    Cached,
    /// Delegate to a [`SimilarityEngine`](crate::engine::SimilarityEngine).
    External,
}

impl ScoringStrategy {
    pub const ALL: [ScoringStrategy; 3] = [Self::Default, Self::Cached, Self::External];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringStrategy::Default => "default",
            ScoringStrategy::Cached => "cached",
            ScoringStrategy::External => "external",
        }
    }
}

impl std::str::FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "cached" => Ok(Self::Cached),
            "external" => Ok(Self::External),
            _ => Err(format!("Unknown scoring strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

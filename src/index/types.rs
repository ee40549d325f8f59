use serde::{Deserialize, Serialize};

/// Segment-local document ordinal.
pub type LocalDocId = u32;

/// Segment-local ordinal plus segment base offset; unique within one execution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GlobalDocId(pub u64);

impl GlobalDocId {
    #[inline]
    pub const fn from_parts(doc_base: u64, local: LocalDocId) -> Self {
        GlobalDocId(doc_base + local as u64)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GlobalDocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

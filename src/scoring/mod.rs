//! Cosine scoring strategies and their per-segment cursors.
//!
//! A [`ScorerFactory`] fixes the strategy and owns its shared state:
//!
//! - `Default`: decode the document vector and compute on every call.
//! - `Cached`: decode once per [`GlobalDocId`](crate::index::GlobalDocId) into a
//!   [`VectorCache`] shared by every cursor of the factory.
//! - `External`: delegate to a [`SimilarityEngine`](crate::engine::SimilarityEngine)
//!   through a factory handle and per-context scorer handles.
//!
//! All three produce the same score within float tolerance:
//! `dot(q, d) / (|q| * |d|)`, with `|d|` taken from the trailing magnitude when the
//! document carries one.
//!
//! # Scorer handle donation
//!
//! Within one execution context at most one live cursor per query vector owns the
//! external scorer handle. Requesting another cursor for the same vector moves the
//! handle to the new cursor and marks the previous owner donated, so the handle is
//! destroyed exactly once no matter how many cursors were built on it.

pub mod cache;
pub mod cursor;
pub mod error;
pub mod factory;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use cache::VectorCache;
pub use cursor::{CursorLifecycle, CursorState, ScorerLease, ScoringCursor};
pub use error::{LifecycleError, ScoringError, ScoringResult};
pub use factory::{ExternalFactory, ScorerFactory};
pub use strategy::ScoringStrategy;

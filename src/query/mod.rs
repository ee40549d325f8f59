//! Query handles and their execution contexts.
//!
//! A [`VectorQuery`] is built once and may be executed many times. Each execution
//! gets an [`ExecutionContext`] which lazily creates one [`ScoringCursor`] per
//! segment that has values for the query's field. Closing the query cascades to
//! its contexts and their cursors; every level is idempotent and collects
//! failures in a [`DisposalReport`] instead of stopping.
//!
//! [`ScoringCursor`]: crate::scoring::ScoringCursor

pub mod context;
pub mod disposal;
pub mod handle;


pub use context::ExecutionContext;
pub use disposal::DisposalReport;
pub use handle::VectorQuery;

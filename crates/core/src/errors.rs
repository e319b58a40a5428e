//! Error types

use thiserror::Error;

/// Arithmetic-domain failures in price derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("degenerate pool state: {0}")]
    Degenerate(&'static str),
}

/// Feed-level failures, one variant per operation boundary.
///
/// All of these are caught where they occur and turned into connection
/// state + error message updates; none escape a session task.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Resolver returned no usable URL. Not retried by the core; the
    /// host may re-invoke session start.
    #[error("no usable endpoint configured: {0}")]
    Configuration(String),

    /// Initial snapshot read failed. The live channel is not attempted.
    #[error("snapshot fetch failed: {0}")]
    Fetch(String),

    /// Push channel failed to open, errored, or failed a liveness probe.
    /// Always followed by a scheduled retry.
    #[error("channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Price(#[from] PriceError),
}

pub type FeedResult<T> = Result<T, FeedError>;

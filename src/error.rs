//! Error types surfaced by the render pipeline.

use thiserror::Error;

/// Errors raised while building, reconciling or interacting with a chart.
///
/// IO and drawing failures at the crate boundary are reported through
/// `anyhow::Result` instead; these variants cover the chart's own contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    /// A requested column, metric or category does not exist.
    /// Fatal to the current render pass; nothing is committed.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Visibility state was read or mutated before `ensure` created it.
    #[error("no visibility state for series `{key}`")]
    StateLookup { key: String },

    /// A row could not be turned into a data point.
    #[error("row {row}: column `{column}` {reason}")]
    MalformedRow {
        row: usize,
        column: String,
        reason: String,
    },
}

impl ChartError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        ChartError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn missing_column(column: &str, available: &[String]) -> Self {
        ChartError::configuration(format!(
            "column `{column}` not found (available: {})",
            available.join(", ")
        ))
    }
}

/// Convenience alias for results carrying a [`ChartError`].
pub type ChartResult<T> = std::result::Result<T, ChartError>;

use thiserror::Error;

/// Typed error hierarchy for daily-start.
///
/// Use at module boundaries (data sources, storage, config validation, user input).
/// Internal/leaf functions can continue using `anyhow::Result`; the `Internal` variant
/// allows seamless conversion via the `?` operator.
#[derive(Debug, Error)]
pub enum DailyStartError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {source_name}: {message}")]
    Source {
        source_name: String,
        message: String,
        retryable: bool,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience alias for results using `DailyStartError`.
pub type DailyStartResult<T> = std::result::Result<T, DailyStartError>;

impl DailyStartError {
    pub fn source_failure(
        source_name: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self::Source {
            source_name: source_name.into(),
            message: message.into(),
            retryable,
        }
    }

    /// Whether this error is transient and the operation should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source { retryable, .. } => *retryable,
            Self::Internal(_) => true,
            Self::Config(_) | Self::Validation(_) | Self::Storage(_) => false,
        }
    }

    /// Validation failures are shown to the user verbatim; everything else is
    /// recovered locally and only logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests;

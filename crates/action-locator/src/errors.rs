//! Error types for locator system

use cdp_adapter::{AdapterError, AdapterErrorKind};
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// Element not found with any strategy
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Selector or strategy parameters are unusable
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Strategy execution failed
    #[error("Strategy '{strategy}' failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },

    /// Element handle belongs to a replaced page
    #[error("Stale handle: {0}")]
    StaleHandle(String),

    /// CDP communication error
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Timeout during resolution
    #[error("Resolution timeout: {0}")]
    Timeout(String),

    /// The browser behind the page is gone
    #[error("Session lost: {0}")]
    SessionLost(String),
}

impl LocatorError {
    pub fn strategy_failed(strategy: impl Into<String>, reason: impl ToString) -> Self {
        Self::StrategyFailed {
            strategy: strategy.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocatorError::Timeout(_) | LocatorError::CdpError(_))
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::SessionLost(_) => 3,
            LocatorError::CdpError(_) | LocatorError::Timeout(_) => 2,
            LocatorError::ElementNotFound(_)
            | LocatorError::StaleHandle(_)
            | LocatorError::StrategyFailed { .. } => 1,
            LocatorError::InvalidSelector(_) => 0,
        }
    }
}

impl From<AdapterError> for LocatorError {
    fn from(err: AdapterError) -> Self {
        match err.kind {
            AdapterErrorKind::StaleHandle => LocatorError::StaleHandle(err.to_string()),
            AdapterErrorKind::NavTimeout => LocatorError::Timeout(err.to_string()),
            AdapterErrorKind::TargetNotFound => LocatorError::ElementNotFound(err.to_string()),
            AdapterErrorKind::SessionLost => LocatorError::SessionLost(err.to_string()),
            _ => LocatorError::CdpError(err.to_string()),
        }
    }
}

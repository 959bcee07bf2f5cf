use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// High-level error categories surfaced by the page driver.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterErrorKind {
    #[error("navigation timed out")]
    NavTimeout,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("browser launch failed")]
    Launch,
    #[error("browser session lost")]
    SessionLost,
    #[error("target element not found")]
    TargetNotFound,
    #[error("element handle is stale")]
    StaleHandle,
    #[error("element is not interactable")]
    NotInteractable,
    #[error("script evaluation failed")]
    Script,
    #[error("internal error")]
    Internal,
}

/// Enriched error metadata passed back to higher layers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: false,
            data: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn stale(generation: u64, current: u64) -> Self {
        Self::new(AdapterErrorKind::StaleHandle).with_hint(format!(
            "handle from page generation {generation}, page is at {current}"
        ))
    }

    pub fn is_stale(&self) -> bool {
        self.kind == AdapterErrorKind::StaleHandle
    }

    pub fn session_lost(hint: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::SessionLost).with_hint(hint)
    }

    /// The session itself is unusable; nothing further can run on it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            AdapterErrorKind::Launch | AdapterErrorKind::SessionLost | AdapterErrorKind::Internal
        )
    }
}

impl From<chromiumoxide::error::CdpError> for AdapterError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;
        let kind = match &err {
            CdpError::Timeout => AdapterErrorKind::NavTimeout,
            CdpError::NotFound => AdapterErrorKind::TargetNotFound,
            CdpError::JavascriptException(_) => AdapterErrorKind::Script,
            // The websocket or the handler channel is gone with the browser.
            CdpError::Ws(_)
            | CdpError::ChannelSendError(_)
            | CdpError::NoResponse
            | CdpError::UnexpectedWsMessage(_) => AdapterErrorKind::SessionLost,
            CdpError::LaunchExit(..) | CdpError::LaunchTimeout(_) | CdpError::LaunchIo(..) => {
                AdapterErrorKind::Launch
            }
            _ => AdapterErrorKind::CdpIo,
        };
        let retriable = matches!(kind, AdapterErrorKind::NavTimeout | AdapterErrorKind::CdpIo);
        AdapterError::new(kind)
            .with_hint(err.to_string())
            .retriable(retriable)
    }
}

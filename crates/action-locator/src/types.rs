//! Core types for locator system

use cdp_adapter::ElementRef;
use serde::{Deserialize, Serialize};
use sockpuppet_core_types::ContentId;

/// A link resolved inside a listing container.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink {
    pub id: ContentId,
    pub url: String,
    pub element: ElementRef,
}

/// One swallowed strategy failure, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyFailure {
    pub strategy: String,
    pub reason: String,
}

/// Result of running a fallback chain.
#[derive(Debug, Clone)]
pub enum ChainOutcome<O> {
    /// First strategy that produced a value; later strategies never ran.
    Resolved {
        index: usize,
        strategy: String,
        output: O,
    },
    /// Every strategy missed or failed.
    Exhausted { failures: Vec<StrategyFailure> },
}

impl<O> ChainOutcome<O> {
    pub fn output(self) -> Option<O> {
        match self {
            ChainOutcome::Resolved { output, .. } => Some(output),
            ChainOutcome::Exhausted { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ChainOutcome::Resolved { .. })
    }

    /// Index of the winning strategy.
    pub fn winner(&self) -> Option<usize> {
        match self {
            ChainOutcome::Resolved { index, .. } => Some(*index),
            ChainOutcome::Exhausted { .. } => None,
        }
    }
}

//! Interaction engine for the audit agents
//!
//! This crate hides the volatility of the platform UI behind a small set of
//! capability operations:
//! - navigate with first-visit overlay dismissal
//! - entity list extraction through scope and link fallback chains
//! - click with fallback (direct, scripted, navigation)
//! - first visible clickable lookup and bounded multi-condition waits
//!
//! Every operation is an ordered strategy list with first-success semantics.
//! Only navigation and an exhausted click raise; everything else degrades to
//! an empty or no-op result.

pub mod errors;
mod primitives;
pub mod types;
mod waiting;

pub use errors::*;
pub use primitives::*;
pub use types::*;
pub use waiting::*;

//! Element location with first-success fallback chains.
//!
//! - Selector strategies (plain CSS, CSS filtered by text or accessible label)
//! - Link strategies resolving a content id inside a listing container
//! - [`FallbackChain`] running strategies in order until one produces a value

pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;

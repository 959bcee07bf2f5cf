//! Platform flows
//!
//! Composes interaction engine operations into the flows an agent uses: the
//! "watch a video" playback protocol and the platform listings (homepage,
//! up-next, search, channel popular list).

pub mod catalog;
pub mod errors;
pub mod platform;
pub mod playback;
pub mod surface;

pub use catalog::{ListingSpec, SelectorCatalog};
pub use errors::FlowError;
pub use platform::Platform;
pub use playback::{PlaybackController, PlaybackReport, PlaybackState};
pub use surface::{YoutubeSurface, DEFAULT_SEARCH_SCROLL_STEPS};

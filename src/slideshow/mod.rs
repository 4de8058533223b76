//! Slideshow sessions: a two-party shared viewing state with a single
//! controller, synchronized over the delivery protocol.
//!
//! ```text
//!   no session --start--> active --stop--> no session
//!                          |  ^
//!                          +--+ navigate / transfer_control / update_auto_advance
//! ```

mod coordinator;
mod store;
mod types;

pub use coordinator::SlideshowCoordinator;
pub use store::{MemorySlideshowStore, SlideshowStore};
pub use types::{
    is_valid_interval, AutoAdvanceRequest, NavigateRequest, SlideshowError, SlideshowResult,
    SlideshowSession, SlideshowType, StartSlideshowRequest, AUTO_ADVANCE_INTERVALS,
    DEFAULT_AUTO_ADVANCE_INTERVAL,
};

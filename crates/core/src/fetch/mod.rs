//! Subtitle lookup orchestration and final-output caching.

mod cache;
mod coordinator;
mod lang;
mod types;

pub use coordinator::FetchCoordinator;
pub use lang::serve_code;
pub use types::{CaptionError, CaptionPayload, CaptionRequest, ResolvedTrack, SubtitleRequest};

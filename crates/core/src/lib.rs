pub mod archive;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod matcher;
pub mod metrics;
pub mod queue;
pub mod testing;
pub mod transcode;

pub use catalog::{CatalogClient, CatalogEntry, CatalogError, HttpCatalogClient};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError,
};
pub use fetch::{
    CaptionError, CaptionPayload, CaptionRequest, FetchCoordinator, ResolvedTrack,
    SubtitleRequest,
};
pub use queue::QueueRegistry;

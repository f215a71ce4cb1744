//! Resource resolution and download
//!
//! - [`resolve`]: raw references to a deduplicated plan with local paths
//! - [`download`]: bounded-concurrency fetches into the output directory
//! - [`map`]: the resulting original-URL → local-file table

pub mod download;
pub mod map;
pub mod resolve;

pub use download::ResourceDownloader;
pub use map::{AssetMap, DownloadStatus, ResourceRecord, ResourceType, StatusCounts};
pub use resolve::{
    collect_background_images, file_name_for, resolve_reference, FilenameAllocator,
    PlannedResource, ResourcePlan, ResourceResolver, BACKGROUND_IMAGE_SCRIPT,
    CONSOLIDATED_CSS_PATH, CONSOLIDATED_JS_PATH,
};

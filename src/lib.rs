//! SiteMirror - Render, Mirror, and Analyze a Live Web Page
//!
//! This crate loads a page in a headless Chromium, extracts a structured
//! model of its markup and resources, downloads those resources, rewrites
//! the document to use the local copies, and writes an analysis report with
//! a few scaffold files next to it.
//!
//! # Features
//!
//! - **Browser Driver**: Headless Chromium via ChromiumOxide (CDP) behind the
//!   narrow [`PageDriver`](browser::PageDriver) seam
//! - **Extraction**: One in-page pass for metadata, resources, links, forms,
//!   structure and technology detection
//! - **Assets**: Deduplicated, bounded-concurrency downloads with per-resource
//!   failure isolation
//! - **Rewriting**: Local references, absolute fallbacks, mirror banner
//! - **Reports**: JSON and HTML analysis plus React/Vue/Docker scaffolds
//!
//! # Architecture
//!
//! ```text
//! MirrorJob ──▶ Browser Session (CDP) ──▶ Extraction
//!                                              │
//!                       ┌──────────────────────┴─────┐
//!                       ▼                            ▼
//!                 Resolver/Downloader       Style/Script Capture
//!                       │                            │
//!                       └──────────────┬─────────────┘
//!                                      ▼
//!                            Rewriter ──▶ Reports
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sitemirror::{mirror, MirrorConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = MirrorConfig::builder("https://example.com").build();
//!     let outcome = mirror(config).await;
//!
//!     println!("{}: {:?}", outcome.state, outcome.artifacts);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod assets;
pub mod browser;
pub mod config;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod report;
pub mod rewrite;

// Re-exports for convenience
pub use assets::{AssetMap, ResourceRecord, ResourceType};
pub use browser::{BrowserConfig, BrowserSession, PageDriver};
pub use config::{MirrorConfig, MirrorConfigBuilder};
pub use error::{Error, Result};
pub use extraction::{ExtractedPageModel, PageExtractor};
pub use pipeline::{mirror, JobState, MirrorJob, MirrorOutcome};
pub use report::AnalysisReport;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

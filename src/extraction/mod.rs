//! Page extraction module
//!
//! Builds the [`ExtractedPageModel`] from the rendered page in one script
//! evaluation, captures consolidated styles and inline scripts, and offers a
//! static HTML fallback when the page cannot be queried.

pub mod document;
pub mod links;
pub mod metadata;
pub mod page;
pub mod resources;
pub mod structure;
pub mod styles;
pub mod technology;

pub use document::StaticExtractor;
pub use links::{LinkRef, LinkType, NavigationBlock};
pub use metadata::MetadataExtractor;
pub use page::{page_model_script, ExtractedPageModel, PageExtractor};
pub use resources::{srcset_pairs, srcset_urls, ImageRef};
pub use structure::{AccessibilityFlags, ContentBlock, FormField, FormSchema, PerformanceMetrics};
pub use styles::{CapturedSheet, StyleCapture, StyleExtractor, STYLE_CAPTURE_SCRIPT};
pub use technology::{detection_section, TechnologyProbe, TECHNOLOGY_PROBES};

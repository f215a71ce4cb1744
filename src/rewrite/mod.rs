//! Document rewriting
//!
//! Points the rendered document and downloaded stylesheets at local copies,
//! then adds the mirror banner and diagnostic script.

pub mod css;
pub mod document;
pub mod inject;

pub use css::{relative_path, rewrite_captured_css, rewrite_stylesheet_files, CssRewriter};
pub use document::{DocumentRewriter, RewriteStats};
pub use inject::{inject, InjectionContext, BANNER_ID, INSPECTOR_ID};

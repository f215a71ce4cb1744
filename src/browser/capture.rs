//! Rendered document capture
//!
//! Serializes the live DOM (doctype included) after the page has settled.
//! This is what the rewriter works on, not the raw HTTP response.

use crate::browser::driver::PageDriver;
use crate::error::{ExtractionError, Result};
use tracing::{debug, instrument};

/// Serializes the doctype and `documentElement.outerHTML`.
pub const DOCUMENT_HTML_SCRIPT: &str = r#"
    (() => {
        const doctype = document.doctype
            ? new XMLSerializer().serializeToString(document.doctype)
            : '<!DOCTYPE html>';
        return doctype + '\n' + document.documentElement.outerHTML;
    })()
"#;

/// Page capture functionality
pub struct PageCapture;

impl PageCapture {
    /// Capture the rendered HTML of the current page
    #[instrument(skip(driver))]
    pub async fn html<D: PageDriver>(driver: &D) -> Result<String> {
        let value = driver.evaluate(DOCUMENT_HTML_SCRIPT).await?;
        let html = value
            .as_str()
            .ok_or_else(|| {
                ExtractionError::UnexpectedShape("document HTML was not a string".to_string())
            })?
            .to_string();

        debug!("HTML captured: {} bytes", html.len());
        Ok(html)
    }
}

//! The narrow seam between the pipeline and the rendering engine
//!
//! Everything past page acquisition talks to the page through
//! [`PageDriver`]. The real implementation is
//! [`BrowserSession`](super::BrowserSession); tests drive the pipeline with
//! a synthetic page instead.

use crate::browser::navigation::{LoadOptions, NavigationResult};
use crate::error::{ExtractionError, Result};
use serde::de::DeserializeOwned;

/// A single rendered page that can be navigated, queried, and released.
///
/// Calls take `&self` on one page and are awaited one after another; a
/// driver is never shared between concurrent tasks.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// Navigate to `url` and wait according to `options`.
    async fn navigate(&self, url: &str, options: &LoadOptions) -> Result<NavigationResult>;

    /// Evaluate a JSON-returning expression in the page.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Release the page and the engine behind it.
    async fn close(self) -> Result<()>
    where
        Self: Sized;

    /// Evaluate and deserialize the result into `T`.
    async fn evaluate_as<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let value = self.evaluate(script).await?;
        serde_json::from_value(value)
            .map_err(|e| ExtractionError::UnexpectedShape(e.to_string()).into())
    }
}

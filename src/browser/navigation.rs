//! Page navigation functionality
//!
//! This module handles URL validation, navigation with a hard timeout, the
//! network-idle wait, and the settle delay that lets client-side rendering
//! finish mutating the DOM before extraction begins.

use crate::error::{Error, LoadError, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Options for loading the target page
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Navigation budget in milliseconds, covering the idle wait (default: 30000)
    pub timeout_ms: u64,
    /// Wait until condition (default: network idle)
    pub wait_until: WaitUntil,
    /// Quiescence delay after the wait condition is met (default: 2000)
    pub settle_ms: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            wait_until: WaitUntil::NetworkIdle,
            settle_ms: 2000,
        }
    }
}

/// Condition to wait for after navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// Wait until load event fires
    Load,
    /// Wait until DOMContentLoaded event fires
    DomContentLoaded,
    /// Wait until the document is complete and no new resources start for 500ms
    NetworkIdle,
}

impl WaitUntil {
    /// In-page promise that resolves once the condition holds
    pub fn script(self) -> &'static str {
        match self {
            WaitUntil::Load => {
                r#"
                    new Promise(resolve => {
                        if (document.readyState === 'complete') {
                            resolve(true);
                        } else {
                            window.addEventListener('load', () => resolve(true));
                        }
                    })
                "#
            }
            WaitUntil::DomContentLoaded => {
                r#"
                    new Promise(resolve => {
                        if (document.readyState !== 'loading') {
                            resolve(true);
                        } else {
                            document.addEventListener('DOMContentLoaded', () => resolve(true));
                        }
                    })
                "#
            }
            WaitUntil::NetworkIdle => {
                r#"
                    new Promise(resolve => {
                        const quietMs = 500;
                        const count = () => performance.getEntriesByType('resource').length;
                        let last = count();
                        let stableSince = Date.now();
                        const tick = () => {
                            const now = count();
                            if (now !== last) {
                                last = now;
                                stableSince = Date.now();
                            }
                            if (document.readyState === 'complete' && Date.now() - stableSince >= quietMs) {
                                resolve(true);
                            } else {
                                setTimeout(tick, 100);
                            }
                        };
                        tick();
                    })
                "#
            }
        }
    }
}

/// Result of a navigation operation
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// Final URL after any redirects
    pub final_url: String,
    /// Navigation duration in milliseconds, settle delay included
    pub duration_ms: u64,
}

/// URL validation utilities
pub struct UrlValidator;

impl UrlValidator {
    /// Validate a URL for navigation
    pub fn validate(url: &str) -> std::result::Result<(), String> {
        if url.is_empty() {
            return Err("URL cannot be empty".to_string());
        }

        if !url.starts_with("http://")
            && !url.starts_with("https://")
            && !url.starts_with("file://")
        {
            return Err(format!(
                "URL must start with http://, https://, or file://: {}",
                url
            ));
        }

        if url.len() > 2048 {
            return Err("URL exceeds maximum length of 2048 characters".to_string());
        }

        url::Url::parse(url).map_err(|e| format!("URL could not be parsed: {}", e))?;

        Ok(())
    }
}

/// Page navigator
pub struct PageNavigator;

impl PageNavigator {
    /// Navigate, wait for the configured condition, then hold for the settle delay
    #[instrument(skip(page, opts))]
    pub async fn load(
        page: &chromiumoxide::Page,
        url: &str,
        opts: &LoadOptions,
    ) -> Result<NavigationResult> {
        UrlValidator::validate(url).map_err(LoadError::InvalidUrl)?;

        info!("Navigating to: {}", url);
        let start = Instant::now();
        let budget = Duration::from_millis(opts.timeout_ms);

        tokio::time::timeout(budget, page.goto(url))
            .await
            .map_err(|_| LoadError::Timeout(opts.timeout_ms))?
            .map_err(|e| LoadError::LoadFailed(e.to_string()))?;

        let remaining = budget.saturating_sub(start.elapsed());
        tokio::time::timeout(remaining, page.evaluate(opts.wait_until.script()))
            .await
            .map_err(|_| LoadError::Timeout(opts.timeout_ms))?
            .map_err(|e| LoadError::LoadFailed(e.to_string()))?;

        debug!("Wait condition met, settling for {}ms", opts.settle_ms);
        tokio::time::sleep(Duration::from_millis(opts.settle_ms)).await;

        let final_url = page
            .url()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?
            .unwrap_or_else(|| url.to_string());

        let duration_ms = start.elapsed().as_millis() as u64;
        info!("Loaded {} in {}ms", final_url, duration_ms);

        Ok(NavigationResult {
            final_url,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_options_default() {
        let opts = LoadOptions::default();
        assert_eq!(opts.timeout_ms, 30000);
        assert_eq!(opts.wait_until, WaitUntil::NetworkIdle);
        assert_eq!(opts.settle_ms, 2000);
    }

    #[test]
    fn test_network_idle_script_checks_resource_entries() {
        let script = WaitUntil::NetworkIdle.script();
        assert!(script.contains("getEntriesByType('resource')"));
        assert!(script.contains("readyState === 'complete'"));
    }

    #[test]
    fn test_url_validation_valid_https() {
        assert!(UrlValidator::validate("https://example.com").is_ok());
    }

    #[test]
    fn test_url_validation_empty() {
        let result = UrlValidator::validate("");
        assert!(result.unwrap_err().contains("empty"));
    }

    #[test]
    fn test_url_validation_no_protocol() {
        let result = UrlValidator::validate("example.com");
        assert!(result.unwrap_err().contains("must start with"));
    }

    #[test]
    fn test_url_validation_invalid_protocol() {
        assert!(UrlValidator::validate("ftp://example.com").is_err());
    }

    #[test]
    fn test_url_validation_unparseable_host() {
        assert!(UrlValidator::validate("http://exa mple.com").is_err());
    }

    #[test]
    fn test_url_validation_too_long() {
        let long_url = format!("https://example.com/{}", "a".repeat(3000));
        let result = UrlValidator::validate(&long_url);
        assert!(result.unwrap_err().contains("maximum length"));
    }
}

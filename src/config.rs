//! Job configuration
//!
//! [`MirrorConfig`] gathers everything a mirror job needs: where to write,
//! how to launch the browser, how long to wait for the page, and how to
//! fetch resources. The CLI maps its flags onto the builder.

use crate::browser::{BrowserConfig, LoadOptions};
use std::path::PathBuf;

/// User agent used by the browser page and every resource fetch
pub const MIRROR_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 SiteMirror/0.1";

/// Resource fetching settings
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Maximum downloads in flight (default: 6)
    pub concurrency: usize,
    /// Per-resource timeout in milliseconds (default: 15000)
    pub timeout_ms: u64,
    /// Extra attempts for transient failures (default: 0)
    pub retries: u32,
    /// Delay between attempts in milliseconds (default: 500)
    pub retry_backoff_ms: u64,
    /// Largest body stored for one resource, in bytes (default: 50 MiB)
    pub max_bytes: u64,
    /// User agent for resource requests
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            timeout_ms: 15000,
            retries: 0,
            retry_backoff_ms: 500,
            max_bytes: 50 * 1024 * 1024,
            user_agent: MIRROR_USER_AGENT.to_string(),
        }
    }
}

/// Full configuration for one mirror job
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Page to mirror
    pub target_url: String,
    /// Root directory for all output
    pub output_dir: PathBuf,
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// Navigation settings
    pub load: LoadOptions,
    /// Resource fetch settings
    pub download: DownloadConfig,
}

impl MirrorConfig {
    /// Create a new config builder for `target_url`
    pub fn builder<S: Into<String>>(target_url: S) -> MirrorConfigBuilder {
        let target_url = target_url.into();
        let output_dir = default_output_dir(&target_url);
        MirrorConfigBuilder {
            config: MirrorConfig {
                target_url,
                output_dir,
                browser: BrowserConfig::default(),
                load: LoadOptions::default(),
                download: DownloadConfig::default(),
            },
        }
    }
}

/// `cloned-<host>` in the working directory, or `cloned-website` when the
/// URL has no host
pub fn default_output_dir(target_url: &str) -> PathBuf {
    let host = url::Url::parse(target_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.replace(':', "_")));
    match host {
        Some(host) if !host.is_empty() => PathBuf::from(format!("cloned-{}", host)),
        _ => PathBuf::from("cloned-website"),
    }
}

/// Builder for MirrorConfig
pub struct MirrorConfigBuilder {
    config: MirrorConfig,
}

impl MirrorConfigBuilder {
    /// Set the output directory
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Replace the browser settings
    pub fn browser(mut self, browser: BrowserConfig) -> Self {
        self.config.browser = browser;
        self
    }

    /// Set the navigation timeout
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.load.timeout_ms = ms;
        self
    }

    /// Set the settle delay
    pub fn settle_ms(mut self, ms: u64) -> Self {
        self.config.load.settle_ms = ms;
        self
    }

    /// Set the download concurrency; zero is raised to one
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.download.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-resource timeout
    pub fn resource_timeout_ms(mut self, ms: u64) -> Self {
        self.config.download.timeout_ms = ms;
        self
    }

    /// Set the retry count for transient resource failures
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.download.retries = retries;
        self
    }

    /// Set the delay between retry attempts
    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.download.retry_backoff_ms = ms;
        self
    }

    /// Set the largest body stored for one resource
    pub fn max_resource_bytes(mut self, bytes: u64) -> Self {
        self.config.download.max_bytes = bytes;
        self
    }

    /// Build the config
    pub fn build(self) -> MirrorConfig {
        self.config
    }
}

//! Browser lifecycle management
//!
//! This module handles browser launch, page preparation, and shutdown.

use crate::browser::driver::PageDriver;
use crate::browser::navigation::{LoadOptions, NavigationResult, PageNavigator};
use crate::config::MIRROR_USER_AGENT;
use crate::error::{BrowserError, Error, ExtractionError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Flags passed to every engine instance.
pub const HARDENING_FLAGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-extensions",
    "--disable-background-networking",
    "--mute-audio",
];

/// Configuration for browser launch
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode (default: true)
    pub headless: bool,
    /// Browser viewport width (default: 1920)
    pub width: u32,
    /// Browser viewport height (default: 1080)
    pub height: u32,
    /// Enable sandbox (default: true)
    pub sandbox: bool,
    /// User agent string sent by the page
    pub user_agent: String,
    /// Path to Chrome/Chromium executable (None = auto-detect)
    pub chrome_path: Option<String>,
    /// Additional Chrome arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1920,
            height: 1080,
            sandbox: true,
            user_agent: MIRROR_USER_AGENT.to_string(),
            chrome_path: None,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Create a new config builder
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }

    /// Every argument handed to the engine, hardening flags first
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = HARDENING_FLAGS.iter().map(|f| f.to_string()).collect();
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Builder for BrowserConfig
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Set viewport dimensions
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Enable/disable sandbox
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    /// Set user agent
    pub fn user_agent<S: Into<String>>(mut self, ua: S) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Set Chrome path
    pub fn chrome_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    /// Add extra Chrome argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    /// Build the config
    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

/// One launched engine with the single page a mirror job works on
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    /// Launch the engine, open one page, and apply user agent and viewport
    #[instrument(skip(config))]
    pub async fn initialize(config: &BrowserConfig) -> Result<Self> {
        info!("Launching browser: headless={}", config.headless);

        let mut builder = CdpBrowserConfig::builder()
            .viewport(chromiumoxide::handler::viewport::Viewport {
                width: config.width,
                height: config.height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .window_size(config.width, config.height);

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        for arg in config.launch_args() {
            builder = builder.arg(arg);
        }

        let cdp_config = builder.build().map_err(BrowserError::ConfigError)?;

        let (mut browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    warn!("Browser handler event error");
                    break;
                }
            }
            debug!("Browser handler finished");
        });

        let page = match Self::open_page(&browser, config).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!("Failed to close browser after page setup error: {}", close_err);
                }
                handler_task.abort();
                return Err(e);
            }
        };

        info!("Browser launched successfully");

        Ok(Self {
            browser,
            handler: handler_task,
            page,
        })
    }

    async fn open_page(browser: &Browser, config: &BrowserConfig) -> Result<Page> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

        page.execute(SetUserAgentOverrideParams::new(config.user_agent.clone()))
            .await
            .map_err(|e| BrowserError::PageSetupFailed(e.to_string()))?;

        debug!("Page ready with user agent {}", config.user_agent);
        Ok(page)
    }
}

impl PageDriver for BrowserSession {
    async fn navigate(&self, url: &str, options: &LoadOptions) -> Result<NavigationResult> {
        PageNavigator::load(&self.page, url, options).await
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let value = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ExtractionError::JsExecutionFailed(e.to_string()))?
            .into_value::<serde_json::Value>()
            .map_err(|e| ExtractionError::UnexpectedShape(e.to_string()))?;
        Ok(value)
    }

    #[instrument(skip(self))]
    async fn close(mut self) -> Result<()> {
        info!("Closing browser");

        self.browser
            .close()
            .await
            .map_err(|e| Error::cdp(e.to_string()))?;

        // Wait for handler to finish
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handler).await;

        info!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_config_default() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.width, 1920);
        assert_eq!(config.height, 1080);
        assert!(config.sandbox);
        assert_eq!(config.user_agent, MIRROR_USER_AGENT);
    }

    #[test]
    fn test_launch_args_include_hardening_flags() {
        let args = BrowserConfig::default().launch_args();
        for flag in HARDENING_FLAGS {
            assert!(args.iter().any(|a| a == flag), "missing {}", flag);
        }
        assert!(!args.iter().any(|a| a == "--no-sandbox"));
    }

    #[test]
    fn test_launch_args_without_sandbox() {
        let config = BrowserConfig::builder()
            .sandbox(false)
            .arg("--lang=en-US")
            .build();
        let args = config.launch_args();
        assert!(args.iter().any(|a| a == "--no-sandbox"));
        assert_eq!(args.last().map(String::as_str), Some("--lang=en-US"));
    }
}

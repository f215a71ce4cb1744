//! Shared test fixtures: a scripted page that stands in for the browser

#![allow(dead_code)]

use serde_json::{json, Value};
use sitemirror::assets::BACKGROUND_IMAGE_SCRIPT;
use sitemirror::browser::{LoadOptions, NavigationResult, PageDriver, DOCUMENT_HTML_SCRIPT};
use sitemirror::error::{ExtractionError, LoadError, Result};
use sitemirror::extraction::{page_model_script, StaticExtractor, STYLE_CAPTURE_SCRIPT};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A page whose script results are fixed up front
pub struct FakePage {
    responses: HashMap<String, Value>,
    fail_navigation: bool,
    closes: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakePage {
    /// A page with no scripted responses
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fail_navigation: false,
            closes: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A page that renders `html` at `url`, with the model the static
    /// extractor reads from the same markup
    pub fn from_html(url: &str, html: &str) -> Self {
        let model = StaticExtractor::extract(html, url);
        Self::new()
            .respond(DOCUMENT_HTML_SCRIPT, Value::String(html.to_string()))
            .respond(&page_model_script(), serde_json::to_value(model).unwrap())
            .respond(BACKGROUND_IMAGE_SCRIPT, json!([]))
            .respond(
                STYLE_CAPTURE_SCRIPT,
                json!({
                    "sheets": [{"href": null, "rules": ["body { margin: 0px; }"]}],
                    "readableSheets": 1,
                    "skippedSheets": 0,
                    "inlineScripts": ["console.log('hi');"]
                }),
            )
    }

    /// Answer `script` with `value`
    pub fn respond(mut self, script: &str, value: Value) -> Self {
        self.responses.insert(script.to_string(), value);
        self
    }

    /// Make `script` fail
    pub fn without(mut self, script: &str) -> Self {
        self.responses.remove(script);
        self
    }

    /// Make navigation time out
    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Counter of `close` calls, shared with the page
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    /// Log of page calls, shared with the page
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

impl PageDriver for FakePage {
    async fn navigate(&self, url: &str, options: &LoadOptions) -> Result<NavigationResult> {
        self.calls.lock().unwrap().push(format!("navigate {}", url));
        if self.fail_navigation {
            return Err(LoadError::Timeout(options.timeout_ms).into());
        }
        Ok(NavigationResult {
            final_url: url.to_string(),
            duration_ms: 0,
        })
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        self.calls.lock().unwrap().push("evaluate".to_string());
        self.responses
            .get(script)
            .cloned()
            .ok_or_else(|| ExtractionError::JsExecutionFailed("script not scripted".to_string()).into())
    }

    async fn close(self) -> Result<()> {
        self.calls.lock().unwrap().push("close".to_string());
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

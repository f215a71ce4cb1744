//! Style and inline script consolidation
//!
//! Best-effort capture of the page's effective CSS (every CSSOM rule the
//! page can read) and the bodies of its inline scripts. The output is
//! supplementary; per-resource downloads remain what the mirror is built
//! from.

use crate::browser::PageDriver;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Walks `document.styleSheets` and inline `<script>` elements.
pub const STYLE_CAPTURE_SCRIPT: &str = r#"
    (() => {
        const sheets = [];
        let readableSheets = 0;
        let skippedSheets = 0;
        Array.from(document.styleSheets).forEach(sheet => {
            let sheetRules;
            try {
                sheetRules = sheet.cssRules;
            } catch (e) {
                skippedSheets += 1;
                return;
            }
            if (!sheetRules) {
                skippedSheets += 1;
                return;
            }
            readableSheets += 1;
            sheets.push({
                href: sheet.href || null,
                rules: Array.from(sheetRules).map(rule => rule.cssText)
            });
        });

        const inlineScripts = [];
        document.querySelectorAll('script:not([src])').forEach(el => {
            const body = el.textContent || '';
            if (body.trim().length > 0) inlineScripts.push(body);
        });

        return {
            sheets: sheets,
            readableSheets: readableSheets,
            skippedSheets: skippedSheets,
            inlineScripts: inlineScripts
        };
    })()
"#;

/// Rules read from one stylesheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapturedSheet {
    /// URL of the sheet; `None` for `<style>` blocks. Relative `url(...)`
    /// values in the rules are relative to this.
    pub href: Option<String>,
    /// cssText of each rule, in order
    pub rules: Vec<String>,
}

/// Raw result of the style capture script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleCapture {
    /// Readable sheets in document order
    pub sheets: Vec<CapturedSheet>,
    /// Sheets whose rules were read
    pub readable_sheets: usize,
    /// Sheets skipped because reading them threw (cross-origin)
    pub skipped_sheets: usize,
    /// Non-empty inline script bodies
    pub inline_scripts: Vec<String>,
}

impl StyleCapture {
    /// Number of captured rules across all sheets
    pub fn rule_count(&self) -> usize {
        self.sheets.iter().map(|s| s.rules.len()).sum()
    }

    /// All readable rules as one stylesheet, as captured
    pub fn consolidated_css(&self) -> String {
        self.consolidate(|sheet| sheet.rules.join("\n"))
    }

    /// One stylesheet built from `render(sheet)` for each sheet, each
    /// preceded by a comment naming its origin
    pub fn consolidate<F>(&self, mut render: F) -> String
    where
        F: FnMut(&CapturedSheet) -> String,
    {
        let mut css = String::from("/* Consolidated stylesheet captured from the rendered page */\n");
        for sheet in &self.sheets {
            let origin = sheet.href.as_deref().unwrap_or("inline style");
            css.push_str(&format!("\n/* ---- {} ---- */\n", origin.replace("*/", "*\\/")));
            css.push_str(&render(sheet));
            css.push('\n');
        }
        css
    }

    /// Inline script bodies joined with separator comments
    pub fn consolidated_js(&self) -> String {
        let mut js = String::from("/* Inline scripts captured from the rendered page */\n");
        for (i, body) in self.inline_scripts.iter().enumerate() {
            js.push_str(&format!("\n/* ---- inline script {} ---- */\n", i + 1));
            js.push_str(body.trim());
            js.push('\n');
        }
        js
    }
}

/// Style/script extractor
pub struct StyleExtractor;

impl StyleExtractor {
    /// Capture CSSOM rules and inline scripts from the current page
    #[instrument(skip(driver))]
    pub async fn capture<D: PageDriver>(driver: &D) -> Result<StyleCapture> {
        let capture: StyleCapture = driver.evaluate_as(STYLE_CAPTURE_SCRIPT).await?;
        debug!(
            "Captured {} rules from {} sheets ({} skipped), {} inline scripts",
            capture.rule_count(),
            capture.readable_sheets,
            capture.skipped_sheets,
            capture.inline_scripts.len()
        );
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consolidated_js_separators() {
        let capture = StyleCapture {
            inline_scripts: vec!["var a = 1;".to_string(), "  console.log(a);\n".to_string()],
            ..Default::default()
        };
        let js = capture.consolidated_js();
        assert!(js.contains("/* ---- inline script 1 ---- */\nvar a = 1;"));
        assert!(js.contains("/* ---- inline script 2 ---- */\nconsole.log(a);"));
    }

    #[test]
    fn test_consolidated_css_keeps_rule_order() {
        let capture = StyleCapture {
            sheets: vec![
                CapturedSheet {
                    href: Some("https://example.com/css/site.css".to_string()),
                    rules: vec!["body { margin: 0px; }".to_string()],
                },
                CapturedSheet {
                    href: None,
                    rules: vec!["h1 { color: red; }".to_string()],
                },
            ],
            readable_sheets: 2,
            ..Default::default()
        };
        let css = capture.consolidated_css();
        let site = css.find("/* ---- https://example.com/css/site.css ---- */").unwrap();
        let body = css.find("body").unwrap();
        let inline = css.find("/* ---- inline style ---- */").unwrap();
        let h1 = css.find("h1").unwrap();
        assert!(site < body && body < inline && inline < h1);
        assert_eq!(capture.rule_count(), 2);
    }

    #[test]
    fn test_capture_keeps_sheet_href() {
        let capture: StyleCapture = serde_json::from_value(serde_json::json!({
            "sheets": [
                {"href": "https://example.com/css/site.css", "rules": ["a { color: red; }"]},
                {"href": null, "rules": []}
            ],
            "readableSheets": 2,
            "skippedSheets": 1,
            "inlineScripts": []
        }))
        .unwrap();
        assert_eq!(capture.sheets[0].href.as_deref(), Some("https://example.com/css/site.css"));
        assert!(capture.sheets[1].href.is_none());
        assert_eq!(capture.skipped_sheets, 1);
    }
}

//! `url(...)` rewriting for CSS text
//!
//! Used for `<style>` blocks and `style=""` attributes in the document, the
//! consolidated stylesheet, and every downloaded stylesheet file. A URL that
//! resolves to a stored resource becomes a path relative to the CSS
//! location; anything else that resolves becomes absolute.

use crate::assets::{resolve_reference, AssetMap, ResourceType, CONSOLIDATED_CSS_PATH};
use crate::extraction::StyleCapture;
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};
use url::Url;

pub(crate) fn regex(pattern: &'static str, desc: &'static str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid {desc} regex: {err}"))
}

fn css_url_regex() -> &'static Regex {
    static CSS_URL: OnceLock<Regex> = OnceLock::new();
    CSS_URL.get_or_init(|| {
        regex(
            r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^\s"')][^)]*?))\s*\)"#,
            "css url",
        )
    })
}

/// Path from directory `from_dir` to `target`, both relative to the output
/// root and `/`-separated
pub fn relative_path(from_dir: &str, target: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat("..").take(from.len() - common));
    parts.extend(&to[common..]);
    parts.join("/")
}

/// Rewrites `url(...)` references in CSS text
pub struct CssRewriter<'a> {
    base: &'a Url,
    assets: &'a AssetMap,
    from_dir: &'a str,
}

impl<'a> CssRewriter<'a> {
    /// References resolve against `base`; local paths are made relative to
    /// `from_dir` (`""` for the document, `"assets/css"` for stylesheets)
    pub fn new(base: &'a Url, assets: &'a AssetMap, from_dir: &'a str) -> Self {
        Self {
            base,
            assets,
            from_dir,
        }
    }

    /// Rewrite every `url(...)` in `css`
    pub fn rewrite(&self, css: &str) -> String {
        css_url_regex()
            .replace_all(css, |caps: &Captures| self.rewrite_one(caps))
            .into_owned()
    }

    fn rewrite_one(&self, caps: &Captures) -> String {
        let original = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let (raw, quote) = match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(m), _, _) => (m.as_str(), '"'),
            (_, Some(m), _) => (m.as_str(), '\''),
            (_, _, Some(m)) => (m.as_str(), '"'),
            _ => return original.to_string(),
        };

        match self.map_reference(raw) {
            Some(mapped) if mapped != raw => format!("url({quote}{mapped}{quote})"),
            _ => original.to_string(),
        }
    }

    /// Local relative path or absolute URL for one reference
    pub fn map_reference(&self, raw: &str) -> Option<String> {
        let url = resolve_reference(self.base, raw)?;
        match self.assets.local_path(url.as_str()) {
            Some(local) => Some(relative_path(self.from_dir, local)),
            None => Some(url.to_string()),
        }
    }
}

/// Rewrite `url(...)` references inside every downloaded stylesheet.
///
/// Each file is resolved against its own original URL. Files that cannot be
/// read as UTF-8 or written back are reported and left as downloaded.
pub async fn rewrite_stylesheet_files(output_root: &Path, assets: &AssetMap) -> Vec<String> {
    let mut warnings = Vec::new();
    let css_dir = ResourceType::Css.directory();
    let from_dir = format!("assets/{}", css_dir);

    for record in assets
        .iter()
        .filter(|r| r.is_ok() && r.resource_type == ResourceType::Css)
        .filter(|r| r.local_relative_path != CONSOLIDATED_CSS_PATH)
    {
        let Ok(base) = Url::parse(&record.original_url) else {
            continue;
        };
        let path = output_root.join(&record.local_relative_path);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warnings.push(format!("Could not read {}: {}", path.display(), e));
                continue;
            }
        };
        let Ok(text) = String::from_utf8(bytes) else {
            debug!("Skipping non-UTF-8 stylesheet {}", path.display());
            continue;
        };

        let rewritten = CssRewriter::new(&base, assets, &from_dir).rewrite(&text);
        if rewritten == text {
            continue;
        }
        if let Err(e) = tokio::fs::write(&path, rewritten).await {
            warn!("Failed to rewrite {}: {}", path.display(), e);
            warnings.push(format!("Could not rewrite {}: {}", path.display(), e));
        }
    }

    warnings
}

/// The consolidated stylesheet with every sheet's `url(...)` references
/// rewritten against that sheet's own URL. `<style>` blocks, and sheets whose
/// href does not parse, resolve against `page_base`.
pub fn rewrite_captured_css(capture: &StyleCapture, page_base: &Url, assets: &AssetMap) -> String {
    let from_dir = format!("assets/{}", ResourceType::Css.directory());
    capture.consolidate(|sheet| {
        let sheet_base = sheet.href.as_deref().and_then(|href| Url::parse(href).ok());
        let base = sheet_base.as_ref().unwrap_or(page_base);
        CssRewriter::new(base, assets, &from_dir).rewrite(&sheet.rules.join("\n"))
    })
}

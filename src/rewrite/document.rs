//! Rewriting resource references in the rendered document
//!
//! The document is scanned once. Comments and script bodies pass through
//! untouched; start tags are rewritten attribute by attribute; `<style>`
//! bodies go through [`CssRewriter`]. Tags with nothing to change are
//! emitted byte for byte. A `>` inside a quoted attribute value does not end
//! the tag.

use crate::assets::{resolve_reference, AssetMap};
use crate::extraction::srcset_pairs;
use crate::rewrite::css::{regex, CssRewriter};
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

fn document_regex() -> &'static Regex {
    static DOCUMENT: OnceLock<Regex> = OnceLock::new();
    DOCUMENT.get_or_init(|| {
        regex(
            r#"(?is)<!--.*?-->|(<script\b(?:"[^"]*"|'[^']*'|[^'">])*>)(.*?)(</script\s*>)|(<style\b(?:"[^"]*"|'[^']*'|[^'">])*>)(.*?)(</style\s*>)|<([a-z][a-z0-9-]*)(\s(?:"[^"]*"|'[^']*'|[^'">])*)?>"#,
            "document",
        )
    })
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        regex(
            r#"(?is)^<([a-z][a-z0-9-]*)(\s(?:"[^"]*"|'[^']*'|[^'">])*)?>$"#,
            "tag",
        )
    })
}

fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE.get_or_init(|| {
        regex(
            r#"(?s)([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#,
            "attribute",
        )
    })
}

/// Counts of what the rewriter changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// References pointed at local files
    pub localized: usize,
    /// References pointed at absolute original URLs
    pub absolutized: usize,
    /// `<base>` elements removed
    pub removed_base: usize,
}

/// Rewrites a serialized document against a completed [`AssetMap`]
pub struct DocumentRewriter<'a> {
    base: &'a Url,
    assets: &'a AssetMap,
}

enum Mapped {
    Local(String),
    Absolute(String),
}

impl<'a> DocumentRewriter<'a> {
    /// References resolve against `base`, the document's base URL
    pub fn new(base: &'a Url, assets: &'a AssetMap) -> Self {
        Self { base, assets }
    }

    /// Rewrite `html`, returning the new document and what changed
    pub fn rewrite(&self, html: &str) -> (String, RewriteStats) {
        let mut stats = RewriteStats::default();
        let out = document_regex()
            .replace_all(html, |caps: &Captures| self.rewrite_match(caps, &mut stats))
            .into_owned();
        debug!(
            "Rewrote document: {} local, {} absolute, {} <base> removed",
            stats.localized, stats.absolutized, stats.removed_base
        );
        (out, stats)
    }

    fn rewrite_match(&self, caps: &Captures, stats: &mut RewriteStats) -> String {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

        if let (Some(open), Some(body), Some(close)) = (caps.get(1), caps.get(2), caps.get(3)) {
            let open = self
                .rewrite_tag(open.as_str(), stats)
                .unwrap_or_else(|| open.as_str().to_string());
            return format!("{}{}{}", open, body.as_str(), close.as_str());
        }
        if let (Some(open), Some(body), Some(close)) = (caps.get(4), caps.get(5), caps.get(6)) {
            let css = CssRewriter::new(self.base, self.assets, "").rewrite(body.as_str());
            return format!("{}{}{}", open.as_str(), css, close.as_str());
        }
        if caps.get(7).is_some() {
            return self.rewrite_tag(whole, stats).unwrap_or_else(|| whole.to_string());
        }
        whole.to_string()
    }

    /// Rewrite one start tag; `None` when nothing changes
    fn rewrite_tag(&self, tag: &str, stats: &mut RewriteStats) -> Option<String> {
        let caps = tag_regex().captures(tag)?;
        let name = caps.get(1)?.as_str().to_ascii_lowercase();
        if name == "base" {
            stats.removed_base += 1;
            return Some(String::new());
        }

        let raw_attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let self_closing = raw_attrs.trim_end().ends_with('/');

        let mut parts: Vec<String> = Vec::new();
        let mut changed = false;
        let mut localized = false;
        let mut had_integrity = false;

        for attr in attribute_regex().captures_iter(raw_attrs) {
            let raw = attr.get(0).map(|m| m.as_str()).unwrap_or_default();
            let attr_name = attr.get(1).map(|m| m.as_str().to_ascii_lowercase()).unwrap_or_default();
            let value = attr.get(2).or(attr.get(3)).or(attr.get(4)).map(|m| m.as_str());

            if attr_name == "integrity" || attr_name == "crossorigin" {
                had_integrity = true;
                parts.push(raw.to_string());
                continue;
            }

            let rewritten = match (value, attr_kind(&name, &attr_name)) {
                (Some(value), AttrKind::Url) => self.rewrite_url_attr(value, stats, &mut localized),
                (Some(value), AttrKind::Srcset) => self.rewrite_srcset_attr(value, stats, &mut localized),
                (Some(value), AttrKind::Style) => self.rewrite_style_attr(value),
                _ => None,
            };
            match rewritten {
                Some(new_value) => {
                    changed = true;
                    parts.push(format!(
                        "{}=\"{}\"",
                        attr.get(1).map(|m| m.as_str()).unwrap_or_default(),
                        htmlescape::encode_minimal(&new_value)
                    ));
                }
                None => parts.push(raw.to_string()),
            }
        }

        if localized && had_integrity {
            parts.retain(|p| {
                let lower = p.to_ascii_lowercase();
                !(lower.starts_with("integrity") || lower.starts_with("crossorigin"))
            });
            changed = true;
        }
        if !changed {
            return None;
        }

        let original_name = caps.get(1)?.as_str();
        let mut out = format!("<{}", original_name);
        for part in &parts {
            out.push(' ');
            out.push_str(part);
        }
        if self_closing {
            out.push_str(" /");
        }
        out.push('>');
        Some(out)
    }

    fn map(&self, raw: &str) -> Option<Mapped> {
        let url = resolve_reference(self.base, raw)?;
        Some(match self.assets.local_path(url.as_str()) {
            Some(local) => Mapped::Local(local.to_string()),
            None => Mapped::Absolute(url.to_string()),
        })
    }

    fn rewrite_url_attr(
        &self,
        value: &str,
        stats: &mut RewriteStats,
        localized: &mut bool,
    ) -> Option<String> {
        let decoded = decode(value);
        match self.map(&decoded)? {
            Mapped::Local(local) => {
                stats.localized += 1;
                *localized = true;
                Some(local)
            }
            Mapped::Absolute(abs) if abs != decoded => {
                stats.absolutized += 1;
                Some(abs)
            }
            Mapped::Absolute(_) => None,
        }
    }

    fn rewrite_srcset_attr(
        &self,
        value: &str,
        stats: &mut RewriteStats,
        localized: &mut bool,
    ) -> Option<String> {
        let decoded = decode(value);
        let mut changed = false;
        let candidates: Vec<String> = srcset_pairs(&decoded)
            .map(|(url, descriptor)| {
                let mapped = match self.map(url) {
                    Some(Mapped::Local(local)) => {
                        stats.localized += 1;
                        *localized = true;
                        changed = true;
                        local
                    }
                    Some(Mapped::Absolute(abs)) if abs != url => {
                        stats.absolutized += 1;
                        changed = true;
                        abs
                    }
                    _ => url.to_string(),
                };
                if descriptor.is_empty() {
                    mapped
                } else {
                    format!("{} {}", mapped, descriptor)
                }
            })
            .collect();
        changed.then(|| candidates.join(", "))
    }

    fn rewrite_style_attr(&self, value: &str) -> Option<String> {
        let decoded = decode(value);
        let rewritten = CssRewriter::new(self.base, self.assets, "").rewrite(&decoded);
        (rewritten != decoded).then_some(rewritten)
    }
}

#[derive(PartialEq)]
enum AttrKind {
    Url,
    Srcset,
    Style,
    Other,
}

fn attr_kind(tag: &str, attr: &str) -> AttrKind {
    match (tag, attr) {
        (_, "style") => AttrKind::Style,
        ("link", "href") => AttrKind::Url,
        ("script" | "img" | "source", "src") => AttrKind::Url,
        ("img" | "source", "srcset") => AttrKind::Srcset,
        _ => AttrKind::Other,
    }
}

fn decode(value: &str) -> String {
    htmlescape::decode_html(value).unwrap_or_else(|_| value.to_string())
}

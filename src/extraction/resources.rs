//! Referenced resource extraction
//!
//! Raw references to stylesheets, scripts, images and fonts as they appear
//! in the document. Resolution against the base URL happens later, in
//! [`crate::assets::resolve`].

use serde::{Deserialize, Serialize};

/// Stylesheets, scripts, images, fonts; one section of the page model script.
///
/// Font sources from `@font-face` rules are resolved against their
/// stylesheet here, since that context is lost once the rule text leaves the
/// page. Cross-origin sheets whose rules cannot be read are skipped.
pub const RESOURCES_SECTION: &str = r#"
    () => {
        const stylesheetRefs = [];
        document.querySelectorAll('link[rel~="stylesheet"][href]').forEach(el => {
            stylesheetRefs.push(el.getAttribute('href'));
        });

        const scriptRefs = [];
        document.querySelectorAll('script[src]').forEach(el => {
            scriptRefs.push(el.getAttribute('src'));
        });

        const imageRefs = [];
        document.querySelectorAll('img').forEach(el => {
            const src = el.getAttribute('src');
            const srcset = el.getAttribute('srcset');
            if (!src && !srcset) return;
            imageRefs.push({
                src: src || '',
                alt: el.hasAttribute('alt') ? el.getAttribute('alt') : null,
                srcset: srcset,
                fromCss: false
            });
        });
        document.querySelectorAll('picture source[srcset]').forEach(el => {
            imageRefs.push({ src: '', alt: null, srcset: el.getAttribute('srcset'), fromCss: false });
        });
        document.querySelectorAll('[style*="background"]').forEach(el => {
            const style = el.getAttribute('style') || '';
            const pattern = /url\(\s*['"]?([^'")]+)['"]?\s*\)/g;
            let match;
            while ((match = pattern.exec(style)) !== null) {
                imageRefs.push({ src: match[1], alt: null, srcset: null, fromCss: true });
            }
        });

        const fontRefs = [];
        document.querySelectorAll('link[rel="preload"][as="font"][href]').forEach(el => {
            fontRefs.push(el.getAttribute('href'));
        });
        Array.from(document.styleSheets).forEach(sheet => {
            let rules;
            try {
                rules = sheet.cssRules;
            } catch (e) {
                return;
            }
            if (!rules) return;
            Array.from(rules).forEach(rule => {
                if (rule.type !== CSSRule.FONT_FACE_RULE) return;
                const src = rule.style.getPropertyValue('src') || '';
                const pattern = /url\(\s*['"]?([^'")]+)['"]?\s*\)/g;
                let match;
                while ((match = pattern.exec(src)) !== null) {
                    try {
                        fontRefs.push(new URL(match[1], sheet.href || document.baseURI).href);
                    } catch (e) {}
                }
            });
        });

        return {
            stylesheetRefs: stylesheetRefs,
            scriptRefs: scriptRefs,
            imageRefs: imageRefs,
            fontRefs: fontRefs
        };
    }
"#;

/// An image reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageRef {
    /// Raw src attribute, or the URL inside a CSS `url()`
    pub src: String,
    /// alt attribute; `None` when the attribute is missing
    pub alt: Option<String>,
    /// Raw srcset attribute
    pub srcset: Option<String>,
    /// Found in an inline style rather than an `<img>`
    pub from_css: bool,
}

impl ImageRef {
    /// Every URL this image can load: src first, then srcset candidates
    pub fn candidate_urls(&self) -> Vec<&str> {
        let mut urls = Vec::new();
        if !self.src.trim().is_empty() {
            urls.push(self.src.trim());
        }
        if let Some(ref srcset) = self.srcset {
            urls.extend(srcset_urls(srcset));
        }
        urls
    }

    /// Whether this is an `<img>` with a non-empty alt attribute
    pub fn has_alt_text(&self) -> bool {
        self.alt.as_deref().is_some_and(|alt| !alt.trim().is_empty())
    }
}

/// Split a srcset attribute into its candidate URLs
pub fn srcset_urls(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .filter(|url| !url.is_empty())
}

/// Split a srcset attribute into `(url, descriptor)` pairs
pub fn srcset_pairs(srcset: &str) -> impl Iterator<Item = (&str, &str)> {
    srcset.split(',').filter_map(|candidate| {
        let candidate = candidate.trim();
        let mut parts = candidate.splitn(2, char::is_whitespace);
        let url = parts.next().filter(|u| !u.is_empty())?;
        Some((url, parts.next().unwrap_or("").trim()))
    })
}

//! Page metadata extraction
//!
//! The in-page meta walk (title, description, keywords, viewport,
//! Open Graph, Twitter cards, favicon, canonical, JSON-LD) and helpers that
//! pick the best available title and description from the result.

use crate::extraction::page::ExtractedPageModel;

/// Meta walk, one section of the page model script.
///
/// Invalid JSON-LD blocks are dropped silently.
pub const METADATA_SECTION: &str = r#"
    () => {
        const result = {
            title: document.title || null,
            description: null,
            keywords: [],
            language: document.documentElement.lang || null,
            viewport: null,
            favicon: null,
            canonical: null,
            openGraph: {},
            twitterCard: {},
            structuredData: []
        };

        document.querySelectorAll('meta').forEach(meta => {
            const name = meta.getAttribute('name') || meta.getAttribute('property');
            const content = meta.getAttribute('content');

            if (!name || content === null) return;

            const key = name.toLowerCase();
            if (key === 'description') result.description = content;
            if (key === 'viewport') result.viewport = content;
            if (key === 'keywords') {
                result.keywords = content.split(',').map(k => k.trim()).filter(k => k);
            }
            if (key.startsWith('og:')) {
                result.openGraph[key.slice(3)] = content;
            }
            if (key.startsWith('twitter:')) {
                result.twitterCard[key.slice(8)] = content;
            }
        });

        const favicon = document.querySelector('link[rel~="icon"][href]');
        if (favicon) {
            result.favicon = favicon.getAttribute('href');
        }

        const canonical = document.querySelector('link[rel="canonical"][href]');
        if (canonical) {
            result.canonical = canonical.getAttribute('href');
        }

        document.querySelectorAll('script[type="application/ld+json"]').forEach(script => {
            try {
                result.structuredData.push(JSON.parse(script.textContent));
            } catch (e) {}
        });

        return result;
    }
"#;

/// Metadata helpers
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Get the best title from available sources
    pub fn best_title(model: &ExtractedPageModel) -> Option<String> {
        non_empty(model.title.as_deref())
            .or_else(|| non_empty(model.open_graph.get("title").map(String::as_str)))
            .or_else(|| non_empty(model.twitter_card.get("title").map(String::as_str)))
    }

    /// Get the best description from available sources
    pub fn best_description(model: &ExtractedPageModel) -> Option<String> {
        non_empty(model.description.as_deref())
            .or_else(|| non_empty(model.open_graph.get("description").map(String::as_str)))
            .or_else(|| non_empty(model.twitter_card.get("description").map(String::as_str)))
    }

    /// Get the best share image from available sources
    pub fn best_image(model: &ExtractedPageModel) -> Option<String> {
        non_empty(model.open_graph.get("image").map(String::as_str))
            .or_else(|| non_empty(model.twitter_card.get("image").map(String::as_str)))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

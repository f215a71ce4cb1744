//! Link and navigation extraction
//!
//! Anchors and navigation-like containers, plus classification of links
//! relative to the page they were found on.

use serde::{Deserialize, Serialize};
use url::Url;

/// Anchors and navigation blocks, one section of the page model script.
pub const LINKS_SECTION: &str = r#"
    () => {
        const linkRefs = [];
        document.querySelectorAll('a[href]').forEach(el => {
            const text = (el.innerText || el.textContent || '').trim();
            linkRefs.push({
                href: el.getAttribute('href') || '',
                text: text.substring(0, 200)
            });
        });

        const navigationBlocks = [];
        const seen = new Set();
        const containers = document.querySelectorAll(
            'nav, [role="navigation"], header ul, .nav, .navbar, .menu, #menu'
        );
        containers.forEach(container => {
            if (seen.has(container)) return;
            for (const other of seen) {
                if (other.contains(container)) return;
            }
            seen.add(container);

            const links = [];
            container.querySelectorAll('a[href]').forEach(a => {
                links.push({
                    href: a.getAttribute('href') || '',
                    text: (a.innerText || a.textContent || '').trim().substring(0, 100)
                });
            });
            if (links.length === 0) return;

            const label = container.getAttribute('aria-label')
                || container.id
                || container.tagName.toLowerCase();
            navigationBlocks.push({ label: label, links: links });
        });

        return { linkRefs: linkRefs, navigationBlocks: navigationBlocks };
    }
"#;

/// Type of link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Internal link (same host)
    Internal,
    /// External link (different host)
    External,
    /// Anchor link (same page)
    Anchor,
    /// mailto: link
    Email,
    /// tel: link
    Phone,
    /// JavaScript link
    JavaScript,
    /// Other/unknown
    Other,
}

/// An anchor found on the page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkRef {
    /// Raw href attribute
    pub href: String,
    /// Visible text, truncated
    pub text: String,
}

impl LinkRef {
    /// Classify this link relative to the page's base URL
    pub fn link_type(&self, base: &Url) -> LinkType {
        let href = self.href.trim();
        let lower = href.to_ascii_lowercase();
        if href.starts_with('#') {
            LinkType::Anchor
        } else if lower.starts_with("mailto:") {
            LinkType::Email
        } else if lower.starts_with("tel:") {
            LinkType::Phone
        } else if lower.starts_with("javascript:") {
            LinkType::JavaScript
        } else {
            match base.join(href) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                    if url.host_str() == base.host_str() {
                        LinkType::Internal
                    } else {
                        LinkType::External
                    }
                }
                _ => LinkType::Other,
            }
        }
    }
}

/// A navigation-like container and the links inside it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationBlock {
    /// aria-label, id, or tag name of the container
    pub label: String,
    /// Links in document order
    pub links: Vec<LinkRef>,
}

/// Count links by type
pub fn count_by_type(links: &[LinkRef], base: &Url, link_type: LinkType) -> usize {
    links
        .iter()
        .filter(|l| l.link_type(base) == link_type)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(href: &str) -> LinkRef {
        LinkRef {
            href: href.to_string(),
            text: String::new(),
        }
    }

    #[test]
    fn test_link_type_serialization() {
        let json = serde_json::to_string(&LinkType::External).unwrap();
        assert_eq!(json, "\"external\"");
    }

    #[test]
    fn test_link_classification() {
        let base = Url::parse("https://example.com/blog/").unwrap();
        assert_eq!(link("/about").link_type(&base), LinkType::Internal);
        assert_eq!(link("post-1").link_type(&base), LinkType::Internal);
        assert_eq!(link("https://other.org/").link_type(&base), LinkType::External);
        assert_eq!(link("//cdn.example.net/x").link_type(&base), LinkType::External);
        assert_eq!(link("#top").link_type(&base), LinkType::Anchor);
        assert_eq!(link("mailto:a@b.c").link_type(&base), LinkType::Email);
        assert_eq!(link("TEL:123").link_type(&base), LinkType::Phone);
        assert_eq!(link("javascript:void(0)").link_type(&base), LinkType::JavaScript);
        assert_eq!(link("ftp://files.example.com").link_type(&base), LinkType::Other);
    }

    #[test]
    fn test_count_by_type() {
        let base = Url::parse("https://example.com/").unwrap();
        let links = vec![link("/a"), link("/b"), link("https://x.org")];
        assert_eq!(count_by_type(&links, &base, LinkType::Internal), 2);
        assert_eq!(count_by_type(&links, &base, LinkType::External), 1);
    }
}

//! Static extraction from serialized HTML
//!
//! Fallback used when the in-page extraction script cannot run. It reads
//! the rendered HTML with `scraper` and fills the parts of the model that
//! need no live DOM: metadata, resource references, anchors, forms, content
//! blocks and accessibility counts. Computed styles, CSSOM fonts, timings
//! and technology probes stay empty.

use crate::extraction::links::{LinkRef, NavigationBlock};
use crate::extraction::page::ExtractedPageModel;
use crate::extraction::resources::ImageRef;
use crate::extraction::structure::{AccessibilityFlags, ContentBlock, FormField, FormSchema};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Builds a reduced page model from HTML text
pub struct StaticExtractor;

impl StaticExtractor {
    /// Extract what can be read from `html` without a browser
    pub fn extract(html: &str, base_url: &str) -> ExtractedPageModel {
        let doc = Html::parse_document(html);
        let mut model = ExtractedPageModel::empty(base_url);

        if let Some(base) = first(&doc, "base[href]").and_then(|b| b.value().attr("href")) {
            if let Ok(resolved) = url::Url::parse(base_url).and_then(|u| u.join(base)) {
                model.base_url = resolved.to_string();
            }
        }

        model.title = first(&doc, "title")
            .map(|t| collapse(&t.text().collect::<String>()))
            .filter(|t| !t.is_empty());
        model.language = first(&doc, "html")
            .and_then(|h| h.value().attr("lang"))
            .map(String::from);

        for meta in select(&doc, "meta") {
            let el = meta.value();
            let Some(name) = el.attr("name").or_else(|| el.attr("property")) else {
                continue;
            };
            let Some(content) = el.attr("content") else {
                continue;
            };
            let key = name.to_ascii_lowercase();
            match key.as_str() {
                "description" => model.description = Some(content.to_string()),
                "viewport" => model.viewport = Some(content.to_string()),
                "keywords" => {
                    model.keywords = content
                        .split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(String::from)
                        .collect()
                }
                _ => {}
            }
            if let Some(og) = key.strip_prefix("og:") {
                model.open_graph.insert(og.to_string(), content.to_string());
            }
            if let Some(tw) = key.strip_prefix("twitter:") {
                model.twitter_card.insert(tw.to_string(), content.to_string());
            }
        }

        for link in select(&doc, "link[href]") {
            let el = link.value();
            let rel = el.attr("rel").unwrap_or("").to_ascii_lowercase();
            let rels: Vec<&str> = rel.split_whitespace().collect();
            let href = el.attr("href").unwrap_or("").to_string();
            if rels.contains(&"stylesheet") {
                model.stylesheet_refs.push(href);
            } else if rels.contains(&"icon") && model.favicon.is_none() {
                model.favicon = Some(href);
            } else if rels.contains(&"canonical") {
                model.canonical = Some(href);
            } else if rels.contains(&"preload") && el.attr("as") == Some("font") {
                model.font_refs.push(href);
            }
        }

        for script in select(&doc, "script") {
            let el = script.value();
            if let Some(src) = el.attr("src") {
                model.script_refs.push(src.to_string());
            } else if el.attr("type") == Some("application/ld+json") {
                let body = script.text().collect::<String>();
                if let Ok(value) = serde_json::from_str(&body) {
                    model.structured_data.push(value);
                }
            }
        }

        let images = select(&doc, "img");
        for img in &images {
            let el = img.value();
            let src = el.attr("src").unwrap_or("");
            let srcset = el.attr("srcset");
            if src.is_empty() && srcset.is_none() {
                continue;
            }
            model.image_refs.push(ImageRef {
                src: src.to_string(),
                alt: el.attr("alt").map(String::from),
                srcset: srcset.map(String::from),
                from_css: false,
            });
        }

        for anchor in select(&doc, "a[href]") {
            model.link_refs.push(link_ref(anchor, 200));
        }

        for nav in select(&doc, "nav, [role=\"navigation\"]") {
            let links: Vec<LinkRef> = select_within(nav, "a[href]")
                .into_iter()
                .map(|a| link_ref(a, 100))
                .collect();
            if links.is_empty() {
                continue;
            }
            let el = nav.value();
            let label = el
                .attr("aria-label")
                .or_else(|| el.attr("id"))
                .unwrap_or(el.name())
                .to_string();
            model.navigation_blocks.push(NavigationBlock { label, links });
        }

        for form in select(&doc, "form") {
            let el = form.value();
            let fields = select_within(form, "input, select, textarea, button")
                .into_iter()
                .map(|f| {
                    let fv = f.value();
                    FormField {
                        tag: fv.name().to_string(),
                        field_type: fv.attr("type").map(String::from),
                        name: fv.attr("name").map(String::from),
                        required: fv.attr("required").is_some(),
                        placeholder: fv.attr("placeholder").map(String::from),
                    }
                })
                .collect();
            model.forms.push(FormSchema {
                id: el.attr("id").map(String::from),
                action: el.attr("action").map(String::from),
                method: el.attr("method").unwrap_or("get").to_ascii_lowercase(),
                fields,
            });
        }

        for block in select(
            &doc,
            "h1, h2, h3, h4, h5, h6, main, article, section, header, footer, aside",
        ) {
            let el = block.value();
            model.content_blocks.push(ContentBlock {
                tag: el.name().to_string(),
                id: el.attr("id").map(String::from),
                classes: el.classes().map(String::from).collect(),
                text: truncate(&collapse(&block.text().collect::<String>()), 200),
            });
        }

        model.accessibility = AccessibilityFlags {
            image_count: images.len(),
            images_with_alt: images
                .iter()
                .filter(|i| i.value().attr("alt").is_some_and(|a| !a.trim().is_empty()))
                .count(),
            heading_count: select(&doc, "h1, h2, h3, h4, h5, h6").len(),
            h1_count: select(&doc, "h1").len(),
            landmark_count: select(
                &doc,
                "main, nav, header, footer, aside, [role=\"main\"], [role=\"navigation\"], [role=\"banner\"], [role=\"contentinfo\"]",
            )
            .len(),
            has_lang_attribute: model.language.as_deref().is_some_and(|l| !l.is_empty()),
            inputs_without_label: 0,
        };

        debug!("Static extraction: {}", model.summary());
        model
    }
}

fn select<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(sel) => doc.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

fn select_within<'a>(el: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(sel) => el.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

fn first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    select(doc, css).into_iter().next()
}

fn link_ref(anchor: ElementRef<'_>, max_chars: usize) -> LinkRef {
    LinkRef {
        href: anchor.value().attr("href").unwrap_or("").to_string(),
        text: truncate(&collapse(&anchor.text().collect::<String>()), max_chars),
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

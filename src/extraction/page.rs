//! The structured page model and the single-pass extractor that builds it
//!
//! [`PageExtractor::extract`] runs one script in the page. The script is
//! assembled from independent sections (metadata, resources, links,
//! structure, technology detection); a section that throws is recorded in
//! `extraction_errors` and the remaining sections still contribute.

use crate::browser::PageDriver;
use crate::error::Result;
use crate::extraction::links::{LinkRef, NavigationBlock, LINKS_SECTION};
use crate::extraction::metadata::METADATA_SECTION;
use crate::extraction::resources::{ImageRef, RESOURCES_SECTION};
use crate::extraction::structure::{
    AccessibilityFlags, ContentBlock, FormSchema, PerformanceMetrics, STRUCTURE_SECTION,
};
use crate::extraction::technology::{detection_section, TECHNOLOGY_PROBES};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

/// Everything the pipeline knows about the rendered page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedPageModel {
    /// location.href at extraction time
    pub url: String,
    /// document.baseURI; references resolve against this
    pub base_url: String,
    /// document.title
    pub title: Option<String>,
    /// meta description
    pub description: Option<String>,
    /// meta keywords
    pub keywords: Vec<String>,
    /// `<html lang>`
    pub language: Option<String>,
    /// meta viewport
    pub viewport: Option<String>,
    /// Raw favicon href
    pub favicon: Option<String>,
    /// Raw canonical href
    pub canonical: Option<String>,
    /// og:* properties without the prefix
    pub open_graph: BTreeMap<String, String>,
    /// twitter:* properties without the prefix
    pub twitter_card: BTreeMap<String, String>,
    /// Parsed JSON-LD blocks
    pub structured_data: Vec<serde_json::Value>,
    /// Raw stylesheet hrefs
    pub stylesheet_refs: Vec<String>,
    /// Raw script srcs
    pub script_refs: Vec<String>,
    /// Images, srcsets and inline-style background images
    pub image_refs: Vec<ImageRef>,
    /// Font URLs
    pub font_refs: Vec<String>,
    /// Anchors
    pub link_refs: Vec<LinkRef>,
    /// Form schemas
    pub forms: Vec<FormSchema>,
    /// Navigation containers
    pub navigation_blocks: Vec<NavigationBlock>,
    /// Headings and sectioning elements
    pub content_blocks: Vec<ContentBlock>,
    /// Technology labels
    pub detected_technologies: BTreeSet<String>,
    /// Load timings
    pub performance: PerformanceMetrics,
    /// Accessibility signals
    pub accessibility: AccessibilityFlags,
    /// Sections that threw in the page
    pub extraction_errors: Vec<String>,
}

impl ExtractedPageModel {
    /// An empty model for a page that could not be extracted
    pub fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            base_url: url.to_string(),
            ..Default::default()
        }
    }

    /// The model with timing fields cleared; two extractions of an unchanged
    /// page compare equal in this form
    pub fn without_timings(&self) -> Self {
        Self {
            performance: PerformanceMetrics::default(),
            ..self.clone()
        }
    }

    /// Headline counts for logging and the report
    pub fn summary(&self) -> String {
        format!(
            "{} stylesheets, {} scripts, {} images, {} fonts, {} links, {} forms",
            self.stylesheet_refs.len(),
            self.script_refs.len(),
            self.image_refs.len(),
            self.font_refs.len(),
            self.link_refs.len(),
            self.forms.len()
        )
    }
}

/// Assemble the page model script from its sections
pub fn page_model_script() -> String {
    let sections: [(&str, String); 5] = [
        ("metadata", METADATA_SECTION.to_string()),
        ("resources", RESOURCES_SECTION.to_string()),
        ("links", LINKS_SECTION.to_string()),
        ("structure", STRUCTURE_SECTION.to_string()),
        ("technologies", detection_section(TECHNOLOGY_PROBES)),
    ];

    let mut script = String::from(
        "(() => {\n    const result = { url: location.href, baseUrl: document.baseURI, extractionErrors: [] };\n",
    );
    for (name, section) in sections.iter() {
        script.push_str("    try {\n        Object.assign(result, (");
        script.push_str(section.trim());
        script.push_str(")());\n    } catch (e) {\n        result.extractionErrors.push('");
        script.push_str(name);
        script.push_str(": ' + (e && e.message ? e.message : String(e)));\n    }\n");
    }
    script.push_str("    return result;\n})()");
    script
}

/// Single-pass page extractor
pub struct PageExtractor;

impl PageExtractor {
    /// Extract the page model from the current page
    #[instrument(skip(driver))]
    pub async fn extract<D: PageDriver>(driver: &D, base_url: &str) -> Result<ExtractedPageModel> {
        info!("Extracting page model");

        let mut model: ExtractedPageModel = driver.evaluate_as(&page_model_script()).await?;

        if model.base_url.is_empty() {
            model.base_url = base_url.to_string();
        }
        if model.url.is_empty() {
            model.url = base_url.to_string();
        }
        for err in &model.extraction_errors {
            warn!("Extraction section failed: {}", err);
        }

        debug!("Extracted {}", model.summary());
        Ok(model)
    }
}

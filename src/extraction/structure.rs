//! Document structure extraction
//!
//! Forms, content blocks, accessibility flags and load timings.

use serde::{Deserialize, Serialize};

/// Forms, content blocks, accessibility and performance; one section of the
/// page model script.
pub const STRUCTURE_SECTION: &str = r#"
    () => {
        const forms = [];
        document.querySelectorAll('form').forEach(form => {
            const fields = [];
            form.querySelectorAll('input, select, textarea, button').forEach(el => {
                fields.push({
                    tag: el.tagName.toLowerCase(),
                    type: el.getAttribute('type'),
                    name: el.getAttribute('name'),
                    required: el.hasAttribute('required'),
                    placeholder: el.getAttribute('placeholder')
                });
            });
            forms.push({
                id: form.id || null,
                action: form.getAttribute('action'),
                method: (form.getAttribute('method') || 'get').toLowerCase(),
                fields: fields
            });
        });

        const contentBlocks = [];
        document.querySelectorAll('h1, h2, h3, h4, h5, h6, main, article, section, header, footer, aside')
            .forEach(el => {
                const text = (el.innerText || el.textContent || '').trim().replace(/\s+/g, ' ');
                contentBlocks.push({
                    tag: el.tagName.toLowerCase(),
                    id: el.id || null,
                    classes: Array.from(el.classList),
                    text: text.substring(0, 200)
                });
            });

        const images = Array.from(document.querySelectorAll('img'));
        const labelled = (el) => {
            if (el.getAttribute('aria-label') || el.getAttribute('aria-labelledby')) return true;
            if (el.id && document.querySelector('label[for="' + CSS.escape(el.id) + '"]')) return true;
            return !!el.closest('label');
        };
        const inputs = Array.from(document.querySelectorAll(
            'input:not([type="hidden"]):not([type="submit"]):not([type="button"]), select, textarea'
        ));
        const accessibility = {
            imageCount: images.length,
            imagesWithAlt: images.filter(img => (img.getAttribute('alt') || '').trim().length > 0).length,
            headingCount: document.querySelectorAll('h1, h2, h3, h4, h5, h6').length,
            h1Count: document.querySelectorAll('h1').length,
            landmarkCount: document.querySelectorAll(
                'main, nav, header, footer, aside, [role="main"], [role="navigation"], [role="banner"], [role="contentinfo"]'
            ).length,
            hasLangAttribute: !!document.documentElement.getAttribute('lang'),
            inputsWithoutLabel: inputs.filter(el => !labelled(el)).length
        };

        const performanceMetrics = { resourceCount: 0 };
        try {
            const nav = performance.getEntriesByType('navigation')[0];
            if (nav) {
                performanceMetrics.domContentLoadedMs = nav.domContentLoadedEventEnd;
                performanceMetrics.loadCompleteMs = nav.loadEventEnd;
                performanceMetrics.transferSizeBytes = nav.transferSize;
            }
            performance.getEntriesByType('paint').forEach(entry => {
                if (entry.name === 'first-paint') performanceMetrics.firstPaintMs = entry.startTime;
                if (entry.name === 'first-contentful-paint') performanceMetrics.firstContentfulPaintMs = entry.startTime;
            });
            performanceMetrics.resourceCount = performance.getEntriesByType('resource').length;
        } catch (e) {}

        return {
            forms: forms,
            contentBlocks: contentBlocks,
            accessibility: accessibility,
            performance: performanceMetrics
        };
    }
"#;

/// A form control
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormField {
    /// Element tag (input, select, textarea, button)
    pub tag: String,
    /// type attribute
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    /// name attribute
    pub name: Option<String>,
    /// Whether the control is required
    pub required: bool,
    /// placeholder attribute
    pub placeholder: Option<String>,
}

/// The schema of one form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSchema {
    /// id attribute
    pub id: Option<String>,
    /// action attribute
    pub action: Option<String>,
    /// Lowercased method, `get` when absent
    pub method: String,
    /// Controls in document order
    pub fields: Vec<FormField>,
}

/// A heading or sectioning element with a text snippet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentBlock {
    /// Lowercased tag name
    pub tag: String,
    /// id attribute
    pub id: Option<String>,
    /// Class list
    pub classes: Vec<String>,
    /// Collapsed text, truncated
    pub text: String,
}

impl ContentBlock {
    /// Whether this block is an `h1`..`h6`
    pub fn is_heading(&self) -> bool {
        matches!(self.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
    }
}

/// Accessibility signals counted in the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilityFlags {
    /// Number of `<img>` elements
    pub image_count: usize,
    /// Images with non-empty alt text
    pub images_with_alt: usize,
    /// Number of `h1`..`h6`
    pub heading_count: usize,
    /// Number of `h1`
    pub h1_count: usize,
    /// Landmark elements and roles
    pub landmark_count: usize,
    /// `<html lang>` present
    pub has_lang_attribute: bool,
    /// Visible form controls without a label
    pub inputs_without_label: usize,
}

impl AccessibilityFlags {
    /// Share of images with alt text; 1.0 when there are no images
    pub fn alt_coverage(&self) -> f64 {
        if self.image_count == 0 {
            1.0
        } else {
            self.images_with_alt.min(self.image_count) as f64 / self.image_count as f64
        }
    }
}

/// Load timings in milliseconds from navigation start
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceMetrics {
    /// DOMContentLoaded end
    pub dom_content_loaded_ms: Option<f64>,
    /// load event end
    pub load_complete_ms: Option<f64>,
    /// first-paint
    pub first_paint_ms: Option<f64>,
    /// first-contentful-paint
    pub first_contentful_paint_ms: Option<f64>,
    /// Resource timing entries at extraction time
    pub resource_count: usize,
    /// Transfer size of the document itself
    pub transfer_size_bytes: Option<f64>,
}

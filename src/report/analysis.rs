//! Heuristic page analysis and the aggregate report

use crate::assets::{AssetMap, DownloadStatus, ResourceRecord, StatusCounts};
use crate::extraction::links::{count_by_type, LinkType};
use crate::extraction::{ExtractedPageModel, MetadataExtractor, PerformanceMetrics, StyleCapture};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Image count above which "Optimize images" is recommended
pub const IMAGE_COUNT_THRESHOLD: usize = 20;

/// Script count above which fewer script files are recommended
pub const SCRIPT_COUNT_THRESHOLD: usize = 15;

/// Headline facts about the page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    /// Final page URL
    pub url: String,
    /// Best available title
    pub title: Option<String>,
    /// Best available description
    pub description: Option<String>,
    /// `<html lang>`
    pub language: Option<String>,
    /// Canonical href
    pub canonical: Option<String>,
    /// Share image from Open Graph or Twitter tags
    pub share_image: Option<String>,
    /// Meta keywords
    pub keywords: Vec<String>,
    /// Anchors on the page
    pub link_count: usize,
    /// Anchors to the same host
    pub internal_links: usize,
    /// Anchors to other hosts
    pub external_links: usize,
    /// Forms on the page
    pub form_count: usize,
    /// Navigation containers
    pub navigation_blocks: usize,
    /// Headings and sectioning elements
    pub content_blocks: usize,
}

/// Resource counts by type and status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetSummary {
    /// Distinct resources
    pub total: usize,
    /// Stored locally
    pub ok: usize,
    /// Failed
    pub failed: usize,
    /// Per-type counts keyed by type label
    pub by_type: BTreeMap<String, StatusCounts>,
}

impl AssetSummary {
    /// Summarize an asset map
    pub fn from_assets(assets: &AssetMap) -> Self {
        Self {
            total: assets.len(),
            ok: assets.count_by_status(DownloadStatus::Ok),
            failed: assets.count_by_status(DownloadStatus::Failed),
            by_type: assets
                .type_counts()
                .into_iter()
                .map(|(ty, counts)| (ty.label().to_string(), counts))
                .collect(),
        }
    }
}

/// Fixed table of heuristic checks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeuristicChecks {
    /// Non-empty `<title>`
    pub has_title: bool,
    /// Non-empty meta description
    pub has_description: bool,
    /// Meta viewport present
    pub has_viewport: bool,
    /// Favicon link present
    pub has_favicon: bool,
    /// At least one JSON-LD block
    pub has_structured_data: bool,
    /// Share of images with alt text, 0.0..=1.0
    pub image_alt_coverage: f64,
    /// At least one heading
    pub has_headings: bool,
    /// At least one landmark element
    pub has_landmarks: bool,
    /// `<img>` elements counted
    pub image_count: usize,
    /// Script files referenced
    pub script_count: usize,
}

impl HeuristicChecks {
    /// Evaluate every check against the page model
    pub fn evaluate(model: &ExtractedPageModel) -> Self {
        let images: Vec<_> = model.image_refs.iter().filter(|i| !i.from_css).collect();
        let accessibility = &model.accessibility;

        let (image_count, image_alt_coverage) = if accessibility.image_count > 0 {
            (accessibility.image_count, accessibility.alt_coverage())
        } else if images.is_empty() {
            (0, 1.0)
        } else {
            let with_alt = images.iter().filter(|i| i.has_alt_text()).count();
            (images.len(), with_alt as f64 / images.len() as f64)
        };

        Self {
            has_title: present(model.title.as_deref()),
            has_description: present(model.description.as_deref()),
            has_viewport: present(model.viewport.as_deref()),
            has_favicon: present(model.favicon.as_deref()),
            has_structured_data: !model.structured_data.is_empty(),
            image_alt_coverage,
            has_headings: accessibility.heading_count > 0
                || model.content_blocks.iter().any(|b| b.is_heading()),
            has_landmarks: accessibility.landmark_count > 0,
            image_count,
            script_count: model.script_refs.len(),
        }
    }
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Ordered recommendations; each rule is independent of the others
pub fn recommendations(checks: &HeuristicChecks, failed_downloads: usize) -> Vec<String> {
    let rules: [(bool, &str); 10] = [
        (!checks.has_title, "Add a proper page title"),
        (!checks.has_description, "Add a meta description"),
        (!checks.has_viewport, "Add a viewport meta tag for mobile devices"),
        (!checks.has_favicon, "Add a favicon"),
        (
            !checks.has_structured_data,
            "Add structured data (JSON-LD) for rich results",
        ),
        (checks.image_alt_coverage < 1.0, "Add alt text to all images"),
        (checks.image_count > IMAGE_COUNT_THRESHOLD, "Optimize images"),
        (
            checks.script_count > SCRIPT_COUNT_THRESHOLD,
            "Reduce the number of script files",
        ),
        (!checks.has_headings, "Add a heading structure"),
        (!checks.has_landmarks, "Use semantic landmark elements"),
    ];

    let mut out: Vec<String> = rules
        .iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, text)| text.to_string())
        .collect();
    if failed_downloads > 0 {
        out.push(format!(
            "Review {} resources that failed to download",
            failed_downloads
        ));
    }
    out
}

/// Summary of the consolidated style capture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSummary {
    /// CSS rules captured
    pub rule_count: usize,
    /// Sheets read through the CSSOM
    pub readable_sheets: usize,
    /// Cross-origin sheets skipped
    pub skipped_sheets: usize,
    /// Inline scripts captured
    pub inline_scripts: usize,
}

impl From<&StyleCapture> for StyleSummary {
    fn from(capture: &StyleCapture) -> Self {
        Self {
            rule_count: capture.rule_count(),
            readable_sheets: capture.readable_sheets,
            skipped_sheets: capture.skipped_sheets,
            inline_scripts: capture.inline_scripts.len(),
        }
    }
}

/// The persisted analysis of one mirror job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// When the report was built
    pub generated_at: DateTime<Utc>,
    /// Page facts
    pub page: PageSummary,
    /// Resource counts
    pub assets: AssetSummary,
    /// Heuristic results
    pub checks: HeuristicChecks,
    /// Detected technology labels, sorted
    pub technologies: Vec<String>,
    /// Recommendations in rule order
    pub recommendations: Vec<String>,
    /// Job warnings followed by one entry per failed resource
    pub warnings: Vec<String>,
    /// Load timings
    pub performance: PerformanceMetrics,
    /// Style capture counts, when the capture ran
    pub styles: Option<StyleSummary>,
    /// Every resource record in discovery order
    pub resources: Vec<ResourceRecord>,
    /// Extraction sections that failed in the page
    pub extraction_errors: Vec<String>,
}

impl AnalysisReport {
    /// Aggregate the job's results
    pub fn build(
        model: &ExtractedPageModel,
        assets: &AssetMap,
        styles: Option<&StyleCapture>,
        job_warnings: &[String],
        generated_at: DateTime<Utc>,
    ) -> Self {
        let checks = HeuristicChecks::evaluate(model);
        let asset_summary = AssetSummary::from_assets(assets);
        let recommendations = recommendations(&checks, asset_summary.failed);

        let mut warnings = job_warnings.to_vec();
        warnings.extend(assets.failed().map(|record| {
            format!(
                "Failed to download {} {}: {}",
                record.resource_type.label(),
                record.original_url,
                record.error_message.as_deref().unwrap_or("unknown error")
            )
        }));

        Self {
            generated_at,
            page: page_summary(model),
            assets: asset_summary,
            checks,
            technologies: model.detected_technologies.iter().cloned().collect(),
            recommendations,
            warnings,
            performance: model.performance.clone(),
            styles: styles.map(StyleSummary::from),
            resources: assets.to_records(),
            extraction_errors: model.extraction_errors.clone(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn page_summary(model: &ExtractedPageModel) -> PageSummary {
    let base = Url::parse(&model.base_url).or_else(|_| Url::parse(&model.url)).ok();
    let (internal_links, external_links) = match base {
        Some(ref base) => (
            count_by_type(&model.link_refs, base, LinkType::Internal),
            count_by_type(&model.link_refs, base, LinkType::External),
        ),
        None => (0, 0),
    };

    PageSummary {
        url: model.url.clone(),
        title: MetadataExtractor::best_title(model),
        description: MetadataExtractor::best_description(model),
        language: model.language.clone(),
        canonical: model.canonical.clone(),
        share_image: MetadataExtractor::best_image(model),
        keywords: model.keywords.clone(),
        link_count: model.link_refs.len(),
        internal_links,
        external_links,
        form_count: model.forms.len(),
        navigation_blocks: model.navigation_blocks.len(),
        content_blocks: model.content_blocks.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceType;
    use crate::extraction::{AccessibilityFlags, ImageRef, LinkRef};
    use pretty_assertions::assert_eq;

    fn complete_model() -> ExtractedPageModel {
        ExtractedPageModel {
            url: "https://example.com/".to_string(),
            base_url: "https://example.com/".to_string(),
            title: Some("Example".to_string()),
            description: Some("An example".to_string()),
            viewport: Some("width=device-width".to_string()),
            favicon: Some("/favicon.ico".to_string()),
            structured_data: vec![serde_json::json!({"@type": "WebSite"})],
            accessibility: AccessibilityFlags {
                image_count: 1,
                images_with_alt: 1,
                heading_count: 2,
                h1_count: 1,
                landmark_count: 3,
                has_lang_attribute: true,
                inputs_without_label: 0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_page_has_no_recommendations() {
        let checks = HeuristicChecks::evaluate(&complete_model());
        assert!(recommendations(&checks, 0).is_empty());
    }

    #[test]
    fn test_empty_page_recommendation_order() {
        let checks = HeuristicChecks::evaluate(&ExtractedPageModel::empty("https://example.com/"));
        assert_eq!(
            recommendations(&checks, 2),
            vec![
                "Add a proper page title",
                "Add a meta description",
                "Add a viewport meta tag for mobile devices",
                "Add a favicon",
                "Add structured data (JSON-LD) for rich results",
                "Add a heading structure",
                "Use semantic landmark elements",
                "Review 2 resources that failed to download",
            ]
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut model = complete_model();
        model.accessibility.image_count = IMAGE_COUNT_THRESHOLD;
        model.accessibility.images_with_alt = IMAGE_COUNT_THRESHOLD;
        model.script_refs = vec!["/a.js".to_string(); SCRIPT_COUNT_THRESHOLD];
        assert!(recommendations(&HeuristicChecks::evaluate(&model), 0).is_empty());

        model.accessibility.image_count += 1;
        model.script_refs.push("/b.js".to_string());
        assert_eq!(
            recommendations(&HeuristicChecks::evaluate(&model), 0),
            vec![
                "Add alt text to all images",
                "Optimize images",
                "Reduce the number of script files",
            ]
        );
    }

    #[test]
    fn test_alt_coverage_from_image_refs() {
        let mut model = complete_model();
        model.accessibility = AccessibilityFlags {
            heading_count: 1,
            landmark_count: 1,
            ..Default::default()
        };
        model.image_refs = vec![
            ImageRef {
                src: "/a.png".to_string(),
                alt: Some("A".to_string()),
                ..Default::default()
            },
            ImageRef {
                src: "/b.png".to_string(),
                ..Default::default()
            },
            ImageRef {
                src: "/bg.png".to_string(),
                from_css: true,
                ..Default::default()
            },
        ];
        let checks = HeuristicChecks::evaluate(&model);
        assert_eq!(checks.image_count, 2);
        assert!((checks.image_alt_coverage - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_warnings_and_counts() {
        let mut model = complete_model();
        model.link_refs = vec![
            LinkRef {
                href: "/about".to_string(),
                text: "About".to_string(),
            },
            LinkRef {
                href: "https://other.org/".to_string(),
                text: "Other".to_string(),
            },
        ];
        let assets: AssetMap = vec![ResourceRecord {
            original_url: "https://example.com/style.css".to_string(),
            resource_type: ResourceType::Css,
            local_relative_path: "assets/css/style.css".to_string(),
            download_status: DownloadStatus::Failed,
            error_message: Some("timed out after 100ms".to_string()),
            size_bytes: None,
            attempts: 1,
        }]
        .into_iter()
        .collect();

        let report = AnalysisReport::build(
            &model,
            &assets,
            None,
            &["Style capture failed".to_string()],
            Utc::now(),
        );
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.warnings[0], "Style capture failed");
        assert!(report.warnings[1].contains("https://example.com/style.css"));
        assert_eq!(report.assets.failed, 1);
        assert_eq!(report.assets.by_type["css"], StatusCounts { ok: 0, failed: 1 });
        assert_eq!(report.page.internal_links, 1);
        assert_eq!(report.page.external_links, 1);
        assert_eq!(
            report.recommendations,
            vec!["Review 1 resources that failed to download"]
        );

        let json = report.to_json().unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.recommendations, report.recommendations);
    }
}

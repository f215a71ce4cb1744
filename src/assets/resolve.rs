//! Reference resolution, deduplication and local file naming
//!
//! Turns the raw references in an [`ExtractedPageModel`] into a
//! [`ResourcePlan`]: one entry per distinct absolute URL, each with the
//! local path it will be written to. Nothing here touches the network.

use crate::assets::map::ResourceType;
use crate::browser::PageDriver;
use crate::error::{Error, Result};
use crate::extraction::ExtractedPageModel;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

/// Relative path of the consolidated stylesheet
pub const CONSOLIDATED_CSS_PATH: &str = "assets/css/consolidated.css";

/// Relative path of the consolidated inline scripts
pub const CONSOLIDATED_JS_PATH: &str = "assets/js/consolidated.js";

const MAX_STEM_CHARS: usize = 80;

const IGNORED_SCHEMES: [&str; 6] = ["data:", "blob:", "javascript:", "about:", "mailto:", "tel:"];

/// Reads the computed `background-image` of every element and its
/// `::before`/`::after` pseudo-elements.
pub const BACKGROUND_IMAGE_SCRIPT: &str = r#"
    (() => {
        const found = new Set();
        const pattern = /url\(\s*(['"]?)(.*?)\1\s*\)/g;
        const collect = (value) => {
            if (!value || value === 'none') return;
            let match;
            pattern.lastIndex = 0;
            while ((match = pattern.exec(value)) !== null) {
                if (match[2]) found.add(match[2]);
            }
        };
        document.querySelectorAll('*').forEach(el => {
            try {
                collect(getComputedStyle(el).backgroundImage);
                collect(getComputedStyle(el, '::before').backgroundImage);
                collect(getComputedStyle(el, '::after').backgroundImage);
            } catch (e) {}
        });
        return Array.from(found);
    })()
"#;

/// Run the computed background-image walk on the current page
#[instrument(skip(driver))]
pub async fn collect_background_images<D: PageDriver>(driver: &D) -> Result<Vec<String>> {
    let urls: Vec<String> = driver.evaluate_as(BACKGROUND_IMAGE_SCRIPT).await?;
    debug!("Computed styles reference {} background images", urls.len());
    Ok(urls)
}

/// Resolve a raw reference against `base`.
///
/// Returns `None` for empty and fragment-only references, non-fetchable
/// schemes, and anything that does not resolve to http(s). The fragment is
/// stripped from the result.
pub fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }
    let lower = reference.to_ascii_lowercase();
    if IGNORED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    let mut url = base.join(reference).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// One resource scheduled for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedResource {
    /// Normalized absolute URL
    pub url: Url,
    /// Classification at first discovery
    pub resource_type: ResourceType,
    /// Destination relative to the output root
    pub local_relative_path: String,
}

/// Deduplicated download plan, in discovery order
#[derive(Debug, Clone, Default)]
pub struct ResourcePlan {
    entries: Vec<PlannedResource>,
}

impl ResourcePlan {
    /// Planned resources in discovery order
    pub fn entries(&self) -> &[PlannedResource] {
        &self.entries
    }

    /// Number of distinct resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is planned
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ResourcePlan {
    type Item = PlannedResource;
    type IntoIter = std::vec::IntoIter<PlannedResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Accumulates references into a [`ResourcePlan`]
pub struct ResourceResolver {
    base: Url,
    seen: HashSet<String>,
    allocator: FilenameAllocator,
    entries: Vec<PlannedResource>,
}

impl ResourceResolver {
    /// Create a resolver for references relative to `base`
    pub fn new(base: Url) -> Self {
        Self {
            base,
            seen: HashSet::new(),
            allocator: FilenameAllocator::new(),
            entries: Vec::new(),
        }
    }

    /// Build the full plan for a page model plus the computed-style walk
    pub fn plan(model: &ExtractedPageModel, background_images: &[String]) -> Result<ResourcePlan> {
        let base = Url::parse(&model.base_url)
            .or_else(|_| Url::parse(&model.url))
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", model.base_url, e)))?;
        let mut resolver = Self::new(base);

        for href in &model.stylesheet_refs {
            resolver.add(href, ResourceType::Css);
        }
        for src in &model.script_refs {
            resolver.add(src, ResourceType::Js);
        }
        if let Some(ref favicon) = model.favicon {
            resolver.add(favicon, ResourceType::Image);
        }
        for image in &model.image_refs {
            for candidate in image.candidate_urls() {
                resolver.add(candidate, ResourceType::Image);
            }
        }
        for background in background_images {
            resolver.add(background, ResourceType::Image);
        }
        for font in &model.font_refs {
            resolver.add(font, ResourceType::Font);
        }

        let plan = resolver.finish();
        debug!("Planned {} distinct resources", plan.len());
        Ok(plan)
    }

    /// Add one reference. Returns whether it produced a new plan entry.
    pub fn add(&mut self, reference: &str, resource_type: ResourceType) -> bool {
        let Some(url) = resolve_reference(&self.base, reference) else {
            return false;
        };
        if !self.seen.insert(url.as_str().to_string()) {
            return false;
        }
        let local_relative_path = self.allocator.allocate(&url, resource_type);
        self.entries.push(PlannedResource {
            url,
            resource_type,
            local_relative_path,
        });
        true
    }

    /// Finish and return the plan
    pub fn finish(self) -> ResourcePlan {
        ResourcePlan {
            entries: self.entries,
        }
    }
}

/// Allocates unique file names per asset directory
#[derive(Debug, Clone)]
pub struct FilenameAllocator {
    taken: HashMap<&'static str, HashSet<String>>,
}

impl Default for FilenameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FilenameAllocator {
    /// An allocator with the consolidated file names already reserved
    pub fn new() -> Self {
        let mut taken: HashMap<&'static str, HashSet<String>> = HashMap::new();
        taken
            .entry(ResourceType::Css.directory())
            .or_default()
            .insert("consolidated.css".to_string());
        taken
            .entry(ResourceType::Js.directory())
            .or_default()
            .insert("consolidated.js".to_string());
        Self { taken }
    }

    /// Allocate `assets/<dir>/<name>` for `url`
    pub fn allocate(&mut self, url: &Url, resource_type: ResourceType) -> String {
        let directory = resource_type.directory();
        let name = file_name_for(url, resource_type);
        let taken = self.taken.entry(directory).or_default();

        let (stem, extension) = split_name(&name);
        let mut candidate = name.clone();
        let mut suffix = 1;
        while taken.contains(&candidate.to_lowercase()) {
            candidate = format!("{}-{}.{}", stem, suffix, extension);
            suffix += 1;
        }
        taken.insert(candidate.to_lowercase());
        format!("assets/{}/{}", directory, candidate)
    }
}

/// Local file name for a URL before collision handling
pub fn file_name_for(url: &Url, resource_type: ResourceType) -> String {
    let basename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    let sanitized = sanitize(basename);

    let has_extension = Path::new(&sanitized)
        .extension()
        .is_some_and(|ext| !ext.is_empty());
    if sanitized.is_empty() || !has_extension {
        return generated_name(url, resource_type);
    }

    let (stem, extension) = split_name(&sanitized);
    if stem.chars().count() > MAX_STEM_CHARS {
        let short: String = stem.chars().take(MAX_STEM_CHARS).collect();
        return format!("{}.{}", short, extension);
    }
    sanitized
}

/// `<stem>-<8 hex>.<ext>`, where the hex is the head of the URL's name-based
/// (v5) UUID, so the same URL gets the same name on every run
fn generated_name(url: &Url, resource_type: ResourceType) -> String {
    let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_str().as_bytes());
    let simple = id.simple().to_string();
    format!(
        "{}-{}.{}",
        resource_type.generic_stem(),
        &simple[..8],
        resource_type.default_extension()
    )
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i + 1..]),
        _ => (name, ""),
    }
}

//! The asset map and its records
//!
//! One [`ResourceRecord`] per distinct normalized absolute URL. The map is
//! filled once by the downloader and only read afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Kind of resource, which decides its output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Stylesheet
    Css,
    /// Script
    Js,
    /// Image, favicon, or CSS background
    Image,
    /// Web font
    Font,
    /// Anything else
    Other,
}

impl ResourceType {
    /// Every type, in report order
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Css,
        ResourceType::Js,
        ResourceType::Image,
        ResourceType::Font,
        ResourceType::Other,
    ];

    /// Directory under `assets/`
    pub fn directory(self) -> &'static str {
        match self {
            ResourceType::Css => "css",
            ResourceType::Js => "js",
            ResourceType::Image => "images",
            ResourceType::Font => "fonts",
            ResourceType::Other => "other",
        }
    }

    /// Extension used for generated file names
    pub fn default_extension(self) -> &'static str {
        match self {
            ResourceType::Css => "css",
            ResourceType::Js => "js",
            ResourceType::Image => "png",
            ResourceType::Font => "woff2",
            ResourceType::Other => "bin",
        }
    }

    /// Stem used for generated file names
    pub fn generic_stem(self) -> &'static str {
        match self {
            ResourceType::Css => "style",
            ResourceType::Js => "script",
            ResourceType::Image => "image",
            ResourceType::Font => "font",
            ResourceType::Other => "resource",
        }
    }

    /// Lowercase label for reports
    pub fn label(self) -> &'static str {
        match self {
            ResourceType::Css => "css",
            ResourceType::Js => "js",
            ResourceType::Image => "image",
            ResourceType::Font => "font",
            ResourceType::Other => "other",
        }
    }
}

/// Outcome of fetching one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    /// Written to `local_relative_path`
    Ok,
    /// Not available locally; references keep the original URL
    Failed,
}

/// Tracked download outcome for one distinct resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Normalized absolute URL
    pub original_url: String,
    /// Resource kind
    pub resource_type: ResourceType,
    /// Path relative to the output root, `/`-separated
    pub local_relative_path: String,
    /// Whether the file exists locally
    pub download_status: DownloadStatus,
    /// Why the download failed
    pub error_message: Option<String>,
    /// Bytes written
    pub size_bytes: Option<u64>,
    /// Fetch attempts made
    pub attempts: u32,
}

impl ResourceRecord {
    /// Whether the resource was stored locally
    pub fn is_ok(&self) -> bool {
        self.download_status == DownloadStatus::Ok
    }
}

/// Per-type success/failure counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Stored locally
    pub ok: usize,
    /// Failed
    pub failed: usize,
}

/// Deduplicated original-URL → local-resource table, in discovery order
#[derive(Debug, Clone, Default)]
pub struct AssetMap {
    records: Vec<ResourceRecord>,
    index: HashMap<String, usize>,
}

impl AssetMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record; the first record for a URL wins. Returns whether it
    /// was inserted.
    pub fn insert(&mut self, record: ResourceRecord) -> bool {
        if self.index.contains_key(&record.original_url) {
            return false;
        }
        self.index
            .insert(record.original_url.clone(), self.records.len());
        self.records.push(record);
        true
    }

    /// Look up the record for a normalized absolute URL
    pub fn get(&self, url: &str) -> Option<&ResourceRecord> {
        self.index.get(url).map(|&i| &self.records[i])
    }

    /// Local path for a URL whose download succeeded
    pub fn local_path(&self, url: &str) -> Option<&str> {
        self.get(url)
            .filter(|r| r.is_ok())
            .map(|r| r.local_relative_path.as_str())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.records.iter()
    }

    /// Records whose download failed
    pub fn failed(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.records.iter().filter(|r| !r.is_ok())
    }

    /// Records of one type
    pub fn count_by_type(&self, resource_type: ResourceType) -> usize {
        self.records
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .count()
    }

    /// Records with one status
    pub fn count_by_status(&self, status: DownloadStatus) -> usize {
        self.records
            .iter()
            .filter(|r| r.download_status == status)
            .count()
    }

    /// Success/failure counts for every type present
    pub fn type_counts(&self) -> BTreeMap<ResourceType, StatusCounts> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            let entry: &mut StatusCounts = counts.entry(record.resource_type).or_default();
            match record.download_status {
                DownloadStatus::Ok => entry.ok += 1,
                DownloadStatus::Failed => entry.failed += 1,
            }
        }
        counts
    }

    /// Owned copy of the records
    pub fn to_records(&self) -> Vec<ResourceRecord> {
        self.records.clone()
    }
}

impl FromIterator<ResourceRecord> for AssetMap {
    fn from_iter<I: IntoIterator<Item = ResourceRecord>>(iter: I) -> Self {
        let mut map = AssetMap::new();
        for record in iter {
            map.insert(record);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, ty: ResourceType, status: DownloadStatus) -> ResourceRecord {
        ResourceRecord {
            original_url: url.to_string(),
            resource_type: ty,
            local_relative_path: format!("assets/{}/x", ty.directory()),
            download_status: status,
            error_message: None,
            size_bytes: None,
            attempts: 1,
        }
    }

    #[test]
    fn test_first_record_wins() {
        let mut map = AssetMap::new();
        assert!(map.insert(record("https://a/x.css", ResourceType::Css, DownloadStatus::Ok)));
        assert!(!map.insert(record("https://a/x.css", ResourceType::Image, DownloadStatus::Failed)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("https://a/x.css").unwrap().resource_type, ResourceType::Css);
    }

    #[test]
    fn test_local_path_only_for_ok() {
        let map: AssetMap = vec![
            record("https://a/ok.png", ResourceType::Image, DownloadStatus::Ok),
            record("https://a/bad.png", ResourceType::Image, DownloadStatus::Failed),
        ]
        .into_iter()
        .collect();
        assert!(map.local_path("https://a/ok.png").is_some());
        assert!(map.local_path("https://a/bad.png").is_none());
        assert!(map.local_path("https://a/unknown.png").is_none());
        assert_eq!(map.failed().count(), 1);
    }

    #[test]
    fn test_type_counts() {
        let map: AssetMap = vec![
            record("https://a/1.css", ResourceType::Css, DownloadStatus::Ok),
            record("https://a/2.css", ResourceType::Css, DownloadStatus::Failed),
            record("https://a/1.js", ResourceType::Js, DownloadStatus::Ok),
        ]
        .into_iter()
        .collect();
        let counts = map.type_counts();
        assert_eq!(counts[&ResourceType::Css], StatusCounts { ok: 1, failed: 1 });
        assert_eq!(counts[&ResourceType::Js], StatusCounts { ok: 1, failed: 0 });
        assert!(!counts.contains_key(&ResourceType::Font));
        assert_eq!(map.count_by_status(DownloadStatus::Ok), 2);
    }

    #[test]
    fn test_directories() {
        assert_eq!(ResourceType::Image.directory(), "images");
        assert_eq!(ResourceType::Font.directory(), "fonts");
        let json = serde_json::to_string(&DownloadStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }
}

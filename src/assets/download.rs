//! Bounded-concurrency resource downloads
//!
//! Every planned resource ends as exactly one [`ResourceRecord`]. A failed
//! fetch or write is recorded on that record and never cancels siblings.
//! Bodies are streamed to disk and capped at `max_bytes`; a failed attempt
//! leaves no file behind.

use crate::assets::map::{AssetMap, DownloadStatus, ResourceRecord};
use crate::assets::resolve::{PlannedResource, ResourcePlan};
use crate::config::DownloadConfig;
use crate::error::{DownloadError, Error, Result};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Fetches a [`ResourcePlan`] into the output directory
#[derive(Clone)]
pub struct ResourceDownloader {
    client: reqwest::Client,
    config: DownloadConfig,
    output_root: PathBuf,
}

impl ResourceDownloader {
    /// Create a downloader writing below `output_root`
    pub fn new(config: &DownloadConfig, output_root: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| Error::generic(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
            output_root: output_root.into(),
        })
    }

    /// Download every planned resource and return the asset map in plan order
    #[instrument(skip(self, plan), fields(resources = plan.len()))]
    pub async fn download_all(&self, plan: ResourcePlan) -> AssetMap {
        let concurrency = self.config.concurrency.max(1);
        info!(
            "Downloading {} resources ({} at a time)",
            plan.len(),
            concurrency
        );

        let mut records: Vec<(usize, ResourceRecord)> = stream::iter(plan.into_iter().enumerate())
            .map(|(index, planned)| async move { (index, self.download_one(planned).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        records.sort_by_key(|(index, _)| *index);

        let map: AssetMap = records.into_iter().map(|(_, record)| record).collect();
        info!(
            "Downloads finished: {} ok, {} failed",
            map.count_by_status(DownloadStatus::Ok),
            map.count_by_status(DownloadStatus::Failed)
        );
        map
    }

    /// Fetch and store one resource, retrying transient failures
    pub async fn download_one(&self, planned: PlannedResource) -> ResourceRecord {
        let mut attempts = 0;
        let outcome = loop {
            attempts += 1;
            match self.fetch(&planned.url, &planned.local_relative_path).await {
                Ok(size) => break Ok(size),
                Err(e) if e.is_transient() && attempts <= self.config.retries => {
                    debug!("Retrying {} after: {}", planned.url, e);
                    tokio::time::sleep(Duration::from_millis(self.config.retry_backoff_ms)).await;
                }
                Err(e) => break Err(e),
            }
        };

        let (download_status, error_message, size_bytes) = match outcome {
            Ok(size) => (DownloadStatus::Ok, None, Some(size)),
            Err(e) => {
                warn!("Failed to download {}: {}", planned.url, e);
                (DownloadStatus::Failed, Some(e.to_string()), None)
            }
        };

        ResourceRecord {
            original_url: planned.url.to_string(),
            resource_type: planned.resource_type,
            local_relative_path: planned.local_relative_path,
            download_status,
            error_message,
            size_bytes,
            attempts,
        }
    }

    /// Fetch `url` into `relative`, removing the partial file on failure
    async fn fetch(&self, url: &Url, relative: &str) -> std::result::Result<u64, DownloadError> {
        let path = self.output_root.join(relative);
        let result = self.fetch_to(url, &path).await;
        if result.is_err() && tokio::fs::remove_file(&path).await.is_ok() {
            debug!("Removed partial download {}", path.display());
        }
        result
    }

    async fn fetch_to(&self, url: &Url, path: &Path) -> std::result::Result<u64, DownloadError> {
        let timeout_ms = self.config.timeout_ms;
        let max_bytes = self.config.max_bytes;
        let response = self
            .client
            .get(url.clone())
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| classify(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(DownloadError::TooLarge(max_bytes));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(parent, e))?;
        }
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| write_error(path, e))?;

        let mut written: u64 = 0;
        let mut body = std::pin::pin!(response.bytes_stream());
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| classify(e, timeout_ms))?;
            written += chunk.len() as u64;
            if written > max_bytes {
                return Err(DownloadError::TooLarge(max_bytes));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| write_error(path, e))?;
        }
        file.flush().await.map_err(|e| write_error(path, e))?;
        Ok(written)
    }
}

fn classify(err: reqwest::Error, timeout_ms: u64) -> DownloadError {
    if err.is_timeout() {
        DownloadError::Timeout(timeout_ms)
    } else {
        DownloadError::Network(err.to_string())
    }
}

fn write_error(path: &Path, err: std::io::Error) -> DownloadError {
    DownloadError::Write(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::map::ResourceType;
    use crate::assets::resolve::ResourceResolver;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(timeout_ms: u64, retries: u32) -> DownloadConfig {
        DownloadConfig {
            concurrency: 4,
            timeout_ms,
            retries,
            retry_backoff_ms: 10,
            ..Default::default()
        }
    }

    fn plan_for(server: &MockServer, refs: &[(&str, ResourceType)]) -> ResourcePlan {
        let base = Url::parse(&server.uri()).unwrap();
        let mut resolver = ResourceResolver::new(base);
        for (reference, ty) in refs {
            resolver.add(reference, *ty);
        }
        resolver.finish()
    }

    #[tokio::test]
    async fn test_download_ok_and_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/style.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string("body{}"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = ResourceDownloader::new(&config(5000, 0), dir.path()).unwrap();
        let plan = plan_for(
            &server,
            &[("/style.css", ResourceType::Css), ("/missing.png", ResourceType::Image)],
        );

        let map = downloader.download_all(plan).await;
        assert_eq!(map.len(), 2);

        let records: Vec<&ResourceRecord> = map.iter().collect();
        assert_eq!(records[0].download_status, DownloadStatus::Ok);
        assert_eq!(records[0].size_bytes, Some(6));
        let written = std::fs::read_to_string(dir.path().join("assets/css/style.css")).unwrap();
        assert_eq!(written, "body{}");

        assert_eq!(records[1].download_status, DownloadStatus::Failed);
        assert_eq!(records[1].error_message.as_deref(), Some("HTTP status 404"));
        assert!(!dir.path().join("assets/images/missing.png").exists());
    }

    #[tokio::test]
    async fn test_timeout_becomes_failed_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.js"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(2000)))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = ResourceDownloader::new(&config(200, 0), dir.path()).unwrap();
        let plan = plan_for(&server, &[("/slow.js", ResourceType::Js)]);

        let map = downloader.download_all(plan).await;
        let record = map.iter().next().unwrap();
        assert_eq!(record.download_status, DownloadStatus::Failed);
        assert!(record.error_message.as_deref().unwrap().contains("timed out"));
        assert_eq!(record.attempts, 1);
    }

    #[tokio::test]
    async fn test_retries_only_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky.css"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a{}"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.css"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = ResourceDownloader::new(&config(5000, 2), dir.path()).unwrap();
        let plan = plan_for(
            &server,
            &[("/flaky.css", ResourceType::Css), ("/gone.css", ResourceType::Css)],
        );

        let map = downloader.download_all(plan).await;
        let records: Vec<&ResourceRecord> = map.iter().collect();
        assert_eq!(records[0].download_status, DownloadStatus::Ok);
        assert_eq!(records[0].attempts, 2);
        assert_eq!(records[1].download_status, DownloadStatus::Failed);
        assert_eq!(records[1].attempts, 1);
    }

    #[tokio::test]
    async fn test_oversized_body_is_failed_and_not_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/huge.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/small.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 16]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = config(5000, 2);
        config.max_bytes = 1024;
        let downloader = ResourceDownloader::new(&config, dir.path()).unwrap();
        let plan = plan_for(
            &server,
            &[("/huge.png", ResourceType::Image), ("/small.png", ResourceType::Image)],
        );

        let map = downloader.download_all(plan).await;
        let records: Vec<&ResourceRecord> = map.iter().collect();
        assert_eq!(records[0].download_status, DownloadStatus::Failed);
        assert_eq!(records[0].error_message.as_deref(), Some("larger than 1024 bytes"));
        assert_eq!(records[0].attempts, 1);
        assert!(!dir.path().join("assets/images/huge.png").exists());

        assert_eq!(records[1].size_bytes, Some(16));
        assert_eq!(std::fs::read(dir.path().join("assets/images/small.png")).unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ResourceDownloader::new(&config(2000, 0), dir.path()).unwrap();
        let mut resolver = ResourceResolver::new(Url::parse("http://127.0.0.1:9/").unwrap());
        resolver.add("/x.png", ResourceType::Image);

        let map = downloader.download_all(resolver.finish()).await;
        assert_eq!(map.count_by_status(DownloadStatus::Failed), 1);
    }
}

//! The mirror job
//!
//! [`MirrorJob`] drives one URL through
//! `Init → Loading → Extracting → Downloading → Rewriting → Reporting → Done`.
//! Navigation failures and filesystem failures end the job in `Failed`;
//! everything else is absorbed into warnings or failed resource records.
//! The page driver is consumed by the job and closed exactly once, whatever
//! the outcome.

use crate::assets::{
    collect_background_images, AssetMap, ResourceDownloader, ResourcePlan, ResourceResolver,
    CONSOLIDATED_CSS_PATH, CONSOLIDATED_JS_PATH,
};
use crate::browser::{BrowserSession, PageCapture, PageDriver, UrlValidator};
use crate::config::MirrorConfig;
use crate::error::{Error, Result};
use crate::extraction::{ExtractedPageModel, PageExtractor, StaticExtractor, StyleCapture, StyleExtractor};
use crate::report::{render_html, scaffold_files, AnalysisReport, REPORT_HTML, REPORT_JSON};
use crate::rewrite::{
    inject, rewrite_captured_css, rewrite_stylesheet_files, DocumentRewriter, InjectionContext,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

/// Name of the rewritten document
pub const INDEX_HTML: &str = "index.html";

/// Stage of a mirror job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Created, nothing started
    Init,
    /// Navigating to the target
    Loading,
    /// Reading the rendered page
    Extracting,
    /// Fetching resources and capturing styles
    Downloading,
    /// Writing the rewritten document
    Rewriting,
    /// Writing the report and scaffolds
    Reporting,
    /// Finished successfully
    Done,
    /// Aborted by a fatal error
    Failed,
}

impl JobState {
    /// Whether the job has stopped
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Init => "init",
            JobState::Loading => "loading",
            JobState::Extracting => "extracting",
            JobState::Downloading => "downloading",
            JobState::Rewriting => "rewriting",
            JobState::Reporting => "reporting",
            JobState::Done => "done",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a finished job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorOutcome {
    /// Job identifier
    pub job_id: Uuid,
    /// Whether the job reached `Done`
    pub success: bool,
    /// Terminal state
    pub state: JobState,
    /// Every state the job passed through, in order
    pub history: Vec<JobState>,
    /// Output root
    pub output_dir: PathBuf,
    /// Files written, in write order (excluding downloaded resources)
    pub artifacts: Vec<PathBuf>,
    /// Fatal error message
    pub error: Option<String>,
    /// Non-fatal problems
    pub warnings: Vec<String>,
}

/// One mirror job
pub struct MirrorJob {
    id: Uuid,
    config: MirrorConfig,
    state: JobState,
    history: Vec<JobState>,
    warnings: Vec<String>,
    artifacts: Vec<PathBuf>,
}

/// Everything gathered from the live page
struct PageSnapshot {
    html: String,
    model: ExtractedPageModel,
    background_images: Vec<String>,
    captured_at: DateTime<Utc>,
}

impl MirrorJob {
    /// Create a job in the `Init` state
    pub fn new(config: MirrorConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            state: JobState::Init,
            history: vec![JobState::Init],
            warnings: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Job identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Job configuration
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Launch a browser and run the job with it
    pub async fn run(self) -> MirrorOutcome {
        if let Err(e) = UrlValidator::validate(&self.config.target_url) {
            return self.finish(Err(Error::InvalidUrl(e)));
        }
        match BrowserSession::initialize(&self.config.browser).await {
            Ok(session) => self.run_with(session).await,
            Err(e) => self.finish(Err(e)),
        }
    }

    /// Run the job against `driver`, closing it exactly once afterwards
    pub async fn run_with<D: PageDriver>(mut self, driver: D) -> MirrorOutcome {
        let result = self.execute(&driver).await;

        if let Err(e) = driver.close().await {
            warn!("Failed to release the page: {}", e);
            self.warnings.push(format!("Failed to release the browser: {}", e));
        }

        self.finish(result)
    }

    fn transition(&mut self, next: JobState) {
        debug!("Job {}: {} -> {}", self.id, self.state, next);
        self.state = next;
        self.history.push(next);
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    fn finish(mut self, result: Result<()>) -> MirrorOutcome {
        let error = match result {
            Ok(()) => {
                self.transition(JobState::Done);
                info!(
                    "Mirror of {} complete in {} ({} warnings)",
                    self.config.target_url,
                    self.config.output_dir.display(),
                    self.warnings.len()
                );
                None
            }
            Err(e) => {
                error!(fatal = e.is_fatal(), "Mirror of {} failed: {}", self.config.target_url, e);
                self.transition(JobState::Failed);
                Some(e.to_string())
            }
        };

        MirrorOutcome {
            job_id: self.id,
            success: error.is_none(),
            state: self.state,
            history: self.history,
            output_dir: self.config.output_dir,
            artifacts: self.artifacts,
            error,
            warnings: self.warnings,
        }
    }

    #[instrument(skip(self, driver), fields(job_id = %self.id, url = %self.config.target_url))]
    async fn execute<D: PageDriver>(&mut self, driver: &D) -> Result<()> {
        self.transition(JobState::Loading);
        UrlValidator::validate(&self.config.target_url).map_err(Error::InvalidUrl)?;
        self.create_output_dirs().await?;
        let target = self.config.target_url.clone();
        let navigation = driver.navigate(&target, &self.config.load).await?;
        info!("Page loaded: {}", navigation.final_url);

        self.transition(JobState::Extracting);
        let snapshot = self.snapshot(driver, &navigation.final_url).await;

        self.transition(JobState::Downloading);
        let plan = match ResourceResolver::plan(&snapshot.model, &snapshot.background_images) {
            Ok(plan) => plan,
            Err(e) => {
                self.warn(format!("Could not resolve resources: {}", e));
                ResourcePlan::default()
            }
        };
        let downloader = ResourceDownloader::new(&self.config.download, &self.config.output_dir)?;
        let (assets, styles) =
            tokio::join!(downloader.download_all(plan), StyleExtractor::capture(driver));
        let styles = match styles {
            Ok(styles) => Some(styles),
            Err(e) => {
                self.warn(format!("Style capture failed: {}", e));
                None
            }
        };

        self.transition(JobState::Rewriting);
        self.rewrite(&snapshot, &assets, styles.as_ref()).await?;

        self.transition(JobState::Reporting);
        self.report(&snapshot, &assets, styles.as_ref()).await?;

        Ok(())
    }

    async fn create_output_dirs(&self) -> Result<()> {
        let root = &self.config.output_dir;
        for dir in ["css", "js", "images", "fonts"] {
            let path = root.join("assets").join(dir);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| Error::filesystem(&path, e))?;
        }
        debug!("Output directories ready under {}", root.display());
        Ok(())
    }

    /// Read everything the later stages need from the page. Page calls run
    /// one after another; failures fall back to what is still available.
    async fn snapshot<D: PageDriver>(&mut self, driver: &D, final_url: &str) -> PageSnapshot {
        let captured_at = Utc::now();

        let html = match PageCapture::html(driver).await {
            Ok(html) => html,
            Err(e) => {
                self.warn(format!("Could not capture rendered HTML: {}", e));
                skeleton_document(final_url)
            }
        };

        let model = match PageExtractor::extract(driver, final_url).await {
            Ok(model) => model,
            Err(e) => {
                self.warn(format!(
                    "In-page extraction failed, using static extraction: {}",
                    e
                ));
                StaticExtractor::extract(&html, final_url)
            }
        };
        info!("Extracted {}", model.summary());

        let background_images = match collect_background_images(driver).await {
            Ok(urls) => urls,
            Err(e) => {
                self.warn(format!("Computed background walk failed: {}", e));
                Vec::new()
            }
        };

        PageSnapshot {
            html,
            model,
            background_images,
            captured_at,
        }
    }

    async fn rewrite(
        &mut self,
        snapshot: &PageSnapshot,
        assets: &AssetMap,
        styles: Option<&StyleCapture>,
    ) -> Result<()> {
        let model = &snapshot.model;
        let base = Url::parse(&model.base_url)
            .or_else(|_| Url::parse(&model.url))
            .or_else(|_| Url::parse(&self.config.target_url))
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let (rewritten, stats) = DocumentRewriter::new(&base, assets).rewrite(&snapshot.html);
        debug!("Document rewrite: {:?}", stats);
        let captured_at = snapshot.captured_at.to_rfc3339();
        let document = inject(
            &rewritten,
            &InjectionContext {
                source_url: &model.url,
                captured_at: &captured_at,
                technologies: &model.detected_technologies,
            },
        );
        self.write_artifact(INDEX_HTML, &document).await?;

        let root = self.config.output_dir.clone();
        for warning in rewrite_stylesheet_files(&root, assets).await {
            self.warn(warning);
        }

        if let Some(styles) = styles {
            let css = rewrite_captured_css(styles, &base, assets);
            self.write_artifact(CONSOLIDATED_CSS_PATH, &css).await?;
            self.write_artifact(CONSOLIDATED_JS_PATH, &styles.consolidated_js())
                .await?;
        }
        Ok(())
    }

    async fn report(
        &mut self,
        snapshot: &PageSnapshot,
        assets: &AssetMap,
        styles: Option<&StyleCapture>,
    ) -> Result<()> {
        let report = AnalysisReport::build(
            &snapshot.model,
            assets,
            styles,
            &self.warnings,
            snapshot.captured_at,
        );
        let json = report.to_json()?;
        self.write_artifact(REPORT_JSON, &json).await?;
        self.write_artifact(REPORT_HTML, &render_html(&report)).await?;

        for file in scaffold_files(&snapshot.model, &report) {
            self.write_artifact(file.name, &file.contents).await?;
        }
        info!(
            "Report: {} recommendations, {} warnings",
            report.recommendations.len(),
            report.warnings.len()
        );
        Ok(())
    }

    async fn write_artifact(&mut self, relative: &str, contents: &str) -> Result<()> {
        let path = self.config.output_dir.join(relative);
        write_file(&path, contents).await?;
        debug!("Wrote {}", path.display());
        self.artifacts.push(path);
        Ok(())
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::filesystem(parent, e))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| Error::filesystem(path, e))
}

fn skeleton_document(url: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body></body></html>",
        htmlescape::encode_minimal(url)
    )
}

/// Mirror `config.target_url` with a freshly launched browser
pub async fn mirror(config: MirrorConfig) -> MirrorOutcome {
    MirrorJob::new(config).run().await
}

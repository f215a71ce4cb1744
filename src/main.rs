//! SiteMirror command line
//!
//! Mirrors one page into a local directory.

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use sitemirror::config::default_output_dir;
use sitemirror::{mirror, BrowserConfig, MirrorConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Render a live web page and mirror it locally
#[derive(Parser, Debug)]
#[command(name = "sitemirror")]
#[command(version)]
#[command(about = "Render a live web page and mirror it into a local directory")]
struct Args {
    /// Page to mirror (http or https)
    url: Option<String>,

    /// Output directory (default: cloned-<host>)
    output: Option<PathBuf>,

    /// Maximum concurrent resource downloads
    #[arg(long, default_value = "6")]
    concurrency: usize,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Delay after network idle before extraction, in milliseconds
    #[arg(long, default_value = "2000")]
    settle_ms: u64,

    /// Per-resource download timeout in milliseconds
    #[arg(long, default_value = "15000")]
    resource_timeout_ms: u64,

    /// Largest resource stored, in MiB
    #[arg(long, default_value = "50")]
    max_resource_mb: u64,

    /// Extra attempts for transient download failures
    #[arg(long, default_value = "0")]
    retries: u32,

    /// Path to Chrome/Chromium executable
    #[arg(long)]
    chrome_path: Option<String>,

    /// Disable the Chromium sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let Some(url) = args.url.clone() else {
        Args::command()
            .print_help()
            .context("failed to print usage")?;
        println!();
        return Ok(());
    };

    // Initialize tracing
    let default_filter = if args.verbose { "sitemirror=debug" } else { "sitemirror=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut browser = BrowserConfig::builder()
        .headless(!args.headful)
        .sandbox(!args.no_sandbox);
    if let Some(ref path) = args.chrome_path {
        browser = browser.chrome_path(path);
    }

    let output = args.output.unwrap_or_else(|| default_output_dir(&url));
    let config = MirrorConfig::builder(url)
        .output_dir(output)
        .browser(browser.build())
        .timeout_ms(args.timeout_ms)
        .settle_ms(args.settle_ms)
        .concurrency(args.concurrency)
        .resource_timeout_ms(args.resource_timeout_ms)
        .retries(args.retries)
        .max_resource_bytes(args.max_resource_mb.saturating_mul(1024 * 1024))
        .build();

    tracing::info!(
        "Mirroring {} into {}",
        config.target_url,
        config.output_dir.display()
    );

    let outcome = mirror(config).await;
    if !outcome.success {
        bail!(
            "mirror failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("Mirrored into {}", outcome.output_dir.display());
    for artifact in &outcome.artifacts {
        println!("  {}", artifact.display());
    }
    if !outcome.warnings.is_empty() {
        println!(
            "{} warnings; see analysis-report.html for details",
            outcome.warnings.len()
        );
    }
    Ok(())
}

//! Analysis report and derived artifacts

pub mod analysis;
pub mod html;
pub mod scaffold;

pub use analysis::{
    recommendations, AnalysisReport, AssetSummary, HeuristicChecks, PageSummary, StyleSummary,
    IMAGE_COUNT_THRESHOLD, SCRIPT_COUNT_THRESHOLD,
};
pub use html::render_html;
pub use scaffold::{package_name, scaffold_files, ScaffoldFile};

/// File name of the machine-readable report
pub const REPORT_JSON: &str = "analysis-report.json";

/// File name of the human-readable report
pub const REPORT_HTML: &str = "analysis-report.html";

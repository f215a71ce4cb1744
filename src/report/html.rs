//! Human-readable rendering of the analysis report

use crate::assets::DownloadStatus;
use crate::report::analysis::AnalysisReport;
use htmlescape::encode_minimal as esc;
use std::fmt::Write;

const STYLE: &str = "body{font:14px/1.5 system-ui,sans-serif;margin:2rem;color:#111827}\
table{border-collapse:collapse;margin:0 0 1.5rem;min-width:40rem}\
th,td{border:1px solid #d1d5db;padding:4px 8px;text-align:left;vertical-align:top}\
th{background:#f3f4f6}.ok{color:#047857}.failed{color:#b91c1c}";

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn row(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "<tr><th>{}</th><td>{}</td></tr>", esc(key), esc(value));
}

fn optional(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// Render the report as a standalone HTML document
pub fn render_html(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let title = report.page.title.as_deref().unwrap_or(&report.page.url);

    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>Analysis report: {}</title>", esc(title));
    let _ = writeln!(out, "<style>{}</style>\n</head>\n<body>", STYLE);
    let _ = writeln!(out, "<h1>Analysis report</h1>");
    let _ = writeln!(
        out,
        "<p>Generated {}</p>",
        esc(&report.generated_at.to_rfc3339())
    );

    out.push_str("<h2>Page</h2>\n<table>\n");
    row(&mut out, "URL", &report.page.url);
    row(&mut out, "Title", optional(&report.page.title));
    row(&mut out, "Description", optional(&report.page.description));
    row(&mut out, "Language", optional(&report.page.language));
    row(&mut out, "Canonical", optional(&report.page.canonical));
    row(&mut out, "Links", &format!(
        "{} ({} internal, {} external)",
        report.page.link_count, report.page.internal_links, report.page.external_links
    ));
    row(&mut out, "Forms", &report.page.form_count.to_string());
    row(&mut out, "Technologies", &if report.technologies.is_empty() {
        "-".to_string()
    } else {
        report.technologies.join(", ")
    });
    out.push_str("</table>\n");

    let checks = &report.checks;
    out.push_str("<h2>Checks</h2>\n<table>\n");
    row(&mut out, "Title present", yes_no(checks.has_title));
    row(&mut out, "Description present", yes_no(checks.has_description));
    row(&mut out, "Viewport present", yes_no(checks.has_viewport));
    row(&mut out, "Favicon present", yes_no(checks.has_favicon));
    row(&mut out, "Structured data present", yes_no(checks.has_structured_data));
    row(
        &mut out,
        "Image alt coverage",
        &format!("{:.0}%", checks.image_alt_coverage * 100.0),
    );
    row(&mut out, "Headings present", yes_no(checks.has_headings));
    row(&mut out, "Landmarks present", yes_no(checks.has_landmarks));
    out.push_str("</table>\n");

    out.push_str("<h2>Recommendations</h2>\n");
    list(&mut out, &report.recommendations, "No recommendations.");

    out.push_str("<h2>Warnings</h2>\n");
    list(&mut out, &report.warnings, "No warnings.");

    let _ = writeln!(
        out,
        "<h2>Resources</h2>\n<p>{} total, {} downloaded, {} failed</p>",
        report.assets.total, report.assets.ok, report.assets.failed
    );
    out.push_str("<table>\n<tr><th>Type</th><th>Status</th><th>URL</th><th>Local path</th><th>Detail</th></tr>\n");
    for record in &report.resources {
        let (class, status) = match record.download_status {
            DownloadStatus::Ok => ("ok", "ok"),
            DownloadStatus::Failed => ("failed", "failed"),
        };
        let detail = match (&record.error_message, record.size_bytes) {
            (Some(message), _) => message.clone(),
            (None, Some(size)) => format!("{} bytes", size),
            (None, None) => String::new(),
        };
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            record.resource_type.label(),
            class,
            status,
            esc(&record.original_url),
            esc(&record.local_relative_path),
            esc(&detail)
        );
    }
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

fn list(out: &mut String, items: &[String], empty: &str) {
    if items.is_empty() {
        let _ = writeln!(out, "<p>{}</p>", esc(empty));
        return;
    }
    out.push_str("<ul>\n");
    for item in items {
        let _ = writeln!(out, "<li>{}</li>", esc(item));
    }
    out.push_str("</ul>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetMap;
    use crate::extraction::ExtractedPageModel;
    use chrono::Utc;

    #[test]
    fn test_render_escapes_page_text() {
        let mut model = ExtractedPageModel::empty("https://example.com/?q=<script>");
        model.title = Some("<b>Bold & brave</b>".to_string());
        let report = AnalysisReport::build(&model, &AssetMap::new(), None, &[], Utc::now());

        let html = render_html(&report);
        assert!(html.contains("&lt;b&gt;Bold &amp; brave&lt;/b&gt;"));
        assert!(!html.contains("<b>Bold"));
        assert!(!html.contains("q=<script>"));
        assert!(html.contains("<li>Add a meta description</li>"));
        assert!(html.contains("No warnings."));
    }
}

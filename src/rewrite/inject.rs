//! Mirror banner and diagnostic script injection
//!
//! Both additions are self-contained: the banner only adds one fixed
//! element, and the script only logs and listens for Shift + right-click.

use crate::rewrite::css::regex;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Element id of the injected banner
pub const BANNER_ID: &str = "sitemirror-banner";

/// Element id of the inspector overlay
pub const INSPECTOR_ID: &str = "sitemirror-inspector";

/// What the injected markup displays
#[derive(Debug, Clone)]
pub struct InjectionContext<'a> {
    /// URL the page was mirrored from
    pub source_url: &'a str,
    /// Capture time, already formatted
    pub captured_at: &'a str,
    /// Technology labels to log
    pub technologies: &'a BTreeSet<String>,
}

/// Comments and `<script>`/`<style>` elements are matched whole so a body tag
/// inside them is never taken for the real one.
fn body_scan_regex() -> &'static Regex {
    static BODY_SCAN: OnceLock<Regex> = OnceLock::new();
    BODY_SCAN.get_or_init(|| {
        regex(
            r#"(?is)<!--.*?-->|<script\b(?:"[^"]*"|'[^']*'|[^'">])*>.*?</script\s*>|<style\b(?:"[^"]*"|'[^']*'|[^'">])*>.*?</style\s*>|(<body\b(?:"[^"]*"|'[^']*'|[^'">])*>)|(</body\s*>)"#,
            "body scan",
        )
    })
}

/// End of the first real `<body>` start tag and start of the last real
/// `</body>` after it
fn body_bounds(html: &str) -> Option<(usize, Option<usize>)> {
    let mut open = None;
    let mut close = None;
    for caps in body_scan_regex().captures_iter(html) {
        if let Some(m) = caps.get(1) {
            open.get_or_insert(m.end());
        } else if let Some(m) = caps.get(2) {
            if open.is_some() {
                close = Some(m.start());
            }
        }
    }
    open.map(|open| (open, close))
}

/// The dismissible banner element
pub fn banner_html(ctx: &InjectionContext<'_>) -> String {
    format!(
        concat!(
            r#"<div id="{id}" style="position:fixed;top:0;left:0;right:0;z-index:2147483647;"#,
            r#"background:#1f2937;color:#f9fafb;font:13px/1.4 system-ui,sans-serif;padding:8px 40px 8px 12px;">"#,
            r#"Mirrored copy of <a href="{url}" style="color:#93c5fd;">{url_text}</a> captured {at}"#,
            r#"<button type="button" aria-label="Dismiss" onclick="this.parentNode.remove()" "#,
            r#"style="position:absolute;right:8px;top:4px;background:none;border:0;color:inherit;font-size:18px;cursor:pointer;">&times;</button>"#,
            "</div>"
        ),
        id = BANNER_ID,
        url = htmlescape::encode_minimal(ctx.source_url),
        url_text = htmlescape::encode_minimal(ctx.source_url),
        at = htmlescape::encode_minimal(ctx.captured_at),
    )
}

/// Technologies as a JSON array safe to embed in a `<script>` element
pub fn technologies_json(technologies: &BTreeSet<String>) -> String {
    serde_json::to_string(technologies)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c")
}

/// The diagnostic script element
pub fn diagnostic_script(ctx: &InjectionContext<'_>) -> String {
    let script = r#"<script>
(function () {
    var technologies = __TECHNOLOGIES__;
    console.log('[sitemirror] Detected technologies:', technologies.length ? technologies.join(', ') : 'none');
    document.addEventListener('contextmenu', function (event) {
        if (!event.shiftKey) return;
        event.preventDefault();
        var el = event.target;
        var existing = document.getElementById('__INSPECTOR_ID__');
        if (existing) existing.remove();
        var rect = el.getBoundingClientRect();
        var panel = document.createElement('pre');
        panel.id = '__INSPECTOR_ID__';
        panel.style.cssText = 'position:fixed;bottom:12px;right:12px;z-index:2147483647;max-width:420px;' +
            'margin:0;padding:10px;background:#111827;color:#e5e7eb;font:12px/1.4 monospace;' +
            'white-space:pre-wrap;border-radius:6px;box-shadow:0 4px 16px rgba(0,0,0,.4);';
        panel.textContent = [
            'tag: ' + el.tagName.toLowerCase(),
            'id: ' + (el.id || '-'),
            'classes: ' + (el.className && typeof el.className === 'string' ? el.className : '-'),
            'size: ' + Math.round(rect.width) + 'x' + Math.round(rect.height),
            'text: ' + (el.textContent || '').trim().slice(0, 120)
        ].join('\n');
        panel.addEventListener('click', function () { panel.remove(); });
        document.body.appendChild(panel);
        console.log('[sitemirror] Inspected element:', el);
    });
})();
</script>"#;
    script
        .replace("__TECHNOLOGIES__", &technologies_json(ctx.technologies))
        .replace("__INSPECTOR_ID__", INSPECTOR_ID)
}

/// Insert the banner after `<body>` and the script before `</body>`.
///
/// Body tags inside comments, scripts and style blocks are ignored.
/// Documents without a body element get both appended at the end.
pub fn inject(html: &str, ctx: &InjectionContext<'_>) -> String {
    let banner = banner_html(ctx);
    let script = diagnostic_script(ctx);
    let mut out = String::with_capacity(html.len() + banner.len() + script.len() + 2);

    let Some((open, close)) = body_bounds(html) else {
        out.push_str(html);
        out.push_str(&banner);
        out.push_str(&script);
        return out;
    };

    out.push_str(&html[..open]);
    out.push_str(&banner);
    match close {
        Some(close) => {
            out.push_str(&html[open..close]);
            out.push_str(&script);
            out.push_str(&html[close..]);
        }
        None => {
            out.push_str(&html[open..]);
            out.push_str(&script);
        }
    }
    out
}

//! Static scaffold and packaging files
//!
//! Inert text: component stubs carrying the page's title, description and
//! navigation as placeholder content, plus a package manifest, a container
//! descriptor and a README.

use crate::extraction::{ExtractedPageModel, MetadataExtractor};
use crate::report::analysis::AnalysisReport;
use serde::Serialize;
use serde_json::json;
use url::Url;

/// One generated file, relative to the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldFile {
    /// File name
    pub name: &'static str,
    /// Full contents
    pub contents: String,
}

#[derive(Debug, Serialize)]
struct NavLink {
    href: String,
    text: String,
}

/// Serialize a value as a JavaScript literal that is safe inside markup
fn js_literal<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

/// Package name derived from the page host
pub fn package_name(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    let slug: String = host
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "cloned-website".to_string()
    } else {
        format!("cloned-{}", slug)
    }
}

fn navigation(model: &ExtractedPageModel) -> Vec<NavLink> {
    let links = model
        .navigation_blocks
        .first()
        .map(|block| block.links.as_slice())
        .unwrap_or(&[]);
    links
        .iter()
        .filter(|l| !l.text.is_empty())
        .take(12)
        .map(|l| NavLink {
            href: l.href.clone(),
            text: l.text.clone(),
        })
        .collect()
}

/// Every scaffold file for the job
pub fn scaffold_files(model: &ExtractedPageModel, report: &AnalysisReport) -> Vec<ScaffoldFile> {
    let title = MetadataExtractor::best_title(model).unwrap_or_else(|| "Cloned Website".to_string());
    let description = MetadataExtractor::best_description(model).unwrap_or_default();
    let nav = navigation(model);

    vec![
        ScaffoldFile {
            name: "README.md",
            contents: readme(model, report, &title),
        },
        ScaffoldFile {
            name: "package.json",
            contents: package_json(model, report, &description),
        },
        ScaffoldFile {
            name: "Dockerfile",
            contents: dockerfile(model),
        },
        ScaffoldFile {
            name: "ClonedWebsite.jsx",
            contents: react_component(&title, &description, &nav),
        },
        ScaffoldFile {
            name: "ClonedWebsite.vue",
            contents: vue_component(&title, &description, &nav),
        },
    ]
}

fn readme(model: &ExtractedPageModel, report: &AnalysisReport, title: &str) -> String {
    let single_line = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = format!("# {}\n\n", single_line(title));
    out.push_str(&format!(
        "Mirrored copy of <{}> captured {}.\n\n",
        model.url,
        report.generated_at.to_rfc3339()
    ));
    out.push_str("## Contents\n\n");
    out.push_str("- `index.html`: the rewritten page\n");
    out.push_str("- `assets/`: downloaded stylesheets, scripts, images and fonts\n");
    out.push_str("- `analysis-report.json`, `analysis-report.html`: page analysis\n");
    out.push_str("- `ClonedWebsite.jsx`, `ClonedWebsite.vue`: component stubs\n");
    out.push_str("- `Dockerfile`, `package.json`: packaging\n\n");
    out.push_str(&format!(
        "Resources: {} total, {} downloaded, {} failed.\n\n",
        report.assets.total, report.assets.ok, report.assets.failed
    ));
    if !report.technologies.is_empty() {
        out.push_str(&format!(
            "Detected technologies: {}.\n\n",
            report.technologies.join(", ")
        ));
    }
    out.push_str("## Serving\n\n```sh\nnpm start\n# or\ndocker build -t ");
    out.push_str(&package_name(&model.url));
    out.push_str(" . && docker run -p 8080:80 ");
    out.push_str(&package_name(&model.url));
    out.push_str("\n```\n");
    out
}

fn package_json(model: &ExtractedPageModel, report: &AnalysisReport, description: &str) -> String {
    let manifest = json!({
        "name": package_name(&model.url),
        "version": "1.0.0",
        "private": true,
        "description": description,
        "scripts": {
            "start": "npx http-server . -p 8080"
        },
        "sitemirror": {
            "source": model.url,
            "capturedAt": report.generated_at.to_rfc3339(),
            "technologies": report.technologies,
        }
    });
    let mut text = serde_json::to_string_pretty(&manifest).unwrap_or_else(|_| "{}".to_string());
    text.push('\n');
    text
}

fn dockerfile(model: &ExtractedPageModel) -> String {
    format!(
        "# Static mirror of {}\nFROM nginx:alpine\nCOPY . /usr/share/nginx/html\nEXPOSE 80\n",
        model.url.replace(['\r', '\n'], " ")
    )
}

fn react_component(title: &str, description: &str, nav: &[NavLink]) -> String {
    format!(
        r#"import React from 'react';

const title = {title};
const description = {description};
const navigation = {nav};

export default function ClonedWebsite() {{
  return (
    <div className="cloned-website">
      <header>
        <h1>{{title}}</h1>
        {{description && <p>{{description}}</p>}}
        <nav>
          {{navigation.map((link) => (
            <a key={{link.href}} href={{link.href}}>
              {{link.text}}
            </a>
          ))}}
        </nav>
      </header>
      <main>
        {{/* Mirrored content goes here */}}
      </main>
    </div>
  );
}}
"#,
        title = js_literal(title),
        description = js_literal(description),
        nav = js_literal(nav),
    )
}

fn vue_component(title: &str, description: &str, nav: &[NavLink]) -> String {
    format!(
        r#"<template>
  <div class="cloned-website">
    <header>
      <h1>{{{{ title }}}}</h1>
      <p v-if="description">{{{{ description }}}}</p>
      <nav>
        <a v-for="link in navigation" :key="link.href" :href="link.href">{{{{ link.text }}}}</a>
      </nav>
    </header>
    <main>
      <!-- Mirrored content goes here -->
    </main>
  </div>
</template>

<script>
export default {{
  name: 'ClonedWebsite',
  data() {{
    return {{
      title: {title},
      description: {description},
      navigation: {nav},
    }};
  }},
}};
</script>
"#,
        title = js_literal(title),
        description = js_literal(description),
        nav = js_literal(nav),
    )
}

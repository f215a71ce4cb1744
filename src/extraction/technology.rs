//! Technology detection
//!
//! A fixed, ordered table of in-page predicates. Each predicate runs inside
//! its own `try` block, so one that throws only loses its own label. Several
//! rows may share a label; the page collects labels into a set.

/// One detection rule: a label and a JavaScript boolean expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechnologyProbe {
    /// Label reported when the predicate holds
    pub label: &'static str,
    /// JavaScript expression evaluated in the page
    pub predicate: &'static str,
}

const fn probe(label: &'static str, predicate: &'static str) -> TechnologyProbe {
    TechnologyProbe { label, predicate }
}

/// Detection table, evaluated in order
pub const TECHNOLOGY_PROBES: &[TechnologyProbe] = &[
    probe("React", r#"!!window.React"#),
    probe("React", r#"!!document.querySelector('[data-reactroot], [data-reactid]')"#),
    probe("Next.js", r#"!!window.__NEXT_DATA__ || !!document.getElementById('__next')"#),
    probe("Vue.js", r#"!!window.Vue || !!window.__VUE__"#),
    probe("Vue.js", r#"!!document.querySelector('[data-v-app], [data-server-rendered]')"#),
    probe("Nuxt", r#"!!window.__NUXT__ || !!window.$nuxt"#),
    probe("Angular", r#"!!window.ng || !!document.querySelector('[ng-version]')"#),
    probe("AngularJS", r#"!!window.angular"#),
    probe("Svelte", r#"!!document.querySelector('[class*="svelte-"]')"#),
    probe("Gatsby", r#"!!document.getElementById('___gatsby')"#),
    probe("jQuery", r#"!!window.jQuery || !!(window.$ && window.$.fn && window.$.fn.jquery)"#),
    probe(
        "Bootstrap",
        r#"!!window.bootstrap || !!document.querySelector('link[href*="bootstrap"], script[src*="bootstrap"]')"#,
    ),
    probe(
        "Tailwind CSS",
        r#"Array.from(document.querySelectorAll('[class]')).slice(0, 500).some(el => /(^|\s)(px-\d|py-\d|bg-[a-z]+-\d{3}|text-[a-z]+-\d{3})(\s|$)/.test(el.getAttribute('class')))"#,
    ),
    probe("Alpine.js", r#"!!window.Alpine || !!document.querySelector('[x-data]')"#),
    probe(
        "WordPress",
        r#"!!document.querySelector('meta[name="generator"][content*="WordPress"], link[href*="wp-content"], script[src*="wp-content"]')"#,
    ),
    probe("Shopify", r#"!!window.Shopify"#),
    probe("Google Analytics", r#"!!(window.ga || window.gtag || window.dataLayer)"#),
    probe(
        "Font Awesome",
        r#"!!document.querySelector('link[href*="font-awesome"], link[href*="fontawesome"], .fa, .fas, .fab')"#,
    ),
];

/// Build the detection section from a probe table.
///
/// The section returns `{ detectedTechnologies: [...] }` with duplicates
/// removed.
pub fn detection_section(probes: &[TechnologyProbe]) -> String {
    let mut section = String::from("() => {\n        const found = new Set();\n");
    for probe in probes {
        let label = serde_json::to_string(probe.label).unwrap_or_else(|_| "\"\"".to_string());
        section.push_str("        try { if (");
        section.push_str(probe.predicate);
        section.push_str(") found.add(");
        section.push_str(&label);
        section.push_str("); } catch (e) {}\n");
    }
    section.push_str("        return { detectedTechnologies: Array.from(found) };\n    }");
    section
}

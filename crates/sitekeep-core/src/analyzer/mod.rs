// ── Archive Analyzer ──
//
// Derives SEO signals and a favicon from a site bundle. Analysis never
// fails: absent or unparseable markup is treated as an empty document.

mod favicon;
pub mod files;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use sitekeep_api::SiteFetcher;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::SiteMetaPatch;

pub use favicon::Favicon;
pub use files::{ExtractedFile, ExtractedFileSet, FileContent, FileEncoding};

const INDEX_PATH: &str = "index.html";
const BASELINE_SCORE: i64 = 50;

/// Structural and SEO metrics for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteAnalysis {
    pub title: String,
    pub description: String,
    pub script_count: u32,
    pub page_count: u32,
    pub seo_score: u8,
    pub heading_count: u32,
    pub link_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<Favicon>,
}

impl SiteAnalysis {
    /// Heuristic improvement hints, most important first.
    pub fn suggestions(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.title.is_empty() {
            out.push("Add a descriptive <title> to the home page.".to_owned());
        }
        if self.description.is_empty() {
            out.push("Add a meta description summarizing the site.".to_owned());
        }
        if self.heading_count < 3 {
            out.push("Structure content with more headings (h1-h3).".to_owned());
        }
        if self.link_count < 5 {
            out.push("Add internal links between pages.".to_owned());
        }
        if self.script_count > 10 {
            out.push(format!(
                "Reduce the number of scripts ({} found); bundle or defer them.",
                self.script_count
            ));
        }
        out
    }

    /// Meta update for a re-audit: score and scripts always, title and
    /// description only when non-empty, pages never shrink below `existing_pages`.
    pub fn meta_patch(&self, existing_pages: u32) -> SiteMetaPatch {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_owned());
        SiteMetaPatch {
            pages: Some(self.page_count.max(existing_pages)),
            scripts: Some(self.script_count),
            seo_score: Some(self.seo_score),
            title: non_empty(&self.title),
            description: non_empty(&self.description),
            favicon: self.favicon.as_ref().map(|f| f.data_url.clone()),
        }
    }
}

/// Analyze an extracted bundle.
pub fn analyze(files: &ExtractedFileSet) -> SiteAnalysis {
    let html_pages = files.paths().filter(|p| files::is_html_path(p)).count();
    let selected = files
        .get(INDEX_PATH)
        .or_else(|| files.iter().find(|(p, _)| files::is_html_path(p)).map(|(_, f)| f));
    let markup = selected.map(ExtractedFile::as_text).unwrap_or_default();

    let document = Html::parse_document(&markup);
    let favicon = favicon::resolve(&document, files);

    if markup.trim().is_empty() {
        debug!(files = files.len(), "no document to analyze");
        return SiteAnalysis {
            title: String::new(),
            description: String::new(),
            script_count: 0,
            page_count: 0,
            seo_score: clamp_score(BASELINE_SCORE),
            heading_count: 0,
            link_count: 0,
            favicon,
        };
    }

    let title = select(&document, "title")
        .first()
        .map(|el| el.text().collect::<String>().trim().to_owned())
        .unwrap_or_default();
    let description = select(&document, r#"meta[name="description"]"#)
        .first()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_owned())
        .unwrap_or_default();
    let script_count = count(select(&document, "script").len());
    let heading_count = count(select(&document, "h1, h2, h3").len());
    let link_count = count(select(&document, "a").len());
    let page_count = count(html_pages.max(1));

    let seo_score = score(!title.is_empty(), !description.is_empty(), script_count, page_count);

    SiteAnalysis {
        title,
        description,
        script_count,
        page_count,
        seo_score,
        heading_count,
        link_count,
        favicon,
    }
}

/// Fetch one live document and analyze it as a single-file bundle.
pub async fn analyze_url(fetcher: &SiteFetcher, url: &str) -> Result<SiteAnalysis, CoreError> {
    let html = fetcher.fetch_html(url).await?;
    Ok(analyze(&ExtractedFileSet::single_document(html)))
}

/// Decode a ZIP bundle and analyze it. Malformed archives are analyzed
/// as an empty bundle.
pub fn analyze_bundle(bytes: &[u8]) -> SiteAnalysis {
    let files = ExtractedFileSet::from_zip(bytes).unwrap_or_else(|e| {
        warn!(error = %e, "unreadable bundle, analyzing as empty");
        ExtractedFileSet::new()
    });
    analyze(&files)
}

fn score(has_title: bool, has_description: bool, scripts: u32, pages: u32) -> u8 {
    let mut total = BASELINE_SCORE;
    if has_title {
        total += 15;
    }
    if has_description {
        total += 15;
    }
    total += (20 - i64::from(scripts)).max(0);
    total += (i64::from(pages) * 4).min(20);
    clamp_score(total)
}

fn clamp_score(raw: i64) -> u8 {
    u8::try_from(raw.clamp(0, 100)).unwrap_or(100)
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;
    use pretty_assertions::assert_eq;
    use zip::write::SimpleFileOptions;

    const TITLED: &str = r#"<html><head><title> Bakery </title>
        <meta name="description" content=" Fresh bread daily "></head>
        <body><h1>Bread</h1></body></html>"#;

    fn html(s: &str) -> ExtractedFile {
        ExtractedFile::text(s, "text/html")
    }

    #[test]
    fn titled_index_scores_full_marks() {
        let files: ExtractedFileSet = [("index.html", html(TITLED))].into_iter().collect();
        let a = analyze(&files);
        assert_eq!(a.title, "Bakery");
        assert_eq!(a.description, "Fresh bread daily");
        assert_eq!(a.script_count, 0);
        assert_eq!(a.page_count, 1);
        assert_eq!(a.heading_count, 1);
        assert_eq!(a.seo_score, 100);
    }

    #[test]
    fn extra_pages_keep_score_clamped() {
        let files: ExtractedFileSet = [
            ("index.html", html(TITLED)),
            ("about.html", html("<p>a</p>")),
            ("menu.html", html("<p>m</p>")),
            ("contact.htm", html("<p>c</p>")),
        ]
        .into_iter()
        .collect();
        let a = analyze(&files);
        assert_eq!(a.page_count, 4);
        assert_eq!(a.seo_score, 100);
    }

    #[test]
    fn empty_bundle_gets_baseline() {
        let a = analyze(&ExtractedFileSet::new());
        assert_eq!(a.title, "");
        assert_eq!(a.description, "");
        assert_eq!(a.script_count, 0);
        assert_eq!(a.page_count, 0);
        assert_eq!(a.seo_score, 50);
        assert!(a.favicon.is_none());
    }

    #[test]
    fn scripts_reduce_the_score() {
        let scripts = "<script></script>".repeat(25);
        let files = ExtractedFileSet::single_document(format!("<title>x</title>{scripts}"));
        let a = analyze(&files);
        assert_eq!(a.script_count, 25);
        // 50 + 15 (title) + 0 (scripts) + 4 (one page)
        assert_eq!(a.seo_score, 69);
        assert!(a.suggestions().iter().any(|s| s.contains("25 found")));
    }

    #[test]
    fn first_html_entry_is_used_without_index() {
        let files: ExtractedFileSet = [
            ("style.css", ExtractedFile::text("body{}", "text/css")),
            ("home.htm", html("<title>Home</title>")),
        ]
        .into_iter()
        .collect();
        assert_eq!(analyze(&files).title, "Home");
    }

    #[test]
    fn favicon_only_bundle_resolves_via_fallback() {
        let files: ExtractedFileSet =
            [("assets/favicon.png", ExtractedFile::binary(vec![0x89, 0x50], "image/png"))]
                .into_iter()
                .collect();
        let a = analyze(&files);
        assert_eq!(a.seo_score, 50);
        let icon = a.favicon.unwrap();
        assert_eq!(icon.path, "assets/favicon.png");
        assert!(icon.data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn suggestions_flag_missing_basics() {
        let a = analyze(&ExtractedFileSet::single_document("<p>hello</p>"));
        let s = a.suggestions();
        assert_eq!(s.len(), 4);
        assert!(s[0].contains("<title>"));
        assert!(s[1].contains("meta description"));
    }

    #[test]
    fn meta_patch_keeps_existing_text_and_pages() {
        let a = analyze(&ExtractedFileSet::single_document("<p>no title</p>"));
        let patch = a.meta_patch(7);
        assert_eq!(patch.pages, Some(7));
        assert_eq!(patch.title, None);
        assert_eq!(patch.description, None);
        assert_eq!(patch.seo_score, Some(a.seo_score));
    }

    #[test]
    fn bundle_bytes_are_decoded() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("index.html", SimpleFileOptions::default()).unwrap();
        writer.write_all(TITLED.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert_eq!(analyze_bundle(&bytes).seo_score, 100);
    }

    #[test]
    fn garbage_bundle_is_absorbed() {
        let a = analyze_bundle(b"PK not really");
        assert_eq!(a.seo_score, 50);
        assert_eq!(a.page_count, 0);
    }
}

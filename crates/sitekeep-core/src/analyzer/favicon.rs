// ── Favicon resolution ──

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use super::files::{ExtractedFile, ExtractedFileSet, normalize_path};

const FALLBACK_MEDIA_TYPE: &str = "image/x-icon";

const FALLBACK_PATHS: &[&str] = &[
    "favicon.ico",
    "favicon.png",
    "favicon.jpg",
    "favicon.svg",
    "images/favicon.ico",
    "images/favicon.png",
    "images/favicon.svg",
    "assets/favicon.ico",
    "assets/favicon.png",
    "assets/favicon.svg",
];

const ICON_EXTENSIONS: &[&str] = &[".ico", ".png", ".jpg", ".jpeg", ".svg"];

/// Resolved favicon: where it came from and its `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favicon {
    /// Bundle path of the icon, or `inline` for a declared data URI.
    pub path: String,
    pub data_url: String,
}

/// Resolve a favicon for `document` from the files in `files`.
///
/// Order: an inline `data:` href on an icon link, the declared href,
/// the conventional fallback locations, then any file with an icon
/// extension.
pub(crate) fn resolve(document: &Html, files: &ExtractedFileSet) -> Option<Favicon> {
    let declared = declared_icon_href(document);

    if let Some(href) = declared.as_deref() {
        if href.starts_with("data:") {
            return Some(Favicon {
                path: "inline".into(),
                data_url: href.to_owned(),
            });
        }
        let candidate = normalize_path(href);
        if !candidate.is_empty() {
            if let Some(found) = find_file(files, &candidate) {
                return Some(encode(found));
            }
        }
    }

    for candidate in FALLBACK_PATHS {
        if let Some(found) = find_file(files, candidate) {
            return Some(encode(found));
        }
    }

    files
        .iter()
        .find(|(path, _)| {
            let lower = path.to_ascii_lowercase();
            ICON_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        })
        .map(encode)
}

fn declared_icon_href(document: &Html) -> Option<String> {
    for css in [r#"link[rel="shortcut icon"]"#, r#"link[rel~="icon"]"#] {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let href = document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .map(str::trim)
            .find(|href| !href.is_empty());
        if let Some(href) = href {
            return Some(href.to_owned());
        }
    }
    None
}

/// Exact lookup, then a case-insensitive suffix match anchored on a
/// path-segment boundary (`icon.png` matches `img/icon.png`, not
/// `img/myicon.png`).
fn find_file<'a>(
    files: &'a ExtractedFileSet,
    candidate: &str,
) -> Option<(&'a str, &'a ExtractedFile)> {
    if let Some(exact) = files.iter().find(|(path, _)| *path == candidate) {
        return Some(exact);
    }
    let wanted = candidate.to_ascii_lowercase();
    let anchored = format!("/{wanted}");
    files.iter().find(|(path, _)| {
        let lower = path.to_ascii_lowercase();
        lower == wanted || lower.ends_with(&anchored)
    })
}

fn encode((path, file): (&str, &ExtractedFile)) -> Favicon {
    Favicon {
        path: path.to_owned(),
        data_url: file.to_data_url(FALLBACK_MEDIA_TYPE),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png(bytes: &[u8]) -> ExtractedFile {
        ExtractedFile::binary(bytes.to_vec(), "image/png")
    }

    fn resolve_html(html: &str, files: &ExtractedFileSet) -> Option<Favicon> {
        resolve(&Html::parse_document(html), files)
    }

    #[test]
    fn inline_data_href_is_used_verbatim() {
        let html = r#"<link rel="icon" href="data:image/png;base64,AAAA">"#;
        let icon = resolve_html(html, &ExtractedFileSet::new()).unwrap();
        assert_eq!(icon.path, "inline");
        assert_eq!(icon.data_url, "data:image/png;base64,AAAA");
    }

    #[test]
    fn declared_href_matches_by_suffix() {
        let files: ExtractedFileSet = [("site/img/icon.png", png(&[1, 2, 3]))].into_iter().collect();
        let html = r#"<link rel="shortcut icon" href="./img/icon.png?v=2">"#;
        let icon = resolve_html(html, &files).unwrap();
        assert_eq!(icon.path, "site/img/icon.png");
        assert_eq!(icon.data_url, "data:image/png;base64,AQID");
    }

    #[test]
    fn declared_href_beats_conventional_favicon() {
        let files: ExtractedFileSet = [
            (
                "favicon.ico",
                ExtractedFile::binary(vec![0, 0, 1, 0], "image/x-icon"),
            ),
            ("img/brand.png", png(&[7, 7, 7])),
        ]
        .into_iter()
        .collect();
        let html = r#"<head><link rel="icon" href="/img/brand.png"></head>"#;
        let icon = resolve_html(html, &files).unwrap();
        assert_eq!(icon.path, "img/brand.png");
        assert!(icon.data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn suffix_match_respects_segment_boundaries() {
        let files: ExtractedFileSet = [("img/myicon.png", png(&[1]))].into_iter().collect();
        assert!(find_file(&files, "icon.png").is_none());
        assert!(find_file(&files, "MYICON.PNG").is_some());
    }

    #[test]
    fn falls_back_to_conventional_locations() {
        let files: ExtractedFileSet = [
            ("index.html", ExtractedFile::text("<p>hi</p>", "text/html")),
            ("assets/favicon.png", png(&[9, 9])),
        ]
        .into_iter()
        .collect();
        let icon = resolve_html("<p>hi</p>", &files).unwrap();
        assert_eq!(icon.path, "assets/favicon.png");
        assert!(icon.data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn any_icon_extension_is_the_last_resort() {
        let files: ExtractedFileSet =
            [("media/logo.svg", ExtractedFile::text("<svg/>", "image/svg+xml"))]
                .into_iter()
                .collect();
        let icon = resolve_html("", &files).unwrap();
        assert_eq!(icon.path, "media/logo.svg");
        assert!(icon.data_url.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn unknown_media_type_defaults_to_x_icon() {
        let files: ExtractedFileSet = [(
            "favicon.ico",
            ExtractedFile::binary(vec![0, 0, 1, 0], "application/octet-stream"),
        )]
        .into_iter()
        .collect();
        let icon = resolve_html("", &files).unwrap();
        assert!(icon.data_url.starts_with("data:image/x-icon;base64,"));
    }

    #[test]
    fn no_icon_files_resolves_nothing() {
        let files: ExtractedFileSet =
            [("index.html", ExtractedFile::text("", "text/html"))].into_iter().collect();
        assert!(resolve_html("", &files).is_none());
    }
}

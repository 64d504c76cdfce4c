// ── Extracted file sets ──
//
// Transient, insertion-ordered view of a site bundle keyed by normalized
// relative path. Built once per analysis and dropped afterwards.

use std::borrow::Cow;
use std::io::{Cursor, Read};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to read archive entry: {0}")]
    Io(#[from] std::io::Error),
}

/// How a file's content is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEncoding {
    Text,
    /// Raw bytes, rendered as base64 whenever they leave the set.
    Base64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub content: FileContent,
    pub media_type: String,
}

impl ExtractedFile {
    pub fn text(content: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            content: FileContent::Text(content.into()),
            media_type: media_type.into(),
        }
    }

    pub fn binary(content: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            content: FileContent::Binary(content),
            media_type: media_type.into(),
        }
    }

    /// Classify raw bytes from an archive entry. Valid UTF-8 is kept as
    /// text unless the media type is a raster image.
    pub fn from_bytes(path: &str, bytes: Vec<u8>) -> Self {
        let media_type = infer_media_type(path);
        let raster = media_type.starts_with("image/") && media_type != "image/svg+xml";
        if raster {
            return Self::binary(bytes, media_type);
        }
        match String::from_utf8(bytes) {
            Ok(text) => Self::text(text, media_type),
            Err(e) => Self::binary(e.into_bytes(), media_type),
        }
    }

    pub fn encoding(&self) -> FileEncoding {
        match self.content {
            FileContent::Text(_) => FileEncoding::Text,
            FileContent::Binary(_) => FileEncoding::Base64,
        }
    }

    /// Content decoded as text; binary content is decoded lossily.
    pub fn as_text(&self) -> Cow<'_, str> {
        match &self.content {
            FileContent::Text(s) => Cow::Borrowed(s),
            FileContent::Binary(b) => String::from_utf8_lossy(b),
        }
    }

    pub fn to_base64(&self) -> String {
        match &self.content {
            FileContent::Text(s) => STANDARD.encode(s.as_bytes()),
            FileContent::Binary(b) => STANDARD.encode(b),
        }
    }

    /// Render as a `data:` URI, substituting `fallback_media_type` when the
    /// media type could not be inferred.
    pub fn to_data_url(&self, fallback_media_type: &str) -> String {
        let media_type = if self.media_type.is_empty() || self.media_type == DEFAULT_MEDIA_TYPE {
            fallback_media_type
        } else {
            self.media_type.as_str()
        };
        format!("data:{media_type};base64,{}", self.to_base64())
    }
}

/// Normalize a bundle-relative path or asset reference: drop any query or
/// fragment, fold backslashes, and strip leading `./` and `/`.
pub fn normalize_path(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let mut path = raw[..end].trim().replace('\\', "/");
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest.to_owned();
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest.to_owned();
        } else {
            break;
        }
    }
    path
}

pub fn infer_media_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first()
        .map_or_else(|| DEFAULT_MEDIA_TYPE.to_owned(), |m| m.essence_str().to_owned())
}

/// Whether the path names an HTML document.
pub fn is_html_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

/// Normalized path → file map, in bundle order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFileSet {
    files: IndexMap<String, ExtractedFile>,
}

impl ExtractedFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding one fetched document as `index.html`.
    pub fn single_document(html: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.insert("index.html", ExtractedFile::text(html, "text/html"));
        set
    }

    /// Decode a ZIP bundle. Directory entries are skipped.
    pub fn from_zip(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut set = Self::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_owned();
            let mut buf = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            entry.read_to_end(&mut buf)?;
            let file = ExtractedFile::from_bytes(&name, buf);
            set.insert(&name, file);
        }

        debug!(files = set.len(), "extracted bundle");
        Ok(set)
    }

    /// Insert under the normalized form of `path`. The first file for a
    /// given normalized path wins; returns `false` for duplicates and
    /// empty paths.
    pub fn insert(&mut self, path: &str, file: ExtractedFile) -> bool {
        let key = normalize_path(path);
        if key.is_empty() || self.files.contains_key(&key) {
            debug!(path, "skipping duplicate or empty bundle path");
            return false;
        }
        self.files.insert(key, file);
        true
    }

    pub fn get(&self, path: &str) -> Option<&ExtractedFile> {
        self.files.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtractedFile)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<P: AsRef<str>> FromIterator<(P, ExtractedFile)> for ExtractedFileSet {
    fn from_iter<I: IntoIterator<Item = (P, ExtractedFile)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (path, file) in iter {
            set.insert(path.as_ref(), file);
        }
        set
    }
}

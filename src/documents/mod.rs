//! Article metadata as read from the abstracts database.

mod pg;

pub use pg::PgDocumentService;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::taxonomy;

/// What the submitter uploaded for a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Tex,
    PdfOnly,
    HtmlOnly,
    None,
}

impl SourceKind {
    /// Unrecognised values are treated as having no disseminable source.
    pub fn from_db(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tex" => SourceKind::Tex,
            "pdf" => SourceKind::PdfOnly,
            "html" => SourceKind::HtmlOnly,
            _ => SourceKind::None,
        }
    }

    /// File extension of the stored source, if any.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            SourceKind::Tex => Some("tar.gz"),
            SourceKind::PdfOnly => Some("pdf"),
            SourceKind::HtmlOnly => Some("html.gz"),
            SourceKind::None => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            SourceKind::Tex | SourceKind::HtmlOnly => "application/gzip",
            SourceKind::PdfOnly => "application/pdf",
            SourceKind::None => "application/octet-stream",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionEntry {
    pub version: u32,
    pub submitted: DateTime<Utc>,
    pub size_kilobytes: u32,
    pub source_kind: SourceKind,
    pub withdrawn: bool,
    pub source_withheld: bool,
    pub pdf_build_failed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocMetadata {
    pub arxiv_id: String,
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub primary_archive: Option<String>,
    pub primary_category: Option<String>,
    pub secondary_categories: Vec<String>,
    pub comments: Option<String>,
    pub journal_ref: Option<String>,
    pub doi: Option<String>,
    pub deleted_reason: Option<String>,
    pub latexml_available: bool,
    pub versions: Vec<VersionEntry>,
}

impl DocMetadata {
    pub fn highest_version(&self) -> u32 {
        self.versions
            .iter()
            .map(|entry| entry.version)
            .max()
            .unwrap_or(0)
    }

    pub fn version(&self, version: u32) -> Option<&VersionEntry> {
        self.versions.iter().find(|entry| entry.version == version)
    }

    pub fn latest(&self) -> Option<&VersionEntry> {
        self.version(self.highest_version())
    }

    /// Archive used for archive-scoped links: the recorded primary archive,
    /// else the archive of the primary category.
    pub fn search_archive(&self) -> Option<String> {
        self.primary_archive
            .as_deref()
            .filter(|archive| !archive.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.primary_category
                    .as_deref()
                    .and_then(taxonomy::archive_for_category)
                    .map(str::to_string)
            })
    }
}

/// Read access to article metadata.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn get_abs(&self, arxiv_id: &str) -> Result<Option<DocMetadata>>;
}

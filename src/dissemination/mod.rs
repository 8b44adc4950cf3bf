//! Resolving article identifiers to stored artifacts.

mod fileobj;
mod next_publish;
mod store;

pub use fileobj::ArtifactFile;
pub use next_publish::{PublishSchedule, http_date};
pub use store::FsArticleStore;

use async_trait::async_trait;

use crate::identifier::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Source,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Source => "src",
        }
    }
}

/// Outcome of asking storage for an artifact.
#[derive(Debug, Clone)]
pub enum ArtifactLookup {
    Found(ArtifactFile),
    /// Metadata says the artifact should exist but storage has no object.
    FileMissing,
    VersionNotFound,
    ArticleNotFound,
    Withdrawn,
    NoSource,
    Unavailable,
    NotPdf,
    Deleted(String),
    CannotBuild(String),
}

impl ArtifactLookup {
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactLookup::Found(_) => "found",
            ArtifactLookup::FileMissing => "file_missing",
            ArtifactLookup::VersionNotFound => "version_not_found",
            ArtifactLookup::ArticleNotFound => "article_not_found",
            ArtifactLookup::Withdrawn => "withdrawn",
            ArtifactLookup::NoSource => "no_source",
            ArtifactLookup::Unavailable => "unavailable",
            ArtifactLookup::NotPdf => "not_pdf",
            ArtifactLookup::Deleted(_) => "deleted",
            ArtifactLookup::CannotBuild(_) => "cannot_build",
        }
    }
}

/// Storage-backed resolver for disseminated artifacts.
///
/// Lookups never fail outright: backend trouble is reported as
/// [`ArtifactLookup::Unavailable`].
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn dissemination(&self, format: Format, id: &Identifier) -> ArtifactLookup;
}

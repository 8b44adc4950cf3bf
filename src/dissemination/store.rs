use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, error};

use crate::{
    documents::{DocMetadata, DocumentService, SourceKind},
    identifier::Identifier,
};

use super::{ArticleStore, ArtifactFile, ArtifactLookup, Format};

/// Artifacts laid out on a local or mounted filesystem.
///
/// ```text
/// {root}/ps_cache/{archive}/pdf/{yymm}/{filename}v{N}.pdf
/// {root}/ftp/{archive}/papers/{yymm}/{filename}v{N}.{ext}
/// ```
pub struct FsArticleStore {
    root: PathBuf,
    docs: Arc<dyn DocumentService>,
}

#[derive(Debug, PartialEq, Eq)]
struct Target {
    path: PathBuf,
    content_type: &'static str,
    download_name: String,
}

impl FsArticleStore {
    pub fn new(root: impl Into<PathBuf>, docs: Arc<dyn DocumentService>) -> Self {
        Self {
            root: root.into(),
            docs,
        }
    }

    fn pdf_cache_path(&self, id: &Identifier, version: u32) -> PathBuf {
        self.root
            .join("ps_cache")
            .join(id.archive())
            .join("pdf")
            .join(id.yymm())
            .join(format!("{}v{}.pdf", id.filename(), version))
    }

    fn source_path(&self, id: &Identifier, version: u32, ext: &str) -> PathBuf {
        self.root
            .join("ftp")
            .join(id.archive())
            .join("papers")
            .join(id.yymm())
            .join(format!("{}v{}.{}", id.filename(), version, ext))
    }

    fn target(
        &self,
        doc: &DocMetadata,
        format: Format,
        id: &Identifier,
    ) -> Result<Target, ArtifactLookup> {
        if let Some(reason) = &doc.deleted_reason {
            return Err(ArtifactLookup::Deleted(reason.clone()));
        }

        let highest = doc.highest_version();
        if highest == 0 {
            return Err(ArtifactLookup::ArticleNotFound);
        }
        let version = id.version().unwrap_or(highest);
        let entry = doc
            .version(version)
            .ok_or(ArtifactLookup::VersionNotFound)?;

        if entry.withdrawn {
            return Err(ArtifactLookup::Withdrawn);
        }
        let Some(ext) = entry.source_kind.extension() else {
            return Err(ArtifactLookup::NoSource);
        };

        let stem = download_stem(id, version);
        match format {
            Format::Pdf => match entry.source_kind {
                SourceKind::HtmlOnly => Err(ArtifactLookup::NotPdf),
                SourceKind::Tex if entry.pdf_build_failed => Err(ArtifactLookup::CannotBuild(
                    format!("The TeX source of {}v{} did not produce a PDF.", id.id(), version),
                )),
                SourceKind::PdfOnly => Ok(Target {
                    path: self.source_path(id, version, ext),
                    content_type: "application/pdf",
                    download_name: format!("{stem}.pdf"),
                }),
                _ => Ok(Target {
                    path: self.pdf_cache_path(id, version),
                    content_type: "application/pdf",
                    download_name: format!("{stem}.pdf"),
                }),
            },
            Format::Source => {
                if entry.source_withheld {
                    return Err(ArtifactLookup::NoSource);
                }
                Ok(Target {
                    path: self.source_path(id, version, ext),
                    content_type: entry.source_kind.content_type(),
                    download_name: format!("{stem}.{ext}"),
                })
            }
        }
    }
}

#[async_trait]
impl ArticleStore for FsArticleStore {
    async fn dissemination(&self, format: Format, id: &Identifier) -> ArtifactLookup {
        let doc = match self.docs.get_abs(id.id()).await {
            Ok(Some(doc)) => doc,
            Ok(None) => return ArtifactLookup::ArticleNotFound,
            Err(err) => {
                error!(?err, id = %id, "metadata lookup failed");
                return ArtifactLookup::Unavailable;
            }
        };

        let target = match self.target(&doc, format, id) {
            Ok(target) => target,
            Err(outcome) => return outcome,
        };

        match ArtifactFile::stat(&target.path, target.content_type, target.download_name).await {
            Ok(Some(file)) => ArtifactLookup::Found(file),
            Ok(None) => {
                debug!(path = %target.path.display(), "artifact not in storage");
                ArtifactLookup::FileMissing
            }
            Err(err) => {
                error!(?err, path = %target.path.display(), "failed to stat artifact");
                ArtifactLookup::Unavailable
            }
        }
    }
}

fn download_stem(id: &Identifier, version: u32) -> String {
    if id.is_old_style() {
        format!("{}{}v{}", id.archive(), id.filename(), version)
    } else {
        format!("{}v{}", id.filename(), version)
    }
}

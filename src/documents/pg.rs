use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{DocMetadata, DocumentService, SourceKind, VersionEntry};

#[derive(Clone, FromRow)]
struct ArticleRow {
    arxiv_id: String,
    title: String,
    authors: String,
    abstract_text: String,
    primary_archive: Option<String>,
    primary_category: Option<String>,
    secondary_categories: Option<String>,
    comments: Option<String>,
    journal_ref: Option<String>,
    doi: Option<String>,
    deleted_reason: Option<String>,
    latexml_available: bool,
}

#[derive(Clone, FromRow)]
struct VersionRow {
    version: i32,
    submitted: DateTime<Utc>,
    size_kilobytes: i32,
    source_kind: String,
    withdrawn: bool,
    source_withheld: bool,
    pdf_build_failed: bool,
}

/// Metadata read from the `articles` and `article_versions` tables.
#[derive(Clone)]
pub struct PgDocumentService {
    pool: PgPool,
}

impl PgDocumentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentService for PgDocumentService {
    async fn get_abs(&self, arxiv_id: &str) -> Result<Option<DocMetadata>> {
        let article = sqlx::query_as::<_, ArticleRow>(
            "SELECT arxiv_id, title, authors, abstract AS abstract_text, primary_archive, primary_category, secondary_categories, comments, journal_ref, doi, deleted_reason, latexml_available FROM articles WHERE arxiv_id = $1",
        )
        .bind(arxiv_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load article {arxiv_id}"))?;

        let Some(article) = article else {
            return Ok(None);
        };

        let versions = sqlx::query_as::<_, VersionRow>(
            "SELECT version, submitted, size_kilobytes, source_kind, withdrawn, source_withheld, pdf_build_failed FROM article_versions WHERE arxiv_id = $1 ORDER BY version",
        )
        .bind(arxiv_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to load versions of {arxiv_id}"))?;

        Ok(Some(into_metadata(article, versions)))
    }
}

fn into_metadata(article: ArticleRow, versions: Vec<VersionRow>) -> DocMetadata {
    DocMetadata {
        arxiv_id: article.arxiv_id,
        title: article.title,
        authors: article.authors,
        abstract_text: article.abstract_text,
        primary_archive: article.primary_archive,
        primary_category: article.primary_category,
        secondary_categories: article
            .secondary_categories
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        comments: article.comments,
        journal_ref: article.journal_ref,
        doi: article.doi,
        deleted_reason: article.deleted_reason.filter(|reason| !reason.is_empty()),
        latexml_available: article.latexml_available,
        versions: versions
            .into_iter()
            .filter_map(|row| {
                Some(VersionEntry {
                    version: u32::try_from(row.version).ok().filter(|v| *v > 0)?,
                    submitted: row.submitted,
                    size_kilobytes: u32::try_from(row.size_kilobytes).unwrap_or(0),
                    source_kind: SourceKind::from_db(&row.source_kind),
                    withdrawn: row.withdrawn,
                    source_withheld: row.source_withheld,
                    pdf_build_failed: row.pdf_build_failed,
                })
            })
            .collect(),
    }
}

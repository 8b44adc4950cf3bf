use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::{AuthorDirectory, AuthorListing};

#[derive(Clone, FromRow)]
struct NameRow {
    first_name: Option<String>,
    last_name: Option<String>,
    suffix_name: Option<String>,
}

#[derive(Clone, FromRow)]
struct ListingRow {
    arxiv_id: String,
    listing_type: String,
    primary_category: Option<String>,
}

#[derive(Clone)]
pub struct PgAuthorDirectory {
    pool: PgPool,
}

impl PgAuthorDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorDirectory for PgAuthorDirectory {
    async fn user_id_by_author_id(&self, author_id: &str) -> Result<Option<i32>> {
        sqlx::query_scalar("SELECT user_id FROM author_ids WHERE author_id = $1")
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up user by author id")
    }

    async fn user_id_by_orcid(&self, orcid: &str) -> Result<Option<i32>> {
        sqlx::query_scalar("SELECT user_id FROM orcid_ids WHERE orcid = $1")
            .bind(orcid)
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up user by ORCID")
    }

    async fn display_name(&self, user_id: i32) -> Result<Option<String>> {
        let row = sqlx::query_as::<_, NameRow>(
            "SELECT first_name, last_name, suffix_name FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load user display name")?;

        Ok(row.map(|row| join_name(&row)))
    }

    async fn orcid_for_user(&self, user_id: i32) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT orcid FROM orcid_ids WHERE user_id = $1 LIMIT 1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to load ORCID for user")
    }

    async fn articles_for_author(&self, user_id: i32) -> Result<Vec<AuthorListing>> {
        let rows = sqlx::query_as::<_, ListingRow>(
            "SELECT arxiv_id, listing_type, primary_category FROM authorships WHERE user_id = $1 ORDER BY dated DESC, arxiv_id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to load articles for author")?;

        Ok(rows
            .into_iter()
            .map(|row| AuthorListing {
                arxiv_id: row.arxiv_id,
                listing_type: row.listing_type,
                primary_category: row.primary_category,
            })
            .collect())
    }
}

fn join_name(row: &NameRow) -> String {
    [&row.first_name, &row.last_name, &row.suffix_name]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

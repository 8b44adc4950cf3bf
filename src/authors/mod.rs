//! Author lookups against the user database.

mod pg;

pub use pg::PgAuthorDirectory;

use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

pub const ORCID_URI_PREFIX: &str = "https://orcid.org";

static ORCID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{3}[\dX]$").expect("orcid regex"));

pub fn is_orcid(id: &str) -> bool {
    ORCID_RE.is_match(id)
}

/// One article an author is registered against.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorListing {
    pub arxiv_id: String,
    pub listing_type: String,
    pub primary_category: Option<String>,
}

#[async_trait]
pub trait AuthorDirectory: Send + Sync {
    async fn user_id_by_author_id(&self, author_id: &str) -> Result<Option<i32>>;
    async fn user_id_by_orcid(&self, orcid: &str) -> Result<Option<i32>>;
    async fn display_name(&self, user_id: i32) -> Result<Option<String>>;
    async fn orcid_for_user(&self, user_id: i32) -> Result<Option<String>>;
    /// Newest first.
    async fn articles_for_author(&self, user_id: i32) -> Result<Vec<AuthorListing>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAuthor {
    pub user_id: i32,
    pub via_orcid: bool,
    /// The percent-decoded id that was looked up.
    pub lookup_id: String,
}

/// Map a raw path id to a user, by ORCID when it has the ORCID shape and by
/// author id otherwise.
pub async fn resolve_user(
    directory: &dyn AuthorDirectory,
    raw_id: &str,
) -> Result<Option<ResolvedAuthor>> {
    let lookup_id = urlencoding::decode(raw_id)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw_id.to_string());

    let via_orcid = is_orcid(&lookup_id);
    let user_id = if via_orcid {
        directory.user_id_by_orcid(&lookup_id).await?
    } else {
        directory.user_id_by_author_id(&lookup_id).await?
    };

    Ok(user_id.map(|user_id| ResolvedAuthor {
        user_id,
        via_orcid,
        lookup_id,
    }))
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::MemoryAuthors;
    use super::*;

    #[test]
    fn orcid_pattern() {
        assert!(is_orcid("0000-0001-2345-678X"));
        assert!(is_orcid("0000-0001-2345-6789"));
        assert!(!is_orcid("0000-0001-2345-67X9"));
        assert!(!is_orcid("smith_j_1"));
        assert!(!is_orcid("0000-0001-2345-678x"));
    }

    #[tokio::test]
    async fn orcid_shaped_ids_use_orcid_lookup() {
        let mut directory = MemoryAuthors::default();
        directory
            .by_orcid
            .insert("0000-0001-2345-678X".to_string(), 7);

        let resolved = resolve_user(&directory, "0000-0001-2345-678X")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.user_id, 7);
        assert!(resolved.via_orcid);
        assert_eq!(directory.orcid_lookups.load(Ordering::SeqCst), 1);
        assert_eq!(directory.author_id_lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn author_ids_are_percent_decoded() {
        let mut directory = MemoryAuthors::default();
        directory
            .by_author_id
            .insert("o'brien_k_1".to_string(), 3);

        let resolved = resolve_user(&directory, "o%27brien_k_1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resolved.lookup_id, "o'brien_k_1");
        assert!(!resolved.via_orcid);
        assert_eq!(directory.orcid_lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_author_resolves_to_none() {
        let directory = MemoryAuthors::default();
        assert!(resolve_user(&directory, "nobody_x_1").await.unwrap().is_none());
    }
}

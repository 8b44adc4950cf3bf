//! Per-article links shown on listing pages.

use serde::Serialize;

use crate::documents::{DocMetadata, SourceKind};

/// Archive an author search is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchArchive {
    Known(String),
    /// Neither the primary archive nor the category maps to an archive.
    Unknown,
}

impl SearchArchive {
    pub fn for_article(article: &DocMetadata) -> Self {
        match article.search_archive() {
            Some(archive) => SearchArchive::Known(archive),
            None => SearchArchive::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DownloadLink {
    pub format: &'static str,
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorLink {
    pub name: String,
    pub url: String,
}

pub struct LinkBuilder<'a> {
    pub latexml_base_url: &'a str,
}

impl LinkBuilder<'_> {
    /// Author search scoped to the article's archive; unknown archives fall
    /// back to a search across all archives.
    pub fn author_search_url(&self, article: &DocMetadata, query: &str) -> String {
        let query = urlencoding::encode(query);
        match SearchArchive::for_article(article) {
            SearchArchive::Known(archive) => format!(
                "/search/{}?searchtype=author&query={}",
                urlencoding::encode(&archive),
                query
            ),
            SearchArchive::Unknown => format!("/search/?searchtype=author&query={query}"),
        }
    }

    pub fn downloads(&self, article: &DocMetadata) -> Vec<DownloadLink> {
        let Some(latest) = article.latest() else {
            return Vec::new();
        };
        if latest.withdrawn || article.deleted_reason.is_some() {
            return Vec::new();
        }

        let id = &article.arxiv_id;
        let mut links = Vec::new();
        if matches!(latest.source_kind, SourceKind::Tex | SourceKind::PdfOnly) {
            links.push(DownloadLink {
                format: "pdf",
                label: "PDF",
                url: format!("/pdf/{id}"),
            });
        }
        if let Some(url) = self.latexml(article) {
            links.push(DownloadLink {
                format: "html",
                label: "HTML",
                url,
            });
        }
        if latest.source_kind != SourceKind::None && !latest.source_withheld {
            links.push(DownloadLink {
                format: "src",
                label: "Source",
                url: format!("/src/{id}"),
            });
        }
        links
    }

    pub fn latexml(&self, article: &DocMetadata) -> Option<String> {
        if !article.latexml_available {
            return None;
        }
        let latest = article.latest()?;
        Some(format!(
            "{}/{}v{}",
            self.latexml_base_url, article.arxiv_id, latest.version
        ))
    }

    pub fn author_links(&self, article: &DocMetadata) -> Vec<AuthorLink> {
        split_authors(&article.authors)
            .into_iter()
            .map(|name| AuthorLink {
                url: self.author_search_url(article, &name),
                name,
            })
            .collect()
    }
}

/// Split an authors line into names, dropping parenthesised affiliations.
pub fn split_authors(line: &str) -> Vec<String> {
    let mut cleaned = String::with_capacity(line.len());
    let mut depth = 0_usize;
    for ch in line.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => cleaned.push(ch),
            _ => {}
        }
    }

    cleaned
        .replace(" and ", ",")
        .split(',')
        .map(|name| name.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("et al."))
        .collect()
}

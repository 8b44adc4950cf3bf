//! Author pages: every article registered to one author.

use std::borrow::Cow;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use tracing::{error, warn};

use crate::{
    authors::{self, AuthorListing, ORCID_URI_PREFIX},
    documents::DocMetadata,
    web::{
        AppState, PageError, json_error,
        links::{AuthorLink, DownloadLink, LinkBuilder},
        templates::{PageLayout, escape_html, render_page},
    },
};

const JSON_SUFFIX: &str = ".json";
/// Metadata lookups in flight per author page; each holds a pool connection.
const METADATA_CONCURRENCY: usize = 4;

pub fn router() -> Router<AppState> {
    Router::new().route("/a/:id", get(author_page))
}

#[derive(Debug, Serialize)]
pub struct AuthorPage {
    pub display_name: String,
    pub auri: String,
    pub orcid: Option<String>,
    pub title: String,
    pub abstracts: Vec<AuthorArticle>,
}

/// A listing item together with everything resolved for display.
#[derive(Debug, Serialize)]
pub struct AuthorArticle {
    pub list_index: usize,
    pub listing: AuthorListing,
    pub article: DocMetadata,
    pub downloads: Vec<DownloadLink>,
    pub latexml: Option<String>,
    pub author_links: Vec<AuthorLink>,
}

async fn author_page(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let (id, as_json) = match raw_id.strip_suffix(JSON_SUFFIX) {
        Some(id) => (id, true),
        None => (raw_id.as_str(), false),
    };

    match get_author_page(&state, id).await {
        Ok(page) if as_json => Json(page).into_response(),
        Ok(page) => Html(render_author_page(&page)).into_response(),
        Err(err) if as_json => json_error(err.status(), err.to_string()).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_author_page(state: &AppState, id: &str) -> Result<AuthorPage, PageError> {
    let directory = state.authors();
    let not_found = || PageError::BadRequest(format!("Author {id} not found"));

    let resolved = authors::resolve_user(directory, id)
        .await
        .map_err(|err| {
            error!(?err, author = id, "failed to resolve author");
            PageError::Internal
        })?
        .ok_or_else(not_found)?;

    let display_name = directory
        .display_name(resolved.user_id)
        .await
        .map_err(|err| {
            error!(?err, user_id = resolved.user_id, "failed to load display name");
            PageError::Internal
        })?
        .ok_or_else(not_found)?;

    let orcid = if resolved.via_orcid {
        Some(format!("{ORCID_URI_PREFIX}/{}", resolved.lookup_id))
    } else {
        directory
            .orcid_for_user(resolved.user_id)
            .await
            .map_err(|err| {
                error!(?err, user_id = resolved.user_id, "failed to load ORCID");
                PageError::Internal
            })?
            .map(|orcid| format!("{ORCID_URI_PREFIX}/{orcid}"))
    };

    let listings = directory
        .articles_for_author(resolved.user_id)
        .await
        .map_err(|err| {
            error!(?err, user_id = resolved.user_id, "failed to load author listings");
            PageError::Internal
        })?;

    let docs = state.docs();
    let lookups: Vec<_> = listings
        .iter()
        .map(|listing| docs.get_abs(&listing.arxiv_id))
        .collect();
    let metadata: Vec<Option<DocMetadata>> = stream::iter(lookups)
        .buffered(METADATA_CONCURRENCY)
        .try_collect()
        .await
        .map_err(|err| {
            error!(?err, user_id = resolved.user_id, "failed to load listing metadata");
            PageError::Internal
        })?;

    let links = LinkBuilder {
        latexml_base_url: &state.settings().latexml_base_url,
    };
    let abstracts = listings
        .into_iter()
        .zip(metadata)
        .filter_map(|(listing, article)| match article {
            Some(article) => Some((listing, article)),
            None => {
                warn!(arxiv_id = %listing.arxiv_id, "listing has no metadata, skipping");
                None
            }
        })
        .enumerate()
        .map(|(index, (listing, article))| AuthorArticle {
            list_index: index + 1,
            downloads: links.downloads(&article),
            latexml: links.latexml(&article),
            author_links: links.author_links(&article),
            listing,
            article,
        })
        .collect();

    Ok(AuthorPage {
        title: format!("{display_name}'s articles on arXiv"),
        auri: format!(
            "{}/a/{}",
            state.settings().base_url,
            urlencoding::encode(id)
        ),
        display_name,
        orcid,
        abstracts,
    })
}

fn render_author_page(page: &AuthorPage) -> String {
    let orcid_html = page
        .orcid
        .as_deref()
        .map(|uri| {
            format!(
                r#"        <p class="note">ORCID: <a href="{uri}">{uri}</a></p>
"#,
                uri = escape_html(uri)
            )
        })
        .unwrap_or_default();

    let items = page
        .abstracts
        .iter()
        .map(render_article)
        .collect::<Vec<_>>()
        .join("\n");

    let listing_html = if page.abstracts.is_empty() {
        r#"        <p class="note">No articles are registered to this author.</p>"#.to_string()
    } else {
        format!(
            r#"        <dl class="listing">
{items}
        </dl>"#
        )
    };

    let body_html = format!(
        r#"        <p class="note">Author URI: <a href="{auri}">{auri}</a></p>
{orcid_html}{listing_html}"#,
        auri = escape_html(&page.auri),
    );

    render_page(PageLayout {
        meta_title: &page.title,
        page_heading: &page.title,
        body_html: Cow::Owned(body_html),
        extra_style_blocks: Vec::new(),
    })
}

fn render_article(item: &AuthorArticle) -> String {
    let article = &item.article;
    let downloads = item
        .downloads
        .iter()
        .map(|link| {
            format!(
                r#"<a href="{url}">{label}</a>"#,
                url = escape_html(&link.url),
                label = link.label
            )
        })
        .collect::<Vec<_>>()
        .join(" ");
    let authors = item
        .author_links
        .iter()
        .map(|link| {
            format!(
                r#"<a href="{url}">{name}</a>"#,
                url = escape_html(&link.url),
                name = escape_html(&link.name)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"            <dt>[{index}] <a href="/abs/{id}">arXiv:{id}</a> <span class="downloads">{downloads}</span></dt>
            <dd>
                <div class="list-title">{title}</div>
                <div class="list-authors">{authors}</div>
            </dd>"#,
        index = item.list_index,
        id = escape_html(&article.arxiv_id),
        downloads = downloads,
        title = escape_html(&article.title),
        authors = authors,
    )
}

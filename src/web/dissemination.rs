//! Routes for PDF and source downloads.

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::{
    dissemination::{ArtifactFile, ArtifactLookup, Format, http_date},
    identifier::Identifier,
    web::{
        AppState,
        range::{self, put},
        templates::{escape_html, render_message_page},
    },
};

const MAX_ID_LEN: usize = 40;
const LEGACY_PREFIX: &str = "arxiv/";
/// A specific version never changes.
const CC_VERSIONED: &str = "max-age=604800";
/// One year, the longest lifetime RFC 2616 allows.
const CC_WITHDRAWN: &str = "max-age=31536000";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pdf/:arxiv_id", get(pdf))
        .route("/pdf/:archive/:arxiv_id", get(pdf_in_archive))
        .route("/src/:arxiv_id", get(src))
        .route("/src/:archive/:arxiv_id", get(src_in_archive))
}

/// Everything other than a served artifact.
#[derive(Debug)]
pub enum DisseminationPage {
    Rejected { message: String },
    BadId { arxiv_id: String, message: String, status: StatusCode },
    NotFound { arxiv_id: String, expires: DateTime<Utc> },
    Withdrawn { arxiv_id: String },
    Unavailable { arxiv_id: String },
    NotPdf { arxiv_id: String },
    CannotBuild { arxiv_id: String, message: String },
}

impl IntoResponse for DisseminationPage {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        let (status, title, body) = match self {
            DisseminationPage::Rejected { message } => (
                StatusCode::BAD_REQUEST,
                "Bad Request",
                format!(r#"<p class="note">{}</p>"#, escape_html(&message)),
            ),
            DisseminationPage::BadId {
                arxiv_id,
                message,
                status,
            } => (
                status,
                "Invalid article identifier",
                format!(
                    r#"<p class="note">The identifier <strong>{}</strong> is not a valid article identifier.</p>
            <p class="error-detail">{}</p>"#,
                    escape_html(&arxiv_id),
                    escape_html(&message)
                ),
            ),
            DisseminationPage::NotFound { arxiv_id, expires } => {
                put(&mut headers, header::EXPIRES, &http_date(expires));
                (
                    StatusCode::NOT_FOUND,
                    "Article not found",
                    format!(
                        r#"<p class="note">No file is available for <strong>{}</strong>. Newly announced articles appear after the next publish cycle.</p>"#,
                        escape_html(&arxiv_id)
                    ),
                )
            }
            DisseminationPage::Withdrawn { arxiv_id } => {
                put(&mut headers, header::CACHE_CONTROL, CC_WITHDRAWN);
                (
                    StatusCode::OK,
                    "Article withdrawn",
                    format!(
                        r#"<p class="note">This version of <strong>{}</strong> has been withdrawn and no full text is available.</p>"#,
                        escape_html(&arxiv_id)
                    ),
                )
            }
            DisseminationPage::Unavailable { arxiv_id } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Full text unavailable",
                format!(
                    r#"<p class="note">The full text of <strong>{}</strong> is temporarily unavailable. Please try again later.</p>"#,
                    escape_html(&arxiv_id)
                ),
            ),
            DisseminationPage::NotPdf { arxiv_id } => (
                StatusCode::NOT_FOUND,
                "Full text unavailable",
                format!(
                    r#"<p class="note"><strong>{}</strong> was not submitted in a format that produces a PDF.</p>"#,
                    escape_html(&arxiv_id)
                ),
            ),
            DisseminationPage::CannotBuild { arxiv_id, message } => (
                StatusCode::NOT_FOUND,
                "PDF cannot be built",
                format!(
                    r#"<p class="note">A PDF could not be produced for <strong>{}</strong>.</p>
            <p class="error-detail">{}</p>"#,
                    escape_html(&arxiv_id),
                    escape_html(&message)
                ),
            ),
        };

        (status, headers, Html(render_message_page(title, &body))).into_response()
    }
}

async fn pdf(
    State(state): State<AppState>,
    Path(arxiv_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    pdf_or_redirect(&state, None, &arxiv_id, &headers).await
}

async fn pdf_in_archive(
    State(state): State<AppState>,
    Path((archive, arxiv_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    pdf_or_redirect(&state, Some(archive.as_str()), &arxiv_id, &headers).await
}

async fn src(
    State(state): State<AppState>,
    Path(arxiv_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    disseminate(&state, Format::Source, arxiv_id, &headers).await
}

async fn src_in_archive(
    State(state): State<AppState>,
    Path((archive, arxiv_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    disseminate(&state, Format::Source, format!("{archive}/{arxiv_id}"), &headers).await
}

/// `.pdf` paths are served; bare ids redirect so browsers save a `.pdf` file.
async fn pdf_or_redirect(
    state: &AppState,
    archive: Option<&str>,
    arxiv_id: &str,
    headers: &HeaderMap,
) -> Response {
    let (stem, has_suffix) = match arxiv_id.strip_suffix(".pdf") {
        Some(stem) => (stem, true),
        None => (arxiv_id, false),
    };
    let full_id = match archive {
        Some(archive) => format!("{archive}/{stem}"),
        None => stem.to_string(),
    };

    if has_suffix {
        return disseminate(state, Format::Pdf, full_id, headers).await;
    }

    let location = format!("{}/pdf/{}.pdf", state.settings().base_url, full_id);
    match HeaderValue::from_str(&location) {
        Ok(location) => (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, location)],
        )
            .into_response(),
        Err(err) => {
            debug!(?err, arxiv_id = %full_id, "identifier cannot be used in a redirect");
            DisseminationPage::Rejected {
                message: "Identifiers may not contain control characters.".to_string(),
            }
            .into_response()
        }
    }
}

async fn disseminate(
    state: &AppState,
    format: Format,
    arxiv_id: String,
    headers: &HeaderMap,
) -> Response {
    if arxiv_id.len() > MAX_ID_LEN {
        return DisseminationPage::Rejected {
            message: format!("Identifiers are at most {MAX_ID_LEN} characters long."),
        }
        .into_response();
    }
    if arxiv_id.starts_with(LEGACY_PREFIX) {
        return DisseminationPage::Rejected {
            message: "do not prefix with arxiv/ for non-legacy ids".to_string(),
        }
        .into_response();
    }

    let id = match Identifier::parse(&arxiv_id) {
        Ok(id) => id,
        Err(err) => {
            return DisseminationPage::BadId {
                arxiv_id,
                message: err.to_string(),
                status: StatusCode::BAD_REQUEST,
            }
            .into_response();
        }
    };

    let item = state.store().dissemination(format, &id).await;
    debug!(id = %id, format = format.as_str(), outcome = item.label(), "dissemination lookup");

    match item {
        ArtifactLookup::Found(file) => serve_file(state, format, &id, &arxiv_id, &file, headers)
            .await
            .unwrap_or_else(|page| page.into_response()),
        ArtifactLookup::VersionNotFound
        | ArtifactLookup::ArticleNotFound
        | ArtifactLookup::FileMissing => DisseminationPage::NotFound {
            arxiv_id,
            expires: state.schedule().next_publish(),
        }
        .into_response(),
        ArtifactLookup::Withdrawn | ArtifactLookup::NoSource => {
            DisseminationPage::Withdrawn { arxiv_id }.into_response()
        }
        ArtifactLookup::Unavailable => DisseminationPage::Unavailable { arxiv_id }.into_response(),
        ArtifactLookup::NotPdf => DisseminationPage::NotPdf { arxiv_id }.into_response(),
        ArtifactLookup::Deleted(reason) => DisseminationPage::BadId {
            arxiv_id,
            message: reason,
            status: StatusCode::NOT_FOUND,
        }
        .into_response(),
        ArtifactLookup::CannotBuild(reason) => DisseminationPage::CannotBuild {
            arxiv_id,
            message: reason,
        }
        .into_response(),
    }
}

async fn serve_file(
    state: &AppState,
    format: Format,
    id: &Identifier,
    arxiv_id: &str,
    file: &ArtifactFile,
    headers: &HeaderMap,
) -> Result<Response, DisseminationPage> {
    let mut response = range::respond(file, headers).await.map_err(|err| {
        error!(?err, path = %file.path().display(), "failed to open artifact");
        DisseminationPage::Unavailable {
            arxiv_id: arxiv_id.to_string(),
        }
    })?;

    let status = response.status();
    let has_body = matches!(status, StatusCode::OK | StatusCode::PARTIAL_CONTENT);
    let out = response.headers_mut();
    put(out, header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");
    if has_body {
        put(out, header::CONTENT_TYPE, file.content_type());
    }
    if has_body && format == Format::Source {
        put(
            out,
            header::CONTENT_DISPOSITION,
            &format!("attachment; filename=\"{}\"", file.download_name()),
        );
    }

    if status == StatusCode::OK {
        // Large files are streamed with chunked encoding instead of a fixed length.
        out.remove(header::CONTENT_LENGTH);
        put(out, header::TRANSFER_ENCODING, "chunked");
    }

    if id.has_version() {
        put(out, header::CACHE_CONTROL, CC_VERSIONED);
    } else {
        put(
            out,
            header::EXPIRES,
            &http_date(state.schedule().next_publish()),
        );
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        authors::testing::MemoryAuthors,
        config::Settings,
        dissemination::ArticleStore,
        documents::testing::MemoryDocuments,
        web::router::build_router,
    };

    /// Returns a fixed outcome and records what was asked for.
    struct FixedStore {
        outcome: ArtifactLookup,
        requests: Mutex<Vec<(Format, String)>>,
    }

    #[async_trait]
    impl ArticleStore for FixedStore {
        async fn dissemination(&self, format: Format, id: &Identifier) -> ArtifactLookup {
            self.requests
                .lock()
                .unwrap()
                .push((format, id.idv()));
            self.outcome.clone()
        }
    }

    fn app_with(outcome: ArtifactLookup) -> (Router, Arc<FixedStore>) {
        let store = Arc::new(FixedStore {
            outcome,
            requests: Mutex::new(Vec::new()),
        });
        let state = AppState::from_parts(
            Settings::for_tests("unused"),
            store.clone(),
            Arc::new(MemoryDocuments::default()),
            Arc::new(MemoryAuthors::default()),
        );
        (build_router(state), store)
    }

    async fn found_file(dir: &tempfile::TempDir, bytes: &[u8]) -> ArtifactFile {
        let path = dir.path().join("2101.00001v1.pdf");
        tokio::fs::write(&path, bytes).await.unwrap();
        ArtifactFile::stat(&path, "application/pdf", "2101.00001v1.pdf")
            .await
            .unwrap()
            .unwrap()
    }

    async fn get(app: Router, uri: &str, extra: &[(header::HeaderName, &str)]) -> Response {
        request(app, Method::GET, uri, extra).await
    }

    async fn request(
        app: Router,
        method: Method,
        uri: &str,
        extra: &[(header::HeaderName, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in extra {
            builder = builder.header(name.clone(), *value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn overlong_ids_are_rejected_before_lookup() {
        let (app, store) = app_with(ArtifactLookup::ArticleNotFound);
        let long_id = format!("{}.pdf", "1".repeat(41));
        let response = get(app, &format!("/pdf/{long_id}"), &[]).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn legacy_prefix_is_rejected_with_guidance() {
        let (app, store) = app_with(ArtifactLookup::ArticleNotFound);
        let response = get(app, "/pdf/arxiv/2101.00001v1.pdf", &[]).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.requests.lock().unwrap().is_empty());
        let body = body_text(response).await;
        assert!(body.contains("do not prefix with arxiv/ for non-legacy ids"));
    }

    #[tokio::test]
    async fn unparseable_id_renders_bad_id_page() {
        let (app, store) = app_with(ArtifactLookup::ArticleNotFound);
        let response = get(app, "/pdf/not-an-id.pdf", &[]).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.requests.lock().unwrap().is_empty());
        let body = body_text(response).await;
        assert!(body.contains("invalid arXiv identifier not-an-id"));
    }

    #[tokio::test]
    async fn bare_ids_redirect_permanently() {
        let (app, _) = app_with(ArtifactLookup::ArticleNotFound);
        let response = get(app.clone(), "/pdf/2101.00001v2", &[]).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://arxiv.org/pdf/2101.00001v2.pdf"
        );

        let response = get(app, "/pdf/hep-th/9901001", &[]).await;
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://arxiv.org/pdf/hep-th/9901001.pdf"
        );
    }

    #[tokio::test]
    async fn control_characters_never_reach_a_redirect() {
        let (app, store) = app_with(ArtifactLookup::ArticleNotFound);
        let response = get(app, "/pdf/2101.00001v1%0d%0aX-Injected:%201", &[]).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::LOCATION).is_none());
        assert!(response.headers().get("x-injected").is_none());
        assert!(store.requests.lock().unwrap().is_empty());
        let body = body_text(response).await;
        assert!(body.contains("control characters"));
    }

    #[tokio::test]
    async fn archive_paths_are_joined() {
        let (app, store) = app_with(ArtifactLookup::ArticleNotFound);
        get(app, "/pdf/hep-th/9901001v1.pdf", &[]).await;
        assert_eq!(
            store.requests.lock().unwrap().as_slice(),
            &[(Format::Pdf, "hep-th/9901001v1".to_string())]
        );
    }

    #[tokio::test]
    async fn full_download_is_chunked_without_length() {
        let dir = tempfile::tempdir().unwrap();
        let file = found_file(&dir, b"%PDF-1.5 body").await;
        let (app, _) = app_with(ArtifactLookup::Found(file));

        let response = get(app, "/pdf/2101.00001v1.pdf", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(headers[header::TRANSFER_ENCODING], "chunked");
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert!(headers.get(header::ETAG).is_some());
        assert!(headers.get(header::LAST_MODIFIED).is_some());

        assert_eq!(body_text(response).await, "%PDF-1.5 body");
    }

    #[tokio::test]
    async fn head_is_answered_like_get_without_a_body() {
        let dir = tempfile::tempdir().unwrap();
        let file = found_file(&dir, b"%PDF-1.5 body").await;
        let (app, _) = app_with(ArtifactLookup::Found(file));

        let response = request(app, Method::HEAD, "/pdf/2101.00001v1.pdf", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::TRANSFER_ENCODING], "chunked");
        assert!(headers.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(headers[header::CACHE_CONTROL], "max-age=604800");
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert!(headers.get(header::ETAG).is_some());

        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn range_request_is_partial() {
        let dir = tempfile::tempdir().unwrap();
        let file = found_file(&dir, b"%PDF-1.5 body").await;
        let (app, _) = app_with(ArtifactLookup::Found(file));

        let response = get(app, "/pdf/2101.00001v1.pdf", &[(header::RANGE, "bytes=0-3")]).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 0-3/13");
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(body_text(response).await, "%PDF");
    }

    #[tokio::test]
    async fn unsatisfiable_range_has_no_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let file = found_file(&dir, b"%PDF-1.5 body").await;
        let (app, _) = app_with(ArtifactLookup::Found(file));

        let response = get(app, "/pdf/2101.00001v1.pdf", &[(header::RANGE, "bytes=100-")]).await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */13");
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    }

    #[tokio::test]
    async fn vanished_file_page_names_the_requested_id() {
        let dir = tempfile::tempdir().unwrap();
        let file = found_file(&dir, b"%PDF").await;
        tokio::fs::remove_file(file.path()).await.unwrap();
        let (app, _) = app_with(ArtifactLookup::Found(file));

        let response = get(app, "/pdf/math.AG/0101001v1.pdf", &[]).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("math.AG/0101001v1"));
    }

    #[tokio::test]
    async fn matching_etag_is_not_modified() {
        let dir = tempfile::tempdir().unwrap();
        let file = found_file(&dir, b"%PDF-1.5 body").await;
        let etag = file.etag().to_string();
        let (app, _) = app_with(ArtifactLookup::Found(file));

        let response = get(app, "/pdf/2101.00001v1.pdf", &[(header::IF_NONE_MATCH, etag.as_str())]).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn versioned_ids_get_week_long_max_age() {
        let dir = tempfile::tempdir().unwrap();
        let file = found_file(&dir, b"%PDF").await;
        let (app, _) = app_with(ArtifactLookup::Found(file));

        let response = get(app, "/pdf/2101.00001v1.pdf", &[]).await;
        assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=604800");
        assert!(response.headers().get(header::EXPIRES).is_none());
    }

    #[tokio::test]
    async fn unversioned_ids_expire_at_next_publish() {
        let dir = tempfile::tempdir().unwrap();
        let file = found_file(&dir, b"%PDF").await;
        let (app, _) = app_with(ArtifactLookup::Found(file));

        let response = get(app, "/pdf/2101.00001.pdf", &[]).await;
        let schedule = crate::dissemination::PublishSchedule::new(1, Vec::new());
        assert_eq!(
            response.headers()[header::EXPIRES],
            http_date(schedule.next_publish()).as_str()
        );
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn not_found_variants_expire_at_next_publish() {
        for outcome in [
            ArtifactLookup::ArticleNotFound,
            ArtifactLookup::VersionNotFound,
            ArtifactLookup::FileMissing,
        ] {
            let (app, _) = app_with(outcome);
            let response = get(app, "/pdf/2101.00001v9.pdf", &[]).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert!(response.headers().get(header::EXPIRES).is_some());
        }
    }

    #[tokio::test]
    async fn withdrawn_is_ok_and_cached_for_a_year() {
        for outcome in [ArtifactLookup::Withdrawn, ArtifactLookup::NoSource] {
            let (app, _) = app_with(outcome);
            let response = get(app, "/pdf/2101.00001v2.pdf", &[]).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=31536000");
            assert!(body_text(response).await.contains("withdrawn"));
        }
    }

    #[tokio::test]
    async fn unavailable_is_uncached_server_error() {
        let (app, _) = app_with(ArtifactLookup::Unavailable);
        let response = get(app, "/pdf/2101.00001v1.pdf", &[]).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        assert!(response.headers().get(header::EXPIRES).is_none());
    }

    #[tokio::test]
    async fn content_state_pages() {
        let (app, _) = app_with(ArtifactLookup::NotPdf);
        let response = get(app, "/pdf/2101.00001v1.pdf", &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (app, _) = app_with(ArtifactLookup::Deleted("removed by admin".into()));
        let response = get(app, "/pdf/2101.00001v1.pdf", &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("removed by admin"));

        let (app, _) = app_with(ArtifactLookup::CannotBuild("latex error".into()));
        let response = get(app, "/pdf/2101.00001v1.pdf", &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("latex error"));
    }

    #[tokio::test]
    async fn source_downloads_are_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2101.00001v1.tar.gz");
        tokio::fs::write(&path, b"\x1f\x8bsource").await.unwrap();
        let file = ArtifactFile::stat(&path, "application/gzip", "2101.00001v1.tar.gz")
            .await
            .unwrap()
            .unwrap();
        let (app, store) = app_with(ArtifactLookup::Found(file));

        let response = get(app, "/src/2101.00001v1", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/gzip");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"2101.00001v1.tar.gz\""
        );
        assert_eq!(store.requests.lock().unwrap()[0].0, Format::Source);
    }
}

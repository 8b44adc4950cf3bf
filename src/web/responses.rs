use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::web::templates::{escape_html, render_message_page};

/// Canonical JSON payload for error responses.
#[derive(Debug, Serialize, Clone)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Helper for controllers that need to return `(StatusCode, Json<ApiMessage>)`.
pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiMessage>) {
    (status, Json(ApiMessage::new(message)))
}

/// Request-terminating failures of page controllers.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal,
}

impl PageError {
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PageError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            PageError::BadRequest(_) => "Bad Request",
            PageError::Internal => "Internal Server Error",
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let message = format!(r#"<p class="note">{}</p>"#, escape_html(&self.to_string()));
        (self.status(), Html(render_message_page(self.title(), &message))).into_response()
    }
}

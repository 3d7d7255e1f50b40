//! Tolerant extractor for download requests.
//!
//! Clients send `{url, folder, filename}` as JSON, as a form-encoded body,
//! or as query parameters. The declared content type is tried first; an
//! undeclared body is tried as JSON, then as form text. Fields still missing
//! afterwards are filled from the query string.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use modelfetch_core::DownloadRequest;
use url::form_urlencoded;

use crate::error::HttpError;

/// A download request pulled from whichever encoding the client used.
#[derive(Debug)]
pub struct DownloadPayload(pub DownloadRequest);

impl<S> FromRequest<S> for DownloadPayload
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = req.uri().query().map(str::to_string);
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| HttpError::BadRequest(e.body_text()))?;

        Ok(Self(parse_payload(&content_type, &body, query.as_deref())))
    }
}

fn parse_payload(content_type: &str, body: &[u8], query: Option<&str>) -> DownloadRequest {
    let parsed = if content_type.starts_with("application/json") {
        from_json(body)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        from_form(body)
    } else {
        from_json(body).or_else(|| from_form(body))
    };

    let mut request = parsed.unwrap_or_default();
    if let Some(from_query) = query.and_then(|q| from_form(q.as_bytes())) {
        request.url = request.url.or(from_query.url);
        request.folder = request.folder.or(from_query.folder);
        request.filename = request.filename.or(from_query.filename);
    }
    request
}

fn from_json(body: &[u8]) -> Option<DownloadRequest> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(request) => Some(request),
        Err(e) => {
            tracing::debug!(error = %e, "Download payload is not JSON");
            None
        }
    }
}

/// Parse `key=value&...`; `None` if no recognised key is present.
fn from_form(body: &[u8]) -> Option<DownloadRequest> {
    let mut request = DownloadRequest::default();
    let mut found = false;
    for (key, value) in form_urlencoded::parse(body) {
        let slot = match key.as_ref() {
            "url" => &mut request.url,
            "folder" => &mut request.folder,
            "filename" => &mut request.filename,
            _ => continue,
        };
        *slot = Some(value.into_owned());
        found = true;
    }
    found.then_some(request)
}

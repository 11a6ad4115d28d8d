use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use crate::http::server::AppState;
use crate::settings::keys::CLIENT_TOKEN;

/// Checks the caller's token against the live client token.
///
/// The token is read on every request, so a token changed through the
/// settings API is enforced from the next request on.
pub async fn settings_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if !state.admin.require_auth {
        return Ok(next.run(request).await);
    }

    let expected = state.reader.get(CLIENT_TOKEN).unwrap_or_default();
    if expected.is_empty() {
        tracing::warn!("Settings API requested but no client token is configured");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let headers = request.headers();
    let bearer = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let api_key = headers
        .get("x-api-key")
        .and_then(|h| h.to_str().ok());

    if bearer == Some(expected.as_str()) || api_key == Some(expected.as_str()) {
        return Ok(next.run(request).await);
    }

    Err(StatusCode::UNAUTHORIZED)
}

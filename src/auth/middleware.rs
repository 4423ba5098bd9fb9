use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::AuthContext;
use crate::app::AppState;
use crate::error::ErrorResponse;

/// Extractor that requires an authenticated session.
///
/// The access token is taken from the `Authorization: Bearer` header when
/// present, falling back to the auth provider's session cookie for
/// server-rendered pages.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl std::ops::Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing session token"),
            AuthError::InvalidFormat => (StatusCode::UNAUTHORIZED, "Invalid authorization format"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired session"),
        };

        let body = ErrorResponse {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            request_id: None,
        };

        (status, Json(body)).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts, &state.settings.session_cookie_name)?;

        let claims = state.jwks_cache.verify_token(&token).await.map_err(|e| {
            tracing::warn!(error = %e, "JWT verification failed");
            AuthError::InvalidToken
        })?;

        let context = AuthContext::from_claims(&claims).map_err(|e| {
            tracing::warn!(error = %e, "Failed to build auth context");
            AuthError::InvalidToken
        })?;

        Ok(RequireAuth(context))
    }
}

/// Pull the access token out of the request, header first, cookie second.
fn extract_token(parts: &Parts, cookie_name: &str) -> Result<String, AuthError> {
    if let Some(auth_header) = parts.headers.get(AUTHORIZATION) {
        let auth_header = auth_header.to_str().map_err(|_| AuthError::InvalidFormat)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        return Ok(token.to_string());
    }

    let jar = CookieJar::from_headers(&parts.headers);
    match jar.get(cookie_name) {
        Some(cookie) if !cookie.value().is_empty() => Ok(cookie.value().to_string()),
        _ => Err(AuthError::MissingToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_header_takes_precedence_over_cookie() {
        let parts = parts_with_headers(&[
            ("authorization", "Bearer header-token"),
            ("cookie", "sb-access-token=cookie-token"),
        ]);
        let token = extract_token(&parts, "sb-access-token").unwrap();
        assert_eq!(token, "header-token");
    }

    #[test]
    fn falls_back_to_session_cookie() {
        let parts = parts_with_headers(&[("cookie", "sb-access-token=cookie-token; other=x")]);
        let token = extract_token(&parts, "sb-access-token").unwrap();
        assert_eq!(token, "cookie-token");
    }

    #[test]
    fn missing_token_is_an_error() {
        let parts = parts_with_headers(&[]);
        assert!(matches!(
            extract_token(&parts, "sb-access-token"),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn malformed_authorization_header_is_rejected() {
        let parts = parts_with_headers(&[("authorization", "Basic abc123")]);
        assert!(matches!(
            extract_token(&parts, "sb-access-token"),
            Err(AuthError::InvalidFormat)
        ));
    }
}

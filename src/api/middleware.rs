//! Bearer-token authentication for the hook bridge.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Environment variable holding the shared secret of the host process.
pub const API_KEY_ENV: &str = "QUARRYLOCK_API_KEY";

/// Who may drive the bridge. With no key every request is let through.
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    pub api_key: Option<String>,
}

impl SecurityConfig {
    /// Reads [`API_KEY_ENV`]; an empty value counts as unset.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.is_empty()),
        }
    }

    pub fn disabled() -> Self {
        Self { api_key: None }
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Rejects hook and admin calls that do not carry the host's key.
pub async fn auth_middleware(
    State(security): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = security.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    match bearer_token(request.headers()) {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Rejected {} with a wrong API key", request.uri().path());
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Rejected {} without a bearer token", request.uri().path());
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use assetflow_auth::TokenService;

use crate::app::errors;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .tokens
        .verify(token, Utc::now())
        .map_err(|_e| errors::unauthorized())?;

    req.extensions_mut()
        .insert(CallerContext::new(claims.sub, claims.name));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(errors::unauthorized)?;

    let header = header.to_str().map_err(|_| errors::unauthorized())?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or_else(errors::unauthorized)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(errors::unauthorized());
    }

    Ok(token)
}

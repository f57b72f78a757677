use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use gedenk_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// The caller's identity when a route accepts, but does not require, a
/// bearer credential. An invalid token is treated the same as no token.
#[derive(Debug, Clone)]
pub struct OptionalClaims(pub Option<Claims>);

fn claims_from_request(req: &Request, secret: &str) -> Option<Claims> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Extract and validate the JWT from the Authorization header; reject the
/// request with 401 when it is missing or invalid. Tokens are verified
/// against the same `AppState` secret they were minted from.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = claims_from_request(&req, &state.jwt_secret).ok_or(ApiError::AuthRequired)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Like [`require_auth`], but never rejects: routes that serve public
/// memorials to anonymous visitors get `OptionalClaims(None)` instead.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let claims = claims_from_request(&req, &state.jwt_secret);
    req.extensions_mut().insert(OptionalClaims(claims));
    next.run(req).await
}

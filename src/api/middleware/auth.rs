//! Operator authentication for the affiliate admin routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::{error::AppError, state::AppState};

/// Guards the operator routes (`/clicks`, `/performance/*`, `/fraud-check`,
/// `/export`) behind an `Authorization: Bearer <token>` header.
///
/// The token is hashed with the signing secret before lookup, so only the
/// HMAC ever reaches the token store. Revoked tokens are refused and a hit
/// refreshes `last_used_at` on a best-effort basis.
///
/// Every refusal is a `401` carrying `WWW-Authenticate: Bearer`; public
/// tracking routes never pass through here.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "operator bearer token is missing or malformed"}),
            )
        })?;

    let req = Request::from_parts(parts, body);

    st.auth_service.authenticate(&token).await?;

    Ok(next.run(req).await)
}

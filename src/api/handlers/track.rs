//! Handlers for click tracking and link generation.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::link::{GenerateLinkRequest, GenerateLinkResponse};
use crate::api::dto::track::{TrackRequest, TrackResponse};
use crate::api::extract::ClientContext;
use crate::error::AppError;
use crate::state::AppState;

/// Records a click reported by a client-side integration.
///
/// # Endpoint
///
/// `POST /api/affiliate/track`
///
/// # Request Body
///
/// ```json
/// { "partnerId": "P1", "productId": "X1", "sessionId": "s-1", "utmSource": "newsletter" }
/// ```
///
/// IP address, user agent and referrer are taken from the request itself.
///
/// # Response
///
/// `201 Created` with `{ "trackingId": "..." }`.
///
/// # Errors
///
/// - 400 when a field is invalid (every invalid field is listed)
/// - 404 for an unknown partner or product
/// - 410 for an inactive partner or product
pub async fn track_handler(
    State(state): State<AppState>,
    ClientContext(client): ClientContext,
    payload: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TrackResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let tracking_id = state
        .tracking_service
        .track_click(payload.into_input(client))
        .await?;

    Ok((StatusCode::CREATED, Json(TrackResponse { tracking_id })))
}

/// Builds an affiliate link pointing at the redirect endpoint.
///
/// # Endpoint
///
/// `POST /api/affiliate/generate-link`
///
/// # Response
///
/// ```json
/// { "affiliateLink": "https://site.example/api/affiliate/redirect?p=P1&pr=X1&utm_source=blog" }
/// ```
pub async fn generate_link_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateLinkRequest>, JsonRejection>,
) -> Result<Json<GenerateLinkResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let affiliate_link = state.link_service.generate_link(payload.into()).await?;

    Ok(Json(GenerateLinkResponse { affiliate_link }))
}

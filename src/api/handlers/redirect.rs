//! Handler for affiliate link redirects.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::api::dto::track::RedirectQuery;
use crate::api::extract::ClientContext;
use crate::error::AppError;
use crate::state::AppState;

/// Cookie carrying the tracking id of the last redirect.
pub const TRACKING_COOKIE: &str = "affiliate-tracking";

/// Records a click and redirects the reader to the partner's application page.
///
/// # Endpoint
///
/// `GET /api/affiliate/redirect?p={partnerId}&pr={productId}&utm_source=...`
///
/// # Response
///
/// `302 Found` with `Location` set to the product URL plus `trackingId`, and
/// the tracking cookie:
///
/// ```text
/// Set-Cookie: affiliate-tracking=<id>; Path=/; Max-Age=2592000; HttpOnly; SameSite=Lax; Secure
/// ```
///
/// # Errors
///
/// Any tracking failure is returned as the mapped error. The reader is never
/// redirected to a destination that was not verified.
pub async fn redirect_handler(
    State(state): State<AppState>,
    ClientContext(client): ClientContext,
    query: Result<Query<RedirectQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;

    let target = state
        .tracking_service
        .process_redirect(query.into_input(client))
        .await?;

    let cookie = tracking_cookie(
        &target.tracking_id,
        state.attribution_window.num_seconds(),
        state.cookie_secure,
    );

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, target.redirect_url),
            (header::SET_COOKIE, cookie),
        ],
    ))
}

/// Formats the `Set-Cookie` value for a tracking id.
pub fn tracking_cookie(tracking_id: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{TRACKING_COOKIE}={tracking_id}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

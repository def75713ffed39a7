//! Request extractors shared by the handlers.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::state::AppState;
use crate::utils::client_info::ClientInfo;

/// Client metadata of the current request.
///
/// The peer address is only present when the server was started with
/// connect info; without it the IP falls back to `unknown`.
pub struct ClientContext(pub ClientInfo);

impl FromRequestParts<AppState> for ClientContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientContext(ClientInfo::from_request(
            &parts.headers,
            peer,
            state.behind_proxy,
        )))
    }
}

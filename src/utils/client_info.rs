//! Client metadata extraction from HTTP requests.
//!
//! All values are best effort. Anything the transport cannot supply falls
//! back to [`UNKNOWN`] instead of failing the request.

use axum::http::{HeaderMap, header};
use std::net::SocketAddr;

use crate::domain::entities::UNKNOWN;

/// Longest header value kept for user agent and referrer.
const MAX_HEADER_LEN: usize = 512;

/// Network metadata of the client that issued a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: Option<String>,
}

impl ClientInfo {
    /// Collects client metadata from headers and the socket peer address.
    ///
    /// With `behind_proxy` the first `X-Forwarded-For` entry, then
    /// `X-Real-IP`, take precedence over the peer address.
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> Self {
        let forwarded = behind_proxy.then(|| forwarded_ip(headers)).flatten();
        let ip_address = forwarded
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let user_agent = header_value(headers, header::USER_AGENT.as_str())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let referrer = header_value(headers, header::REFERER.as_str());

        Self {
            ip_address,
            user_agent,
            referrer,
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.chars().take(MAX_HEADER_LEN).collect())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .or_else(|| header_value(headers, "x-real-ip"))
}

/// Returns the value of cookie `name` from the `Cookie` headers, if present.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

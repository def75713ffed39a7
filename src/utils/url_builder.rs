//! URL parsing and construction for affiliate links and redirects.
//!
//! Only absolute HTTP(S) URLs are accepted, which rejects `javascript:`,
//! `data:`, `file:` and similar schemes before they can become a redirect
//! target.

use url::Url;

use crate::domain::entities::CampaignParams;

/// Path of the redirect endpoint, relative to the service base URL.
pub const REDIRECT_PATH: &str = "api/affiliate/redirect";

/// Query parameter carrying the tracking id on the destination URL.
pub const TRACKING_PARAM: &str = "trackingId";

/// Errors that can occur while parsing or building URLs.
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,
}

/// Parses an absolute HTTP(S) URL.
///
/// # Errors
///
/// Returns [`UrlError::InvalidFormat`] for malformed or relative URLs,
/// [`UrlError::UnsupportedProtocol`] for non-HTTP(S) schemes and
/// [`UrlError::MissingHost`] when no host is present.
pub fn parse_http_url(input: &str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Builds the outbound affiliate link for a partner product.
///
/// The base URL's path is kept and the redirect endpoint appended to it; its
/// query and fragment are dropped.
///
/// ```ignore
/// let link = affiliate_link("https://site.example", "P1", "X1", &CampaignParams::default())?;
/// assert_eq!(link, "https://site.example/api/affiliate/redirect?p=P1&pr=X1");
/// ```
pub fn affiliate_link(
    base_url: &str,
    partner_id: &str,
    product_id: &str,
    campaign: &CampaignParams,
) -> Result<String, UrlError> {
    let mut url = parse_http_url(base_url)?;
    url.set_query(None);
    url.set_fragment(None);

    let path = format!("{}/{}", url.path().trim_end_matches('/'), REDIRECT_PATH);
    url.set_path(&path);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("p", partner_id);
        query.append_pair("pr", product_id);
        for (key, value) in campaign.query_pairs() {
            query.append_pair(key, value);
        }
    }

    Ok(url.to_string())
}

/// Appends the tracking id to a product's application URL.
///
/// Existing query parameters are preserved and the fragment is kept.
pub fn with_tracking_id(application_url: &str, tracking_id: &str) -> Result<String, UrlError> {
    let mut url = parse_http_url(application_url)?;
    url.query_pairs_mut().append_pair(TRACKING_PARAM, tracking_id);

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(source: Option<&str>, medium: Option<&str>, name: Option<&str>) -> CampaignParams {
        CampaignParams::new(
            source.map(String::from),
            medium.map(String::from),
            name.map(String::from),
        )
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert!(matches!(
            parse_http_url("javascript:alert(1)"),
            Err(UrlError::UnsupportedProtocol)
        ));
        assert!(matches!(
            parse_http_url("ftp://example.com"),
            Err(UrlError::UnsupportedProtocol)
        ));
    }

    #[test]
    fn test_parse_rejects_relative() {
        assert!(matches!(
            parse_http_url("/relative/path"),
            Err(UrlError::InvalidFormat(_))
        ));
        assert!(parse_http_url("not a url").is_err());
    }

    #[test]
    fn test_affiliate_link_basic() {
        let link = affiliate_link("https://site.example", "P1", "X1", &CampaignParams::default())
            .unwrap();

        assert_eq!(link, "https://site.example/api/affiliate/redirect?p=P1&pr=X1");
    }

    #[test]
    fn test_affiliate_link_keeps_base_path() {
        let link = affiliate_link(
            "https://site.example/blog/?ref=old#top",
            "P1",
            "X1",
            &CampaignParams::default(),
        )
        .unwrap();

        assert_eq!(
            link,
            "https://site.example/blog/api/affiliate/redirect?p=P1&pr=X1"
        );
    }

    #[test]
    fn test_affiliate_link_campaign_params() {
        let link = affiliate_link(
            "https://site.example",
            "P1",
            "X1",
            &campaign(Some("newsletter"), Some(""), Some("spring sale")),
        )
        .unwrap();

        assert_eq!(
            link,
            "https://site.example/api/affiliate/redirect?p=P1&pr=X1&utm_source=newsletter&utm_campaign=spring+sale"
        );
    }

    #[test]
    fn test_with_tracking_id_preserves_query() {
        let url = with_tracking_id("https://bank.example/apply?offer=7", "abc").unwrap();
        assert_eq!(url, "https://bank.example/apply?offer=7&trackingId=abc");

        let url = with_tracking_id("https://bank.example/apply", "abc").unwrap();
        assert_eq!(url, "https://bank.example/apply?trackingId=abc");
    }
}

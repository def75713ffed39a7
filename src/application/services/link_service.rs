//! Outbound affiliate link generation.

use std::sync::Arc;

use serde_json::json;

use super::registry_lookup::resolve_active_offer;
use crate::domain::entities::CampaignParams;
use crate::domain::repositories::RegistryRepository;
use crate::error::{AppError, FieldErrors};
use crate::utils::tracking_id::is_valid_identifier;
use crate::utils::url_builder::{affiliate_link, parse_http_url};

/// Request to build an affiliate link.
#[derive(Debug, Clone)]
pub struct LinkRequest {
    pub partner_id: String,
    pub product_id: String,
    pub base_url: String,
    pub campaign: CampaignParams,
}

/// Service building trackable links that point at the redirect endpoint.
///
/// Reads the registry only. Nothing is persisted.
pub struct LinkService {
    registry: Arc<dyn RegistryRepository>,
}

impl LinkService {
    pub fn new(registry: Arc<dyn RegistryRepository>) -> Self {
        Self { registry }
    }

    /// Builds the affiliate link for an active partner product.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for malformed ids or base URL, listing
    /// every invalid field.
    /// Returns [`AppError::NotFound`] / [`AppError::InactiveEntity`] from the
    /// registry check.
    pub async fn generate_link(&self, request: LinkRequest) -> Result<String, AppError> {
        let mut errors = FieldErrors::new();
        if !is_valid_identifier(&request.partner_id) {
            errors.add("partnerId", "must be 1-64 characters of [A-Za-z0-9_-]");
        }
        if !is_valid_identifier(&request.product_id) {
            errors.add("productId", "must be 1-64 characters of [A-Za-z0-9_-]");
        }
        if let Err(e) = parse_http_url(&request.base_url) {
            errors.add("baseUrl", e.to_string());
        }
        errors.into_result()?;

        resolve_active_offer(
            self.registry.as_ref(),
            &request.partner_id,
            &request.product_id,
        )
        .await?;

        affiliate_link(
            &request.base_url,
            &request.partner_id,
            &request.product_id,
            &request.campaign,
        )
        .map_err(|e| AppError::bad_request("Invalid base URL", json!({ "reason": e.to_string() })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AffiliatePartner, Product, ProductType};
    use crate::domain::repositories::MockRegistryRepository;
    use chrono::Utc;

    fn registry(product_active: bool) -> MockRegistryRepository {
        let mut mock = MockRegistryRepository::new();
        mock.expect_find_partner().returning(|_| {
            Ok(Some(AffiliatePartner {
                id: "P1".to_string(),
                name: "Bank".to_string(),
                website: None,
                commission_rate: None,
                is_active: true,
                product_ids: vec!["X1".to_string()],
                created_at: Utc::now(),
            }))
        });
        mock.expect_find_product().returning(move |_| {
            Ok(Some(Product {
                id: "X1".to_string(),
                partner_id: "P1".to_string(),
                name: "Card".to_string(),
                product_type: ProductType::CreditCard,
                application_url: "https://bank.example/apply".to_string(),
                is_active: product_active,
                created_at: Utc::now(),
            }))
        });
        mock
    }

    fn request(base_url: &str) -> LinkRequest {
        LinkRequest {
            partner_id: "P1".to_string(),
            product_id: "X1".to_string(),
            base_url: base_url.to_string(),
            campaign: CampaignParams::new(Some("blog".to_string()), None, None),
        }
    }

    #[tokio::test]
    async fn test_generate_link() {
        let service = LinkService::new(Arc::new(registry(true)));

        let link = service
            .generate_link(request("https://site.example"))
            .await
            .unwrap();

        assert_eq!(
            link,
            "https://site.example/api/affiliate/redirect?p=P1&pr=X1&utm_source=blog"
        );
    }

    #[tokio::test]
    async fn test_inactive_product_rejected() {
        let service = LinkService::new(Arc::new(registry(false)));

        let err = service
            .generate_link(request("https://site.example"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InactiveEntity { .. }));
    }

    #[tokio::test]
    async fn test_validation_lists_every_field() {
        // The registry must not be consulted for malformed input.
        let service = LinkService::new(Arc::new(MockRegistryRepository::new()));

        let err = service
            .generate_link(LinkRequest {
                partner_id: "".to_string(),
                product_id: "bad id".to_string(),
                base_url: "ftp://site.example".to_string(),
                campaign: CampaignParams::default(),
            })
            .await
            .unwrap_err();

        let fields = &err.to_error_info().details["fields"];
        assert!(fields["partnerId"].is_array());
        assert!(fields["productId"].is_array());
        assert!(fields["baseUrl"].is_array());
    }
}

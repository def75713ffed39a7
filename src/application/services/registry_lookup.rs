//! Shared partner/product resolution for link generation and click tracking.

use serde_json::json;

use crate::domain::entities::{AffiliatePartner, Product};
use crate::domain::repositories::RegistryRepository;
use crate::error::AppError;

/// An active partner together with an active product it owns.
#[derive(Debug, Clone)]
pub struct ActiveOffer {
    pub partner: AffiliatePartner,
    pub product: Product,
}

/// Resolves a partner/product pair that may receive traffic.
///
/// Existence is checked before activity, so an unknown id always reports
/// not found even when the other entity is inactive. A product owned by a
/// different partner is reported as not found.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the partner or product does not exist.
/// Returns [`AppError::InactiveEntity`] if either is inactive.
pub async fn resolve_active_offer(
    registry: &dyn RegistryRepository,
    partner_id: &str,
    product_id: &str,
) -> Result<ActiveOffer, AppError> {
    let partner = registry.find_partner(partner_id).await?.ok_or_else(|| {
        AppError::not_found("Partner not found", json!({ "partnerId": partner_id }))
    })?;

    let product = registry
        .find_product(product_id)
        .await?
        .filter(|p| p.partner_id == partner.id || partner.owns(&p.id))
        .ok_or_else(|| {
            AppError::not_found(
                "Product not found",
                json!({ "partnerId": partner_id, "productId": product_id }),
            )
        })?;

    if !partner.is_active {
        return Err(AppError::inactive(
            "Partner is not active",
            json!({ "partnerId": partner_id }),
        ));
    }

    if !product.is_active {
        return Err(AppError::inactive(
            "Product is not active",
            json!({ "productId": product_id }),
        ));
    }

    Ok(ActiveOffer { partner, product })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ProductType;
    use crate::domain::repositories::MockRegistryRepository;
    use chrono::Utc;

    fn partner(id: &str, active: bool, products: &[&str]) -> AffiliatePartner {
        AffiliatePartner {
            id: id.to_string(),
            name: id.to_string(),
            website: None,
            commission_rate: None,
            is_active: active,
            product_ids: products.iter().map(|p| p.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn product(id: &str, partner_id: &str, active: bool) -> Product {
        Product {
            id: id.to_string(),
            partner_id: partner_id.to_string(),
            name: id.to_string(),
            product_type: ProductType::PersonalLoan,
            application_url: "https://bank.example/apply".to_string(),
            is_active: active,
            created_at: Utc::now(),
        }
    }

    fn registry(p: AffiliatePartner, pr: Option<Product>) -> MockRegistryRepository {
        let mut mock = MockRegistryRepository::new();
        mock.expect_find_partner()
            .returning(move |_| Ok(Some(p.clone())));
        mock.expect_find_product()
            .returning(move |_| Ok(pr.clone()));
        mock
    }

    #[tokio::test]
    async fn test_resolves_active_pair() {
        let mock = registry(partner("P1", true, &["X1"]), Some(product("X1", "P1", true)));

        let offer = resolve_active_offer(&mock, "P1", "X1").await.unwrap();
        assert_eq!(offer.product.id, "X1");
    }

    #[tokio::test]
    async fn test_unknown_partner() {
        let mut mock = MockRegistryRepository::new();
        mock.expect_find_partner().returning(|_| Ok(None));

        let err = resolve_active_offer(&mock, "nope", "X1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_foreign_product_is_not_found() {
        let mock = registry(partner("P1", true, &["X1"]), Some(product("Y1", "P2", true)));

        let err = resolve_active_offer(&mock, "P1", "Y1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_inactive_partner() {
        let mock = registry(partner("P2", false, &["Y1"]), Some(product("Y1", "P2", true)));

        let err = resolve_active_offer(&mock, "P2", "Y1").await.unwrap_err();
        assert!(matches!(err, AppError::InactiveEntity { .. }));
    }

    #[tokio::test]
    async fn test_inactive_product() {
        let mock = registry(partner("P1", true, &["X2"]), Some(product("X2", "P1", false)));

        let err = resolve_active_offer(&mock, "P1", "X2").await.unwrap_err();
        assert!(matches!(err, AppError::InactiveEntity { .. }));
    }
}

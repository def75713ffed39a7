//! Repository trait for the partner/product registry.

use crate::domain::entities::{AffiliatePartner, NewPartner, NewProduct, Product};
use crate::error::AppError;
use async_trait::async_trait;

/// Read-mostly access to affiliate partners and their products.
///
/// The tracking engine only reads from the registry; the write methods exist
/// for seeding from the `admin` CLI.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRegistryRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryRepository: Send + Sync {
    /// Finds a partner by id, including the ids of the products it owns.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TransientStore`] if the store is unreachable.
    async fn find_partner(&self, partner_id: &str) -> Result<Option<AffiliatePartner>, AppError>;

    /// Finds a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TransientStore`] if the store is unreachable.
    async fn find_product(&self, product_id: &str) -> Result<Option<Product>, AppError>;

    /// Lists all partners ordered by id.
    async fn list_partners(&self) -> Result<Vec<AffiliatePartner>, AppError>;

    /// Lists products ordered by id, optionally restricted to one partner.
    async fn list_products(&self, partner_id: Option<String>) -> Result<Vec<Product>, AppError>;

    /// Registers a partner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the id is taken.
    async fn create_partner(&self, new_partner: NewPartner) -> Result<AffiliatePartner, AppError>;

    /// Registers a product under an existing partner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the id is taken.
    /// Returns [`AppError::NotFound`] if the owning partner does not exist.
    async fn create_product(&self, new_product: NewProduct) -> Result<Product, AppError>;
}

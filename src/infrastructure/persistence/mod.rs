//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` row structs.
//!
//! # Repositories
//!
//! - [`PgRegistryRepository`] - Partner and product lookup
//! - [`PgClickRepository`] - Click storage and conversion attribution
//! - [`PgAnalyticsRepository`] - Performance aggregation
//! - [`PgTokenRepository`] - Admin token storage and validation

pub mod pg_analytics_repository;
pub mod pg_click_repository;
pub mod pg_registry_repository;
pub mod pg_token_repository;

pub use pg_analytics_repository::PgAnalyticsRepository;
pub use pg_click_repository::PgClickRepository;
pub use pg_registry_repository::PgRegistryRepository;
pub use pg_token_repository::PgTokenRepository;

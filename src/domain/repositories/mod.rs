//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access so the services can run against
//! PostgreSQL, the in-process store or generated mocks.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence` and
//!   `crate::infrastructure::memory`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`RegistryRepository`] - Partner and product lookup
//! - [`ClickRepository`] - Click tracking and conversion attribution
//! - [`AnalyticsRepository`] - Performance aggregation
//! - [`TokenRepository`] - Admin API token authentication
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod analytics_repository;
pub mod click_repository;
pub mod registry_repository;
pub mod token_repository;

pub use analytics_repository::{
    AnalyticsRepository, PartnerPerformance, PerformanceFilter, ProductPerformance,
};
pub use click_repository::{ClickCursor, ClickFilter, ClickRepository};
pub use registry_repository::RegistryRepository;
pub use token_repository::{ApiToken, TokenRepository};

#[cfg(test)]
pub use analytics_repository::MockAnalyticsRepository;
#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use registry_repository::MockRegistryRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;

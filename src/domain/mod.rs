//! Domain layer containing business entities and logic.
//!
//! Defines entities, repository interfaces and the pure attribution rules,
//! independent of infrastructure concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`fraud`] - Deterministic click fraud heuristics
//! - [`clock`] - Server-side time source
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic is encapsulated in services (see [`crate::application::services`])
//!
//! # Click Lifecycle
//!
//! 1. A redirect or explicit track call creates an [`entities::AffiliateClick`]
//! 2. A later conversion is attributed through a single conditional write
//!    ([`entities::ConversionUpdate`])
//! 3. Operators evaluate clicks with [`fraud::FraudPolicy`]
//! 4. Analytics read the accumulated history

pub mod clock;
pub mod entities;
pub mod fraud;
pub mod repositories;

//! Core domain entities representing the attribution data model.
//!
//! Entities are plain data structures. Behaviour lives in the application
//! services (see [`crate::application::services`]).
//!
//! # Entity Types
//!
//! - [`AffiliateClick`] - A tracked click and its optional conversion
//! - [`AffiliatePartner`] - A partner owning products
//! - [`Product`] - A financial product with its application URL
//! - [`CampaignParams`] - UTM parameters attached to links and clicks
//!
//! # Design Pattern
//!
//! Separate structs are used for creation (`NewClick`, `NewPartner`,
//! `NewProduct`) and for the conditional conversion write (`ConversionUpdate`).

pub mod campaign;
pub mod click;
pub mod partner;
pub mod product;

pub use campaign::CampaignParams;
pub use click::{
    AffiliateClick, Conversion, ConversionOutcome, ConversionUpdate, NewClick, UNKNOWN, is_unknown,
};
pub use partner::{AffiliatePartner, NewPartner};
pub use product::{NewProduct, Product, ProductType};

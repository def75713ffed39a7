//! Data Transfer Objects for API requests and responses.
//!
//! JSON field names are camelCase. Request bodies are validated with
//! `validator` before they reach the services.

pub mod clicks;
pub mod conversion;
pub mod health;
pub mod link;
pub mod pagination;
pub mod track;

//! Service layer for catalog use-cases.
//!
//! # Responsibility
//! - Route each catalog mutation through the command handler of its kind.
//! - Expose read paths without touching command history.

pub mod catalog_service;

pub use catalog_service::{CatalogService, HandledEntity, Handlers};

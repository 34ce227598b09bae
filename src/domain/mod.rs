//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM, no Axum).
//! Trait definitions, domain error types and the in-memory rules for
//! acquisitions and the yearly timeline.

pub mod acquisition;
pub mod errors;
pub mod figure;
pub mod repositories;
pub mod serde_helpers;
pub mod timeline;

pub use errors::DomainError;
pub use repositories::*;

//! Storefront
//!
//! Inventory-consistent cart, checkout and order lifecycle service.
//!
//! ## Features
//! - Product catalog with atomic stock reservation/release
//! - One shopping cart per user, priced live against the catalog
//! - All-or-nothing checkout that snapshots cart lines into an order
//! - Order status state machine with compensating stock release

use thiserror::Error;

pub mod api;
pub mod domain;
pub mod service;
pub mod store;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorefrontError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    InvalidInput(String),

    #[error("insufficient stock for '{product}': requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    #[error("cart has no items")]
    EmptyCart,

    #[error("cannot {action} {entity} in {current} state")]
    InvalidStateTransition {
        entity: &'static str,
        current: String,
        action: &'static str,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("forbidden")]
    Forbidden,
}

impl StorefrontError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

use thiserror::Error;
use uuid::Uuid;

use super::order::ProductType;
use super::status::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid transition from {current} to {requested}; valid next status: {}", valid_next_label(.current))]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    #[error("Invalid product type: {0}")]
    InvalidProductType(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid pricing for {product}: {reason}")]
    InvalidPricing { product: ProductType, reason: String },

    #[error("Role {0} requires a tenant binding")]
    MissingTenantBinding(&'static str),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Store {0} is not active")]
    InactiveStore(Uuid),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Order is already {0} and can no longer be changed")]
    IrreversibleState(OrderStatus),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Order {0} was modified concurrently")]
    Conflict(Uuid),

    #[error("Tracking code {0} is already taken")]
    DuplicateTrackingCode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

fn valid_next_label(current: &OrderStatus) -> String {
    match current.next() {
        Some(next) => next.to_string(),
        None => format!("none ({current} is terminal)"),
    }
}

//! Role-based visibility rules for orders, customers and stores.
//!
//! Callers arrive with claims verified upstream. `RawClaims` is the untyped
//! form; converting it to `Claims` rejects roles that lack their tenant id,
//! so every check below works on a well-formed role.

use uuid::Uuid;

use super::directory::Customer;
use super::errors::DomainError;
use super::order::{Order, OrderFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    StoreOwner { store_id: Uuid },
    Customer { customer_id: Uuid },
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::StoreOwner { .. } => "store_owner",
            Role::Customer { .. } => "customer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claims {
    pub role: Role,
    pub api_access_granted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RawClaims {
    pub role: String,
    pub api_access_granted: bool,
    pub customer_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
}

impl TryFrom<RawClaims> for Claims {
    type Error = DomainError;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let role = match raw.role.as_str() {
            "admin" => Role::Admin,
            "store_owner" => Role::StoreOwner {
                store_id: raw
                    .store_id
                    .ok_or(DomainError::MissingTenantBinding("store_owner"))?,
            },
            "customer" => Role::Customer {
                customer_id: raw
                    .customer_id
                    .ok_or(DomainError::MissingTenantBinding("customer"))?,
            },
            other => return Err(DomainError::InvalidRole(other.to_string())),
        };

        Ok(Claims {
            role,
            api_access_granted: raw.api_access_granted,
        })
    }
}

impl Claims {
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            api_access_granted: true,
        }
    }

    pub fn store_owner(store_id: Uuid) -> Self {
        Self {
            role: Role::StoreOwner { store_id },
            api_access_granted: true,
        }
    }

    pub fn customer(customer_id: Uuid) -> Self {
        Self {
            role: Role::Customer { customer_id },
            api_access_granted: true,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.api_access_granted && self.role == Role::Admin
    }

    /// Fails unless the caller has been granted API access at all.
    pub fn require_api_access(&self) -> Result<(), DomainError> {
        if self.api_access_granted {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "{} has not been granted API access",
                self.role.name()
            )))
        }
    }
}

fn owns_order(claims: &Claims, order: &Order) -> bool {
    if !claims.api_access_granted {
        return false;
    }
    match claims.role {
        Role::Admin => true,
        Role::StoreOwner { store_id } => order.store_id == Some(store_id),
        Role::Customer { customer_id } => order.customer_id == Some(customer_id),
    }
}

pub fn can_read_order(claims: &Claims, order: &Order) -> bool {
    owns_order(claims, order)
}

pub fn can_write_order(claims: &Claims, order: &Order) -> bool {
    owns_order(claims, order)
}

pub fn can_access_customer(claims: &Claims, customer: &Customer) -> bool {
    if !claims.api_access_granted {
        return false;
    }
    match claims.role {
        Role::Admin => true,
        Role::StoreOwner { store_id } => customer.store_id == Some(store_id),
        Role::Customer { customer_id } => customer.id == customer_id,
    }
}

pub fn can_access_store(claims: &Claims, store_id: Uuid) -> bool {
    if !claims.api_access_granted {
        return false;
    }
    match claims.role {
        Role::Admin => true,
        Role::StoreOwner { store_id: own } => own == store_id,
        Role::Customer { .. } => false,
    }
}

/// Tenant constraints always replace whatever the caller asked for.
pub fn derive_list_filter(
    claims: &Claims,
    requested: OrderFilter,
) -> Result<OrderFilter, DomainError> {
    claims.require_api_access()?;
    Ok(match claims.role {
        Role::Admin => requested,
        Role::StoreOwner { store_id } => OrderFilter {
            store_id: Some(store_id),
            ..requested
        },
        Role::Customer { customer_id } => OrderFilter {
            customer_id: Some(customer_id),
            ..requested
        },
    })
}

/// Customer and store references a new order may be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderScope {
    pub customer_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
}

pub fn scope_new_order(
    claims: &Claims,
    customer_id: Option<Uuid>,
    store_id: Option<Uuid>,
) -> Result<OrderScope, DomainError> {
    claims.require_api_access()?;
    Ok(match claims.role {
        Role::Admin => OrderScope {
            customer_id,
            store_id,
        },
        Role::StoreOwner { store_id: own } => OrderScope {
            customer_id,
            store_id: Some(own),
        },
        Role::Customer { customer_id: own } => OrderScope {
            customer_id: Some(own),
            store_id,
        },
    })
}

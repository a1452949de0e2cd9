use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::directory::{Customer, Store};
use crate::errors::AppError;

use super::claims::Caller;
use super::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub store_id: Option<Uuid>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            store_id: customer.store_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreResponse {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    /// Store-specific price override, absent when the public price applies.
    pub grading_price: Option<String>,
    pub mystery_pack_price: Option<String>,
}

impl From<Store> for StoreResponse {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            name: store.name,
            is_active: store.is_active,
            grading_price: store.grading_price.map(|p| p.to_string()),
            mystery_pack_price: store.mystery_pack_price.map(|p| p.to_string()),
        }
    }
}

/// GET /customers/{id}
#[utoipa::path(
    get,
    path = "/customers/{id}",
    params(
        ("id" = Uuid, Path, description = "Customer UUID"),
    ),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 403, description = "Customer belongs to another tenant"),
        (status = 404, description = "Customer not found"),
    ),
    tag = "directory"
)]
pub async fn get_customer(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();

    let customer = web::block(move || state.orders.get_customer(customer_id, &caller.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

/// GET /stores/{id}
#[utoipa::path(
    get,
    path = "/stores/{id}",
    params(
        ("id" = Uuid, Path, description = "Store UUID"),
    ),
    responses(
        (status = 200, description = "Store found", body = StoreResponse),
        (status = 403, description = "Store belongs to another tenant"),
        (status = 404, description = "Store not found"),
    ),
    tag = "directory"
)]
pub async fn get_store(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let store_id = path.into_inner();

    let store = web::block(move || state.orders.get_store(store_id, &caller.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(StoreResponse::from(store)))
}

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::PricingQuote;
use crate::errors::AppError;

use super::orders::{item_inputs, OrderItemRequest, OrderItemResponse};
use super::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PricingRequest {
    /// Quote with this store's price overrides; public prices otherwise.
    pub store_id: Option<Uuid>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PricingResponse {
    pub items: Vec<OrderItemResponse>,
    pub total: String,
    pub warnings: Vec<String>,
}

impl From<PricingQuote> for PricingResponse {
    fn from(quote: PricingQuote) -> Self {
        Self {
            items: quote.items.into_iter().map(Into::into).collect(),
            total: quote.total.to_string(),
            warnings: quote.warnings,
        }
    }
}

/// POST /pricing/calculate
///
/// Quotes a basket without creating an order.
#[utoipa::path(
    post,
    path = "/pricing/calculate",
    request_body = PricingRequest,
    responses(
        (status = 200, description = "Priced basket", body = PricingResponse),
        (status = 400, description = "Invalid items, pricing or inactive store"),
        (status = 404, description = "Store not found"),
    ),
    tag = "pricing"
)]
pub async fn calculate_pricing(
    state: web::Data<AppState>,
    body: web::Json<PricingRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let store_id = body.store_id;
    let items = item_inputs(body.items);

    let quote = web::block(move || state.orders.calculate_pricing(store_id, &items))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(PricingResponse::from(quote)))
}

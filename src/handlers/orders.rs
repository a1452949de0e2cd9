use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::{CreateOrder, ListOrders, OrderOutcome, TrackingView};
use crate::domain::order::{Order, OrderFilter, OrderItem, OrderItemInput, Page};
use crate::domain::status::OrderStatus;
use crate::domain::timeline::{StepState, TimelineEntry};
use crate::errors::AppError;

use super::claims::Caller;
use super::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    /// `grading` or `mysterypack`
    pub product_type: String,
    /// Fractional quantities are floored; must be at least 1.
    pub quantity: f64,
}

impl From<OrderItemRequest> for OrderItemInput {
    fn from(item: OrderItemRequest) -> Self {
        OrderItemInput {
            product_type: item.product_type,
            quantity: item.quantity,
        }
    }
}

pub(crate) fn item_inputs(items: Vec<OrderItemRequest>) -> Vec<OrderItemInput> {
    items.into_iter().map(OrderItemInput::from).collect()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    #[serde(default)]
    pub card_ids: Vec<Uuid>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub performed_by: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceItemsRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_type: String,
    pub quantity: i32,
    /// Decimal amounts are strings to avoid floating-point issues, e.g. "350"
    pub unit_price: String,
    pub subtotal: String,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_type: item.product_type.to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            subtotal: item.subtotal.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimelineEntryResponse {
    pub status: String,
    /// `completed`, `current` or `pending`
    pub state: String,
    pub title: String,
    pub description: String,
    pub date: Option<String>,
    pub estimated_date: Option<String>,
    pub performed_by: Option<String>,
}

fn state_name(state: StepState) -> &'static str {
    match state {
        StepState::Completed => "completed",
        StepState::Current => "current",
        StepState::Pending => "pending",
    }
}

impl From<TimelineEntry> for TimelineEntryResponse {
    fn from(entry: TimelineEntry) -> Self {
        Self {
            status: entry.status.to_string(),
            state: state_name(entry.state).to_string(),
            title: entry.title,
            description: entry.description,
            date: entry.date.map(|d| d.to_rfc3339()),
            estimated_date: entry.estimated_date.map(|d| d.to_rfc3339()),
            performed_by: entry.performed_by,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub tracking_code: String,
    pub customer_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub store_name: Option<String>,
    pub card_ids: Vec<Uuid>,
    pub items: Vec<OrderItemResponse>,
    pub total: String,
    pub status: String,
    pub timeline: Vec<TimelineEntryResponse>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            tracking_code: order.tracking_code,
            customer_id: order.customer_id,
            store_id: order.store_id,
            customer_name: order.customer_name,
            store_name: order.store_name,
            card_ids: order.card_ids,
            items: order.items.into_iter().map(Into::into).collect(),
            total: order.total.to_string(),
            status: order.status.to_string(),
            timeline: order.timeline.into_iter().map(Into::into).collect(),
            version: order.version,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

/// An order plus any tolerated problems (unlinked cards, skipped lines).
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithWarningsResponse {
    pub order: OrderResponse,
    pub warnings: Vec<String>,
}

impl From<OrderOutcome> for OrderWithWarningsResponse {
    fn from(outcome: OrderOutcome) -> Self {
        Self {
            order: outcome.order.into(),
            warnings: outcome.warnings,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingResponse {
    pub tracking_code: String,
    pub status: String,
    pub timeline: Vec<TimelineEntryResponse>,
}

impl From<TrackingView> for TrackingResponse {
    fn from(view: TrackingView) -> Self {
        Self {
            tracking_code: view.tracking_code,
            status: view.status.to_string(),
            timeline: view.timeline.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    pub status: Option<String>,
    /// Ignored for store owners, who only ever see their own store.
    pub store_id: Option<Uuid>,
    /// Ignored for customers, who only ever see their own orders.
    pub customer_id: Option<Uuid>,
    /// Case-insensitive match on customer name, tracking code or store name.
    pub search: Option<String>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    Page::DEFAULT_LIMIT
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub has_next: bool,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Prices the items server-side, stores the order as `pending` and links any
/// referenced cards. Card linking is best-effort: failures come back as
/// warnings next to the created order.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    params(
        ("X-Role" = String, Header, description = "admin, store_owner or customer"),
        ("X-Api-Access" = Option<bool>, Header, description = "Whether API access is granted"),
    ),
    responses(
        (status = 201, description = "Order created", body = OrderWithWarningsResponse),
        (status = 400, description = "Invalid items or inactive store"),
        (status = 401, description = "Missing or inconsistent caller identity"),
        (status = 403, description = "Caller may not create this order"),
        (status = 404, description = "Referenced customer or store not found"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = CreateOrder {
        customer_id: body.customer_id,
        store_id: body.store_id,
        card_ids: body.card_ids,
        items: item_inputs(body.items),
    };

    let outcome = web::block(move || state.orders.create_order(request, &caller.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderWithWarningsResponse::from(outcome)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 403, description = "Order belongs to another tenant"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || state.orders.get_order(order_id, &caller.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Returns a paginated list of orders visible to the caller. Tenant filters
/// are forced for store owners and customers.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("status" = Option<String>, Query, description = "Only orders in this status"),
        ("store_id" = Option<Uuid>, Query, description = "Only orders of this store (admins)"),
        ("customer_id" = Option<Uuid>, Query, description = "Only orders of this customer"),
        ("search" = Option<String>, Query, description = "Free-text search"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "Caller has no API access"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    caller: Caller,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = Page::new(params.page, params.limit);
    let status = params
        .status
        .as_deref()
        .map(|s| s.parse::<OrderStatus>())
        .transpose()?;
    let request = ListOrders {
        filter: OrderFilter {
            status,
            store_id: params.store_id,
            customer_id: params.customer_id,
        },
        search: params.search,
        page,
    };

    let result = web::block(move || state.orders.list_orders(request, &caller.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page: page.page,
        limit: page.limit,
        has_next: result.has_next,
    }))
}

/// PATCH /orders/{id}/status
///
/// Moves the order one step along its pipeline.
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Order belongs to another tenant"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Not the next status, or concurrent update"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();
    let status: OrderStatus = body.status.parse()?;

    let order = web::block(move || {
        state
            .orders
            .update_order_status(order_id, status, body.performed_by, &caller.0)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/items
#[utoipa::path(
    put,
    path = "/orders/{id}/items",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = ReplaceItemsRequest,
    responses(
        (status = 200, description = "Items replaced", body = OrderWithWarningsResponse),
        (status = 400, description = "Invalid items"),
        (status = 403, description = "Order belongs to another tenant"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is already being processed"),
    ),
    tag = "orders"
)]
pub async fn replace_order_items(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
    body: web::Json<ReplaceItemsRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let items = item_inputs(body.into_inner().items);

    let outcome = web::block(move || state.orders.replace_items(order_id, items, &caller.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderWithWarningsResponse::from(outcome)))
}

/// DELETE /orders/{id}
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 403, description = "Only administrators may delete orders"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is completed or later"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    web::block(move || state.orders.delete_order(order_id, &caller.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /tracking/{code}
///
/// Public progress lookup; needs no caller identity.
#[utoipa::path(
    get,
    path = "/tracking/{code}",
    params(
        ("code" = String, Path, description = "Tracking code printed on the order"),
    ),
    responses(
        (status = 200, description = "Order progress", body = TrackingResponse),
        (status = 404, description = "Unknown tracking code"),
    ),
    tag = "tracking"
)]
pub async fn track_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let code = path.into_inner();

    let view = web::block(move || state.orders.track(&code))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(TrackingResponse::from(view)))
}

pub mod claims;
pub mod directory;
pub mod orders;
pub mod pricing;

use utoipa::OpenApi;

use crate::application::order_service::OrderService;

/// Shared application state handed to every handler.
pub struct AppState {
    pub orders: OrderService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::get_order,
        orders::list_orders,
        orders::update_order_status,
        orders::replace_order_items,
        orders::delete_order,
        orders::track_order,
        pricing::calculate_pricing,
        directory::get_customer,
        directory::get_store,
    ),
    components(schemas(
        orders::OrderItemRequest,
        orders::CreateOrderRequest,
        orders::UpdateStatusRequest,
        orders::ReplaceItemsRequest,
        orders::OrderItemResponse,
        orders::TimelineEntryResponse,
        orders::OrderResponse,
        orders::OrderWithWarningsResponse,
        orders::ListOrdersResponse,
        orders::TrackingResponse,
        pricing::PricingRequest,
        pricing::PricingResponse,
        directory::CustomerResponse,
        directory::StoreResponse,
    )),
    tags(
        (name = "orders", description = "Grading order lifecycle"),
        (name = "tracking", description = "Public order progress"),
        (name = "pricing", description = "Basket quotes"),
        (name = "directory", description = "Customers and stores"),
    )
)]
pub struct ApiDoc;

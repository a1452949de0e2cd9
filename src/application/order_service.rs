use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::access::{self, Claims, Role};
use crate::domain::directory::{Customer, Store};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    NewOrder, Order, OrderChange, OrderFilter, OrderItem, OrderItemInput, OrderPage, Page,
};
use crate::domain::ports::{CardLinker, DirectoryLookup, OrderRepository};
use crate::domain::pricing::{self, Pricing, TenantPricing};
use crate::domain::status::{OrderStatus, StateMachine};
use crate::domain::timeline::TimelineEntry;

const TRACKING_CODE_LEN: usize = 8;
const TRACKING_CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct CreateOrder {
    pub customer_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub card_ids: Vec<Uuid>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Default)]
pub struct ListOrders {
    pub filter: OrderFilter,
    pub search: Option<String>,
    pub page: Page,
}

/// A stored order plus anything that was tolerated on the way.
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub order: Order,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PricingQuote {
    pub items: Vec<OrderItem>,
    pub total: BigDecimal,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TrackingView {
    pub tracking_code: String,
    pub status: OrderStatus,
    pub timeline: Vec<TimelineEntry>,
}

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    directory: Arc<dyn DirectoryLookup>,
    cards: Arc<dyn CardLinker>,
    pricing: Pricing,
    machine: StateMachine,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        directory: Arc<dyn DirectoryLookup>,
        cards: Arc<dyn CardLinker>,
    ) -> Self {
        Self {
            orders,
            directory,
            cards,
            pricing: Pricing::default(),
            machine: StateMachine::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn create_order(
        &self,
        request: CreateOrder,
        claims: &Claims,
    ) -> Result<OrderOutcome, DomainError> {
        let scope = access::scope_new_order(claims, request.customer_id, request.store_id)?;
        if request.items.is_empty() {
            return Err(DomainError::Validation(
                "an order needs at least one item".to_string(),
            ));
        }

        let store = scope
            .store_id
            .map(|id| self.active_store(id))
            .transpose()?;
        let customer = scope
            .customer_id
            .map(|id| self.customer(id))
            .transpose()?;

        if let (Role::StoreOwner { store_id }, Some(customer)) = (claims.role, &customer) {
            if customer.store_id.is_some_and(|own| own != store_id) {
                return Err(DomainError::Forbidden(format!(
                    "customer {} belongs to another store",
                    customer.id
                )));
            }
        }

        let tenant = store.as_ref().map(TenantPricing::from);
        let items = self.price_items(&request.items, tenant.as_ref())?;
        let mut warnings = Vec::new();
        let total = self.total(&items, &mut warnings)?;

        let now = Utc::now();
        let order = self.insert_order(NewOrder {
            tracking_code: new_tracking_code(),
            customer_id: scope.customer_id,
            store_id: scope.store_id,
            customer_name: customer.map(|c| c.name),
            store_name: store.map(|s| s.name),
            card_ids: request.card_ids.clone(),
            items,
            total,
            timeline: self.machine.timeline().generate_initial(now),
            created_at: now,
        })?;
        log::info!(
            "Created order {} ({}) total={}",
            order.id,
            order.tracking_code,
            order.total
        );

        if !request.card_ids.is_empty() {
            warnings.extend(self.link_cards(order.id, &request.card_ids));
        }

        Ok(OrderOutcome { order, warnings })
    }

    pub fn get_order(&self, id: Uuid, claims: &Claims) -> Result<Order, DomainError> {
        let order = self.load(id)?;
        if !access::can_read_order(claims, &order) {
            return Err(DomainError::Forbidden(format!("order {id} is not visible")));
        }
        Ok(order)
    }

    pub fn list_orders(
        &self,
        request: ListOrders,
        claims: &Claims,
    ) -> Result<OrderPage, DomainError> {
        let filter = access::derive_list_filter(claims, request.filter)?;
        let page = request.page;

        let needle = request
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let Some(needle) = needle else {
            let result = self.orders.query(&filter, Some(page))?;
            let has_next = page.offset() + (result.items.len() as i64) < result.total;
            return Ok(OrderPage {
                items: result.items,
                total: result.total,
                has_next,
            });
        };

        // Cached display fields are not indexed, so search runs on the
        // fetched rows and pagination follows it.
        let matches: Vec<Order> = self
            .orders
            .query(&filter, None)?
            .items
            .into_iter()
            .filter(|order| matches_search(order, &needle))
            .collect();
        let total = matches.len() as i64;
        let items: Vec<Order> = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        let has_next = page.offset() + (items.len() as i64) < total;

        Ok(OrderPage {
            items,
            total,
            has_next,
        })
    }

    pub fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        performed_by: Option<String>,
        claims: &Claims,
    ) -> Result<Order, DomainError> {
        let order = self.load_writable(id, claims)?;
        let from = order.status;
        let updated =
            self.machine
                .apply_transition(order, status, performed_by.as_deref(), Utc::now())?;

        let stored = self.orders.update(
            &updated,
            OrderChange::StatusChanged {
                from,
                to: status,
                performed_by,
            },
        )?;
        log::info!("Order {id} moved from {from} to {status}");
        Ok(stored)
    }

    /// Replaces the line items of an order that has not entered processing
    /// yet and recomputes its total.
    pub fn replace_items(
        &self,
        id: Uuid,
        items: Vec<OrderItemInput>,
        claims: &Claims,
    ) -> Result<OrderOutcome, DomainError> {
        let mut order = self.load_writable(id, claims)?;
        if !order.status.is_before(OrderStatus::Processing) {
            return Err(DomainError::IrreversibleState(order.status));
        }
        if items.is_empty() {
            return Err(DomainError::Validation(
                "an order needs at least one item".to_string(),
            ));
        }

        let tenant = order
            .store_id
            .map(|store_id| self.active_store(store_id))
            .transpose()?
            .as_ref()
            .map(TenantPricing::from);
        let items = self.price_items(&items, tenant.as_ref())?;
        let mut warnings = Vec::new();
        order.total = self.total(&items, &mut warnings)?;
        order.items = items;
        order.updated_at = Utc::now();

        let order = self.orders.update(&order, OrderChange::ItemsReplaced)?;
        Ok(OrderOutcome { order, warnings })
    }

    pub fn delete_order(&self, id: Uuid, claims: &Claims) -> Result<(), DomainError> {
        if !claims.is_admin() {
            return Err(DomainError::Forbidden(
                "only administrators may delete orders".to_string(),
            ));
        }
        let order = self.load(id)?;
        if !order.status.is_before(OrderStatus::Completed) {
            return Err(DomainError::IrreversibleState(order.status));
        }
        self.orders.delete(&order)?;
        log::info!("Deleted order {id} in status {}", order.status);
        Ok(())
    }

    pub fn calculate_pricing(
        &self,
        store_id: Option<Uuid>,
        items: &[OrderItemInput],
    ) -> Result<PricingQuote, DomainError> {
        let store = store_id.map(|id| self.active_store(id)).transpose()?;
        let tenant = store.as_ref().map(TenantPricing::from);
        let items = self.price_items(items, tenant.as_ref())?;
        let mut warnings = Vec::new();
        let total = self.total(&items, &mut warnings)?;
        Ok(PricingQuote {
            items,
            total,
            warnings,
        })
    }

    /// Public lookup by tracking code; exposes progress only.
    pub fn track(&self, tracking_code: &str) -> Result<TrackingView, DomainError> {
        let code = tracking_code.trim().to_uppercase();
        let order = self
            .orders
            .find_by_tracking_code(&code)?
            .ok_or_else(|| DomainError::not_found("order", &code))?;
        Ok(TrackingView {
            tracking_code: order.tracking_code,
            status: order.status,
            timeline: order.timeline,
        })
    }

    pub fn get_customer(&self, id: Uuid, claims: &Claims) -> Result<Customer, DomainError> {
        let customer = self.customer(id)?;
        if !access::can_access_customer(claims, &customer) {
            return Err(DomainError::Forbidden(format!("customer {id} is not visible")));
        }
        Ok(customer)
    }

    pub fn get_store(&self, id: Uuid, claims: &Claims) -> Result<Store, DomainError> {
        if !access::can_access_store(claims, id) {
            return Err(DomainError::Forbidden(format!("store {id} is not visible")));
        }
        self.directory
            .store_by_id(id)?
            .ok_or_else(|| DomainError::not_found("store", id))
    }

    fn load(&self, id: Uuid) -> Result<Order, DomainError> {
        self.orders
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found("order", id))
    }

    fn load_writable(&self, id: Uuid, claims: &Claims) -> Result<Order, DomainError> {
        let order = self.load(id)?;
        if !access::can_write_order(claims, &order) {
            return Err(DomainError::Forbidden(format!(
                "order {id} cannot be modified by this caller"
            )));
        }
        Ok(order)
    }

    fn active_store(&self, id: Uuid) -> Result<Store, DomainError> {
        let store = self
            .directory
            .store_by_id(id)?
            .ok_or_else(|| DomainError::not_found("store", id))?;
        if !store.is_active {
            return Err(DomainError::InactiveStore(id));
        }
        Ok(store)
    }

    fn customer(&self, id: Uuid) -> Result<Customer, DomainError> {
        self.directory
            .customer_by_id(id)?
            .ok_or_else(|| DomainError::not_found("customer", id))
    }

    fn price_items(
        &self,
        items: &[OrderItemInput],
        tenant: Option<&TenantPricing>,
    ) -> Result<Vec<OrderItem>, DomainError> {
        items
            .iter()
            .map(|item| {
                self.pricing
                    .build_line_item(&item.product_type, item.quantity, tenant)
            })
            .collect()
    }

    fn total(
        &self,
        items: &[OrderItem],
        warnings: &mut Vec<String>,
    ) -> Result<BigDecimal, DomainError> {
        let priced = self.pricing.total(items);
        pricing::ensure_storable(&priced.amount)?;
        warnings.extend(
            priced
                .skipped
                .iter()
                .map(|index| format!("item {index} has a corrupt subtotal and was not counted")),
        );
        Ok(priced.amount)
    }

    /// Stores the order, drawing a fresh tracking code whenever the store
    /// reports the current one as taken.
    fn insert_order(&self, mut order: NewOrder) -> Result<Order, DomainError> {
        for _ in 0..TRACKING_CODE_ATTEMPTS {
            match self.orders.create(order.clone()) {
                Err(DomainError::DuplicateTrackingCode(code)) => {
                    log::debug!("Tracking code {code} already taken, retrying");
                    order.tracking_code = new_tracking_code();
                }
                result => return result,
            }
        }
        Err(DomainError::Internal(
            "could not allocate a unique tracking code".to_string(),
        ))
    }

    fn link_cards(&self, order_id: Uuid, card_ids: &[Uuid]) -> Vec<String> {
        match self.cards.attach_cards_to_order(order_id, card_ids) {
            Ok(report) => report
                .missing
                .iter()
                .map(|card_id| {
                    log::warn!("Card {card_id} could not be linked to order {order_id}");
                    format!("card {card_id} was not found and is not linked to the order")
                })
                .collect(),
            Err(e) => {
                log::warn!("Linking cards to order {order_id} failed: {e}");
                vec![format!("cards could not be linked to the order: {e}")]
            }
        }
    }
}

fn new_tracking_code() -> String {
    Uuid::new_v4().simple().to_string()[..TRACKING_CODE_LEN].to_uppercase()
}

fn matches_search(order: &Order, needle: &str) -> bool {
    [
        order.customer_name.as_deref(),
        Some(order.tracking_code.as_str()),
        order.store_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

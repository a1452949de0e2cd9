use uuid::Uuid;

use super::directory::{Customer, Store};
use super::errors::DomainError;
use super::order::{ListResult, NewOrder, Order, OrderChange, OrderFilter, Page};

pub trait OrderRepository: Send + Sync + 'static {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
    fn find_by_tracking_code(&self, code: &str) -> Result<Option<Order>, DomainError>;
    /// `page: None` returns every match.
    fn query(&self, filter: &OrderFilter, page: Option<Page>) -> Result<ListResult, DomainError>;
    /// Writes `order` only if the stored version still equals
    /// `order.version`; fails with `Conflict` otherwise.
    fn update(&self, order: &Order, change: OrderChange) -> Result<Order, DomainError>;
    fn delete(&self, order: &Order) -> Result<(), DomainError>;
}

pub trait DirectoryLookup: Send + Sync + 'static {
    fn store_by_id(&self, id: Uuid) -> Result<Option<Store>, DomainError>;
    fn customer_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardLinkReport {
    pub attached: Vec<Uuid>,
    pub missing: Vec<Uuid>,
}

/// Links cards to orders. Not transactional with order writes.
pub trait CardLinker: Send + Sync + 'static {
    fn attach_cards_to_order(
        &self,
        order_id: Uuid,
        card_ids: &[Uuid],
    ) -> Result<CardLinkReport, DomainError>;
}

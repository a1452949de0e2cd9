use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::domain::directory::{Customer, Store};
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, NewOrder, Order, OrderChange, OrderFilter, Page};
use crate::domain::ports::{CardLinkReport, CardLinker, DirectoryLookup, OrderRepository};
use crate::domain::status::OrderStatus;

#[derive(Default)]
struct State {
    orders: HashMap<Uuid, Order>,
    stores: HashMap<Uuid, Store>,
    customers: HashMap<Uuid, Customer>,
    /// card id -> linked order
    cards: HashMap<Uuid, Option<Uuid>>,
}

/// Process-local storage backend. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
    }

    fn seed(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_store(&self, store: Store) {
        self.seed().stores.insert(store.id, store);
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.seed().customers.insert(customer.id, customer);
    }

    pub fn insert_card(&self, card_id: Uuid) {
        self.seed().cards.insert(card_id, None);
    }

    /// Order a card is linked to, if any.
    pub fn card_order(&self, card_id: Uuid) -> Option<Uuid> {
        self.seed().cards.get(&card_id).copied().flatten()
    }
}

fn matches(filter: &OrderFilter, order: &Order) -> bool {
    filter.status.map_or(true, |s| order.status == s)
        && filter.store_id.map_or(true, |s| order.store_id == Some(s))
        && filter.customer_id.map_or(true, |c| order.customer_id == Some(c))
}

impl OrderRepository for InMemoryStore {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let mut state = self.state()?;
        if state
            .orders
            .values()
            .any(|o| o.tracking_code == order.tracking_code)
        {
            return Err(DomainError::DuplicateTrackingCode(order.tracking_code));
        }
        let stored = Order {
            id: Uuid::new_v4(),
            tracking_code: order.tracking_code,
            customer_id: order.customer_id,
            store_id: order.store_id,
            customer_name: order.customer_name,
            store_name: order.store_name,
            card_ids: order.card_ids,
            items: order.items,
            total: order.total,
            status: OrderStatus::Pending,
            timeline: order.timeline,
            version: 1,
            created_at: order.created_at,
            updated_at: order.created_at,
        };
        state.orders.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        Ok(self.state()?.orders.get(&id).cloned())
    }

    fn find_by_tracking_code(&self, code: &str) -> Result<Option<Order>, DomainError> {
        Ok(self
            .state()?
            .orders
            .values()
            .find(|o| o.tracking_code == code)
            .cloned())
    }

    fn query(&self, filter: &OrderFilter, page: Option<Page>) -> Result<ListResult, DomainError> {
        let mut found: Vec<Order> = self
            .state()?
            .orders
            .values()
            .filter(|o| matches(filter, o))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = found.len() as i64;
        let items = match page {
            Some(page) => found
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect(),
            None => found,
        };
        Ok(ListResult { items, total })
    }

    fn update(&self, order: &Order, _change: OrderChange) -> Result<Order, DomainError> {
        let mut state = self.state()?;
        let current = state
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| DomainError::not_found("order", order.id))?;
        if current.version != order.version {
            return Err(DomainError::Conflict(order.id));
        }
        *current = Order {
            version: order.version + 1,
            ..order.clone()
        };
        Ok(current.clone())
    }

    fn delete(&self, order: &Order) -> Result<(), DomainError> {
        let mut state = self.state()?;
        let current = state
            .orders
            .get(&order.id)
            .ok_or_else(|| DomainError::not_found("order", order.id))?;
        if current.version != order.version {
            return Err(DomainError::Conflict(order.id));
        }
        state.orders.remove(&order.id);
        for linked in state.cards.values_mut() {
            if *linked == Some(order.id) {
                *linked = None;
            }
        }
        Ok(())
    }
}

impl DirectoryLookup for InMemoryStore {
    fn store_by_id(&self, id: Uuid) -> Result<Option<Store>, DomainError> {
        Ok(self.state()?.stores.get(&id).cloned())
    }

    fn customer_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        Ok(self.state()?.customers.get(&id).cloned())
    }
}

impl CardLinker for InMemoryStore {
    fn attach_cards_to_order(
        &self,
        order_id: Uuid,
        card_ids: &[Uuid],
    ) -> Result<CardLinkReport, DomainError> {
        let mut state = self.state()?;
        let mut report = CardLinkReport::default();
        for card_id in card_ids {
            match state.cards.get_mut(card_id) {
                Some(linked) => {
                    *linked = Some(order_id);
                    report.attached.push(*card_id);
                }
                None => report.missing.push(*card_id),
            }
        }
        Ok(report)
    }
}

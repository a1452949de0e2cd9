use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::status::OrderStatus;
use super::timeline::TimelineEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Grading,
    #[serde(rename = "mysterypack")]
    MysteryPack,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Grading => "grading",
            ProductType::MysteryPack => "mysterypack",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grading" => Ok(ProductType::Grading),
            "mysterypack" => Ok(ProductType::MysteryPack),
            other => Err(DomainError::InvalidProductType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_type: ProductType,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
}

/// Line item as requested by a caller, before pricing.
#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_type: String,
    pub quantity: f64,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub tracking_code: String,
    pub customer_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub store_name: Option<String>,
    pub card_ids: Vec<Uuid>,
    pub items: Vec<OrderItem>,
    pub total: BigDecimal,
    pub status: OrderStatus,
    pub timeline: Vec<TimelineEntry>,
    /// Bumped by storage on every write; used for compare-and-swap updates.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fully priced order ready to be stored; storage assigns the id.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub tracking_code: String,
    pub customer_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub store_name: Option<String>,
    pub card_ids: Vec<Uuid>,
    pub items: Vec<OrderItem>,
    pub total: BigDecimal,
    pub timeline: Vec<TimelineEntry>,
    pub created_at: DateTime<Utc>,
}

/// What a stored update changed; recorded alongside the write.
#[derive(Debug, Clone)]
pub enum OrderChange {
    StatusChanged {
        from: OrderStatus,
        to: OrderStatus,
        performed_by: Option<String>,
    },
    ItemsReplaced,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub store_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub total: i64,
    pub has_next: bool,
}

#[cfg(test)]
pub(crate) fn test_order(
    machine: &super::status::StateMachine,
    now: DateTime<Utc>,
) -> Order {
    Order {
        id: Uuid::new_v4(),
        tracking_code: "ABCD1234".to_string(),
        customer_id: None,
        store_id: None,
        customer_name: None,
        store_name: None,
        card_ids: vec![],
        items: vec![],
        total: BigDecimal::from(0),
        status: OrderStatus::Pending,
        timeline: machine.timeline().generate_initial(now),
        version: 1,
        created_at: now,
        updated_at: now,
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::order::Order;
use super::timeline::TimelineGenerator;

/// Order lifecycle. The pipeline is linear: every status has at most one
/// successor and `Delivered` has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Received,
    Processing,
    Encapsulated,
    Completed,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Pipeline order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Received,
        OrderStatus::Processing,
        OrderStatus::Encapsulated,
        OrderStatus::Completed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Received => "received",
            OrderStatus::Processing => "processing",
            OrderStatus::Encapsulated => "encapsulated",
            OrderStatus::Completed => "completed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
        }
    }

    pub fn position(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<OrderStatus> {
        Self::ALL.get(self.position() + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    pub fn is_before(&self, other: OrderStatus) -> bool {
        self.position() < other.position()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown order status '{s}'")))
    }
}

/// True iff `requested` is the single status reachable from `current`.
pub fn validate_transition(current: OrderStatus, requested: OrderStatus) -> bool {
    current.next() == Some(requested)
}

/// Applies validated status changes to orders. Persisting the result is the
/// caller's job.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    timeline: TimelineGenerator,
}

impl StateMachine {
    pub fn new(timeline: TimelineGenerator) -> Self {
        Self { timeline }
    }

    pub fn timeline(&self) -> &TimelineGenerator {
        &self.timeline
    }

    pub fn apply_transition(
        &self,
        mut order: Order,
        requested: OrderStatus,
        performed_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Order, DomainError> {
        if !validate_transition(order.status, requested) {
            return Err(DomainError::InvalidTransition {
                current: order.status,
                requested,
            });
        }

        self.timeline
            .update(&mut order.timeline, requested, performed_by, now);
        order.status = requested;
        order.updated_at = now;
        Ok(order)
    }
}

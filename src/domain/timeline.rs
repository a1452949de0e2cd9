use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::status::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub state: StepState,
    pub title: String,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
    pub estimated_date: Option<DateTime<Utc>>,
    pub performed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMetadata {
    pub title: String,
    pub description: String,
    /// Nominal lead time from order creation.
    pub estimated_days: i64,
}

impl StatusMetadata {
    fn new(title: &str, description: &str, estimated_days: i64) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            estimated_days,
        }
    }
}

/// Per-status step metadata, indexed in pipeline order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCatalog {
    entries: [StatusMetadata; 7],
}

impl StatusCatalog {
    pub fn new(entries: [StatusMetadata; 7]) -> Self {
        Self { entries }
    }

    pub fn metadata(&self, status: OrderStatus) -> &StatusMetadata {
        &self.entries[status.position()]
    }
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::new([
            StatusMetadata::new("Order placed", "We have registered your order.", 0),
            StatusMetadata::new("Received", "Your cards arrived at our facility.", 1),
            StatusMetadata::new("Processing", "Your cards are being graded.", 7),
            StatusMetadata::new("Encapsulated", "Your cards have been slabbed.", 10),
            StatusMetadata::new("Completed", "Grading is finished and ready to ship.", 12),
            StatusMetadata::new("Shipped", "Your order is on its way.", 14),
            StatusMetadata::new("Delivered", "Your order has been delivered.", 16),
        ])
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimelineGenerator {
    catalog: StatusCatalog,
}

impl TimelineGenerator {
    pub fn new(catalog: StatusCatalog) -> Self {
        Self { catalog }
    }

    /// One entry per status; the first is current, the rest pending with an
    /// estimated date derived from the catalog lead time.
    pub fn generate_initial(&self, now: DateTime<Utc>) -> Vec<TimelineEntry> {
        OrderStatus::ALL
            .into_iter()
            .map(|status| {
                let meta = self.catalog.metadata(status);
                let first = status == OrderStatus::Pending;
                TimelineEntry {
                    status,
                    state: if first {
                        StepState::Current
                    } else {
                        StepState::Pending
                    },
                    title: meta.title.clone(),
                    description: meta.description.clone(),
                    date: first.then_some(now),
                    estimated_date: (!first).then(|| now + Duration::days(meta.estimated_days)),
                    performed_by: None,
                }
            })
            .collect()
    }

    /// Completes the step that is currently in progress and makes
    /// `new_status` the current one (or completes it when it is terminal).
    /// Steps already reflecting `new_status` are left as they are.
    pub fn update(
        &self,
        timeline: &mut [TimelineEntry],
        new_status: OrderStatus,
        performed_by: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let target_state = if new_status.is_terminal() {
            StepState::Completed
        } else {
            StepState::Current
        };

        for entry in timeline.iter_mut() {
            if entry.status == new_status {
                if entry.state != target_state && entry.state != StepState::Completed {
                    mark(entry, target_state, performed_by, now);
                }
            } else if entry.state == StepState::Current && entry.status.is_before(new_status) {
                mark(entry, StepState::Completed, performed_by, now);
            }
        }
    }
}

fn mark(entry: &mut TimelineEntry, state: StepState, performed_by: Option<&str>, now: DateTime<Utc>) {
    entry.state = state;
    entry.date = Some(now);
    entry.performed_by = performed_by.map(str::to_string);
}

//! Lifecycle events recorded next to each order write.
//!
//! Rows land in `order_outbox` inside the same transaction as the order
//! change; Debezium's EventRouter relays them, deriving the Kafka topic from
//! `aggregate_type`.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::order::{Order, OrderChange, OrderItem};

use super::models::NewOutboxEventRow;

pub const AGGREGATE_TYPE: &str = "Order";

fn item_payloads(items: &[OrderItem]) -> Vec<Value> {
    items
        .iter()
        .map(|item| {
            json!({
                "product_type": item.product_type.as_str(),
                "quantity": item.quantity,
                "unit_price": item.unit_price.to_string(),
                "subtotal": item.subtotal.to_string()
            })
        })
        .collect()
}

fn event(order: &Order, event_type: &str, payload: Value) -> NewOutboxEventRow {
    NewOutboxEventRow {
        id: Uuid::new_v4(),
        aggregate_type: AGGREGATE_TYPE.to_string(),
        aggregate_id: order.id.to_string(),
        event_type: event_type.to_string(),
        payload,
    }
}

pub fn order_created(order: &Order) -> NewOutboxEventRow {
    event(
        order,
        "OrderCreated",
        json!({
            "order_id": order.id,
            "tracking_code": order.tracking_code,
            "customer_id": order.customer_id,
            "store_id": order.store_id,
            "status": order.status.as_str(),
            "total": order.total.to_string(),
            "items": item_payloads(&order.items)
        }),
    )
}

pub fn order_changed(order: &Order, change: &OrderChange) -> NewOutboxEventRow {
    match change {
        OrderChange::StatusChanged {
            from,
            to,
            performed_by,
        } => event(
            order,
            "OrderStatusChanged",
            json!({
                "order_id": order.id,
                "tracking_code": order.tracking_code,
                "from": from.as_str(),
                "status": to.as_str(),
                "performed_by": performed_by
            }),
        ),
        OrderChange::ItemsReplaced => event(
            order,
            "OrderItemsReplaced",
            json!({
                "order_id": order.id,
                "total": order.total.to_string(),
                "items": item_payloads(&order.items)
            }),
        ),
    }
}

pub fn order_deleted(order: &Order) -> NewOutboxEventRow {
    event(
        order,
        "OrderDeleted",
        json!({
            "order_id": order.id,
            "tracking_code": order.tracking_code,
            "status": order.status.as_str()
        }),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::order::test_order;
    use crate::domain::status::{OrderStatus, StateMachine};

    #[test]
    fn status_change_event_carries_both_statuses() {
        let order = test_order(&StateMachine::default(), Utc::now());
        let row = order_changed(
            &order,
            &OrderChange::StatusChanged {
                from: OrderStatus::Pending,
                to: OrderStatus::Received,
                performed_by: Some("ops".to_string()),
            },
        );

        assert_eq!(row.aggregate_type, "Order");
        assert_eq!(row.aggregate_id, order.id.to_string());
        assert_eq!(row.event_type, "OrderStatusChanged");
        assert_eq!(row.payload["from"], "pending");
        assert_eq!(row.payload["status"], "received");
        assert_eq!(row.payload["performed_by"], "ops");
    }

    #[test]
    fn created_event_serialises_money_as_strings() {
        let mut order = test_order(&StateMachine::default(), Utc::now());
        order.items = vec![crate::domain::pricing::Pricing::default()
            .build_line_item("grading", 2.0, None)
            .unwrap()];
        order.total = order.items[0].subtotal.clone();

        let row = order_created(&order);

        assert_eq!(row.event_type, "OrderCreated");
        assert_eq!(row.payload["total"], "700");
        assert_eq!(row.payload["items"][0]["product_type"], "grading");
        assert_eq!(row.payload["items"][0]["unit_price"], "350");
    }
}

use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, NewOrder, Order, OrderChange, OrderFilter, OrderItem, Page};
use crate::domain::ports::OrderRepository;
use crate::domain::status::OrderStatus;
use crate::domain::timeline::TimelineEntry;
use crate::schema::{order_items, order_outbox, orders};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};
use super::outbox;

const TRACKING_CODE_CONSTRAINT: &str = "orders_tracking_code_key";

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("timeline encoding: {e}"))
    }
}

// ── Row mapping ──────────────────────────────────────────────────────────────

fn to_item(row: OrderItemRow) -> Result<OrderItem, DomainError> {
    let product_type = row.product_type.parse().map_err(|_| {
        DomainError::Internal(format!(
            "order item {} has unknown product type '{}'",
            row.id, row.product_type
        ))
    })?;
    Ok(OrderItem {
        product_type,
        quantity: row.quantity,
        unit_price: row.unit_price,
        subtotal: row.subtotal,
    })
}

fn to_order(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
    let status: OrderStatus = row.status.parse().map_err(|_| {
        DomainError::Internal(format!("order {} has unknown status '{}'", row.id, row.status))
    })?;
    let timeline: Vec<TimelineEntry> = serde_json::from_value(row.timeline)?;

    Ok(Order {
        id: row.id,
        tracking_code: row.tracking_code,
        customer_id: row.customer_id,
        store_id: row.store_id,
        customer_name: row.customer_name,
        store_name: row.store_name,
        card_ids: row.card_ids,
        items: items.into_iter().map(to_item).collect::<Result<_, _>>()?,
        total: row.total,
        status,
        timeline,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn insert_items(
    conn: &mut PgConnection,
    order_id: Uuid,
    items: &[OrderItem],
) -> Result<(), DomainError> {
    let rows: Vec<NewOrderItemRow> = items
        .iter()
        .enumerate()
        .map(|(position, item)| NewOrderItemRow {
            id: Uuid::new_v4(),
            order_id,
            position: position as i32,
            product_type: item.product_type.as_str().to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price.clone(),
            subtotal: item.subtotal.clone(),
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(order_items::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

fn load_one(conn: &mut PgConnection, row: Option<OrderRow>) -> Result<Option<Order>, DomainError> {
    let Some(row) = row else {
        return Ok(None);
    };
    let items = OrderItemRow::belonging_to(&row)
        .select(OrderItemRow::as_select())
        .order(order_items::position.asc())
        .load::<OrderItemRow>(conn)?;
    to_order(row, items).map(Some)
}

fn filtered(filter: &OrderFilter) -> orders::BoxedQuery<'static, Pg> {
    let mut query = orders::table.into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status.as_str()));
    }
    if let Some(store_id) = filter.store_id {
        query = query.filter(orders::store_id.eq(store_id));
    }
    if let Some(customer_id) = filter.customer_id {
        query = query.filter(orders::customer_id.eq(customer_id));
    }
    query
}

/// Why a version-guarded write touched no row.
fn stale_or_missing(conn: &mut PgConnection, id: Uuid) -> Result<DomainError, DomainError> {
    let exists: bool = diesel::select(diesel::dsl::exists(
        orders::table.filter(orders::id.eq(id)),
    ))
    .get_result(conn)?;
    Ok(if exists {
        DomainError::Conflict(id)
    } else {
        DomainError::not_found("order", id)
    })
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order
            let order_id = Uuid::new_v4();
            diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    tracking_code: order.tracking_code.clone(),
                    customer_id: order.customer_id,
                    store_id: order.store_id,
                    customer_name: order.customer_name.clone(),
                    store_name: order.store_name.clone(),
                    card_ids: order.card_ids.clone(),
                    status: OrderStatus::Pending.as_str().to_string(),
                    timeline: serde_json::to_value(&order.timeline)?,
                    total: order.total.clone(),
                    version: 1,
                    created_at: order.created_at,
                    updated_at: order.created_at,
                })
                .execute(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if info.constraint_name() == Some(TRACKING_CODE_CONSTRAINT) =>
                    {
                        DomainError::DuplicateTrackingCode(order.tracking_code.clone())
                    }
                    other => other.into(),
                })?;

            // 2. Insert line items
            insert_items(conn, order_id, &order.items)?;

            let stored = Order {
                id: order_id,
                tracking_code: order.tracking_code.clone(),
                customer_id: order.customer_id,
                store_id: order.store_id,
                customer_name: order.customer_name.clone(),
                store_name: order.store_name.clone(),
                card_ids: order.card_ids.clone(),
                items: order.items.clone(),
                total: order.total.clone(),
                status: OrderStatus::Pending,
                timeline: order.timeline.clone(),
                version: 1,
                created_at: order.created_at,
                updated_at: order.created_at,
            };

            // 3. Insert outbox event in the same transaction.
            diesel::insert_into(order_outbox::table)
                .values(&outbox::order_created(&stored))
                .execute(conn)?;

            Ok(stored)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        load_one(&mut conn, row)
    }

    fn find_by_tracking_code(&self, code: &str) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::tracking_code.eq(code))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        load_one(&mut conn, row)
    }

    fn query(&self, filter: &OrderFilter, page: Option<Page>) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = filtered(filter).count().get_result(conn)?;

            let mut query = filtered(filter)
                .select(OrderRow::as_select())
                .order((orders::created_at.desc(), orders::id.asc()));
            if let Some(page) = page {
                query = query.limit(page.limit).offset(page.offset());
            }
            let rows: Vec<OrderRow> = query.load(conn)?;

            let items = OrderItemRow::belonging_to(&rows)
                .select(OrderItemRow::as_select())
                .order(order_items::position.asc())
                .load::<OrderItemRow>(conn)?
                .grouped_by(&rows);

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .zip(items)
                    .map(|(row, items)| to_order(row, items))
                    .collect::<Result<_, _>>()?,
                total,
            })
        })
    }

    fn update(&self, order: &Order, change: OrderChange) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let next_version = order.version + 1;
            let updated = diesel::update(
                orders::table
                    .filter(orders::id.eq(order.id))
                    .filter(orders::version.eq(order.version)),
            )
            .set((
                orders::status.eq(order.status.as_str()),
                orders::timeline.eq(serde_json::to_value(&order.timeline)?),
                orders::total.eq(order.total.clone()),
                orders::card_ids.eq(order.card_ids.clone()),
                orders::version.eq(next_version),
                orders::updated_at.eq(order.updated_at),
            ))
            .execute(conn)?;

            if updated == 0 {
                return Err(stale_or_missing(conn, order.id)?);
            }

            if matches!(change, OrderChange::ItemsReplaced) {
                diesel::delete(order_items::table.filter(order_items::order_id.eq(order.id)))
                    .execute(conn)?;
                insert_items(conn, order.id, &order.items)?;
            }

            let stored = Order {
                version: next_version,
                ..order.clone()
            };
            diesel::insert_into(order_outbox::table)
                .values(&outbox::order_changed(&stored, &change))
                .execute(conn)?;

            Ok(stored)
        })
    }

    fn delete(&self, order: &Order) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Line items cascade; linked cards are released by the FK.
            let deleted = diesel::delete(
                orders::table
                    .filter(orders::id.eq(order.id))
                    .filter(orders::version.eq(order.version)),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(stale_or_missing(conn, order.id)?);
            }

            diesel::insert_into(order_outbox::table)
                .values(&outbox::order_deleted(order))
                .execute(conn)?;
            Ok(())
        })
    }
}

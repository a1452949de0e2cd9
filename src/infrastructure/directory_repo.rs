use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::directory::{Customer, Store};
use crate::domain::errors::DomainError;
use crate::domain::ports::DirectoryLookup;
use crate::schema::{customers, stores};

use super::models::{CustomerRow, StoreRow};

/// Read-only view of the stores and customers tables.
pub struct DieselDirectory {
    pool: DbPool,
}

impl DieselDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl DirectoryLookup for DieselDirectory {
    fn store_by_id(&self, id: Uuid) -> Result<Option<Store>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = stores::table
            .filter(stores::id.eq(id))
            .select(StoreRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(|s| Store {
            id: s.id,
            name: s.name,
            is_active: s.is_active,
            grading_price: s.grading_price,
            mystery_pack_price: s.mystery_pack_price,
        }))
    }

    fn customer_by_id(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = customers::table
            .filter(customers::id.eq(id))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(|c| Customer {
            id: c.id,
            name: c.name,
            email: c.email,
            store_id: c.store_id,
        }))
    }
}

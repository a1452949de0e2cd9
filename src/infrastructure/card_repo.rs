use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::{CardLinkReport, CardLinker};
use crate::schema::cards;

pub struct DieselCardLinker {
    pool: DbPool,
}

impl DieselCardLinker {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CardLinker for DieselCardLinker {
    /// Runs outside the order transaction: the order stays even if this
    /// fails, and unknown card ids come back as `missing`.
    fn attach_cards_to_order(
        &self,
        order_id: Uuid,
        card_ids: &[Uuid],
    ) -> Result<CardLinkReport, DomainError> {
        let mut conn = self.pool.get()?;

        let attached: Vec<Uuid> =
            diesel::update(cards::table.filter(cards::id.eq_any(card_ids.to_vec())))
                .set(cards::order_id.eq(order_id))
                .returning(cards::id)
                .get_results(&mut conn)?;

        let missing = card_ids
            .iter()
            .filter(|id| !attached.contains(*id))
            .copied()
            .collect();

        Ok(CardLinkReport { attached, missing })
    }
}

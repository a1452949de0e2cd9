use bigdecimal::BigDecimal;
use uuid::Uuid;

/// Store as seen by the order core: identity, activity and price overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub grading_price: Option<BigDecimal>,
    pub mystery_pack_price: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// Store the customer is registered through, if any.
    pub store_id: Option<Uuid>,
}

use bigdecimal::{BigDecimal, Zero};

use super::directory::Store;
use super::errors::DomainError;
use super::order::{OrderItem, ProductType};

/// Decimal places money columns keep.
pub const MONEY_SCALE: i64 = 2;

/// Largest number of units a single line may carry.
pub const MAX_QUANTITY: i32 = 10_000;

/// Exclusive upper bound of a storable amount (`NUMERIC(12, 2)`).
fn amount_limit() -> BigDecimal {
    BigDecimal::from(10_000_000_000_i64)
}

/// Why `price` cannot be used as a unit price, if it cannot.
pub fn unit_price_problem(price: &BigDecimal) -> Option<String> {
    if price <= &BigDecimal::zero() {
        Some(format!("unit price {price} is not positive"))
    } else if price.with_scale(MONEY_SCALE) != *price {
        Some(format!(
            "unit price {price} has more than {MONEY_SCALE} decimal places"
        ))
    } else if *price >= amount_limit() {
        Some(format!("unit price {price} is too large"))
    } else {
        None
    }
}

/// Fails when `amount` does not fit the money columns.
pub fn ensure_storable(amount: &BigDecimal) -> Result<(), DomainError> {
    if *amount >= amount_limit() {
        return Err(DomainError::Validation(format!(
            "order total {amount} exceeds the largest storable amount"
        )));
    }
    Ok(())
}

/// Public per-unit prices, used when an order is not placed through a store.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    pub grading: BigDecimal,
    pub mystery_pack: BigDecimal,
}

impl PriceTable {
    pub fn price(&self, product: ProductType) -> &BigDecimal {
        match product {
            ProductType::Grading => &self.grading,
            ProductType::MysteryPack => &self.mystery_pack,
        }
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            grading: BigDecimal::from(350),
            mystery_pack: BigDecimal::from(150),
        }
    }
}

/// A store's own prices. Unset prices fall back to the public table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantPricing {
    pub grading_price: Option<BigDecimal>,
    pub mystery_pack_price: Option<BigDecimal>,
}

impl TenantPricing {
    fn price(&self, product: ProductType) -> Option<&BigDecimal> {
        match product {
            ProductType::Grading => self.grading_price.as_ref(),
            ProductType::MysteryPack => self.mystery_pack_price.as_ref(),
        }
    }
}

impl From<&Store> for TenantPricing {
    fn from(store: &Store) -> Self {
        Self {
            grading_price: store.grading_price.clone(),
            mystery_pack_price: store.mystery_pack_price.clone(),
        }
    }
}

/// Sum of line subtotals, plus the positions of lines left out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedTotal {
    pub amount: BigDecimal,
    pub skipped: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Pricing {
    table: PriceTable,
}

impl Pricing {
    pub fn new(table: PriceTable) -> Self {
        Self { table }
    }

    pub fn price_for(
        &self,
        product: ProductType,
        tenant: Option<&TenantPricing>,
    ) -> Result<BigDecimal, DomainError> {
        let price = match tenant.map(|t| t.price(product)) {
            Some(Some(price)) => price,
            Some(None) => {
                log::warn!("Tenant has no {product} price configured, using public price");
                self.table.price(product)
            }
            None => self.table.price(product),
        };

        if let Some(reason) = unit_price_problem(price) {
            return Err(DomainError::InvalidPricing { product, reason });
        }
        Ok(price.clone())
    }

    pub fn build_line_item(
        &self,
        product_type: &str,
        quantity: f64,
        tenant: Option<&TenantPricing>,
    ) -> Result<OrderItem, DomainError> {
        let product: ProductType = product_type.parse()?;
        let quantity = floor_quantity(quantity)?;
        let unit_price = self.price_for(product, tenant)?;
        let subtotal = &unit_price * BigDecimal::from(quantity);
        if subtotal >= amount_limit() {
            return Err(DomainError::InvalidQuantity(format!(
                "{quantity} x {unit_price} exceeds the largest storable amount"
            )));
        }

        Ok(OrderItem {
            product_type: product,
            quantity,
            unit_price,
            subtotal,
        })
    }

    /// Lines whose subtotal is negative or disagrees with
    /// `unit_price * quantity` are skipped and reported rather than failing
    /// the whole order.
    pub fn total(&self, items: &[OrderItem]) -> PricedTotal {
        let mut amount = BigDecimal::zero();
        let mut skipped = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let expected = &item.unit_price * BigDecimal::from(item.quantity);
            if item.subtotal < BigDecimal::zero() || item.subtotal != expected {
                log::warn!(
                    "Skipping line {index} with corrupt subtotal {} (expected {expected})",
                    item.subtotal
                );
                skipped.push(index);
                continue;
            }
            amount += &item.subtotal;
        }

        PricedTotal { amount, skipped }
    }
}

fn floor_quantity(quantity: f64) -> Result<i32, DomainError> {
    if !quantity.is_finite() {
        return Err(DomainError::InvalidQuantity(quantity.to_string()));
    }
    let floored = quantity.floor();
    if floored < 1.0 || floored > f64::from(MAX_QUANTITY) {
        return Err(DomainError::InvalidQuantity(quantity.to_string()));
    }
    Ok(floored as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(grading: i64) -> TenantPricing {
        TenantPricing {
            grading_price: Some(BigDecimal::from(grading)),
            mystery_pack_price: Some(BigDecimal::from(120)),
        }
    }

    #[test]
    fn public_prices() {
        let pricing = Pricing::default();
        assert_eq!(
            pricing.price_for(ProductType::Grading, None).unwrap(),
            BigDecimal::from(350)
        );
        assert_eq!(
            pricing.price_for(ProductType::MysteryPack, None).unwrap(),
            BigDecimal::from(150)
        );
    }

    #[test]
    fn tenant_override_wins() {
        let pricing = Pricing::default();
        assert_eq!(
            pricing
                .price_for(ProductType::Grading, Some(&tenant(280)))
                .unwrap(),
            BigDecimal::from(280)
        );
    }

    #[test]
    fn unset_tenant_price_falls_back_to_public_table() {
        let pricing = Pricing::default();
        let partial = TenantPricing {
            grading_price: Some(BigDecimal::from(300)),
            mystery_pack_price: None,
        };
        assert_eq!(
            pricing
                .price_for(ProductType::MysteryPack, Some(&partial))
                .unwrap(),
            BigDecimal::from(150)
        );
    }

    #[test]
    fn non_positive_tenant_price_is_invalid() {
        let pricing = Pricing::default();
        let err = pricing
            .price_for(ProductType::Grading, Some(&tenant(0)))
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidPricing {
                product: ProductType::Grading,
                ..
            }
        ));
    }

    #[test]
    fn injected_price_table_is_used() {
        let pricing = Pricing::new(PriceTable {
            grading: BigDecimal::from(10),
            mystery_pack: BigDecimal::from(5),
        });
        let item = pricing.build_line_item("grading", 2.0, None).unwrap();
        assert_eq!(item.subtotal, BigDecimal::from(20));
    }

    #[test]
    fn build_line_item_for_mystery_packs() {
        let item = Pricing::default()
            .build_line_item("mysterypack", 3.0, None)
            .unwrap();
        assert_eq!(
            item,
            OrderItem {
                product_type: ProductType::MysteryPack,
                quantity: 3,
                unit_price: BigDecimal::from(150),
                subtotal: BigDecimal::from(450),
            }
        );
    }

    #[test]
    fn quantity_is_floored() {
        let item = Pricing::default()
            .build_line_item("grading", 2.9, None)
            .unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.subtotal, BigDecimal::from(700));
    }

    #[test]
    fn quantity_below_one_is_rejected() {
        let pricing = Pricing::default();
        for quantity in [0.0, 0.5, -2.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    pricing.build_line_item("grading", quantity, None),
                    Err(DomainError::InvalidQuantity(_))
                ),
                "quantity {quantity}"
            );
        }
    }

    #[test]
    fn quantity_is_capped() {
        let pricing = Pricing::default();
        assert_eq!(
            pricing
                .build_line_item("grading", f64::from(MAX_QUANTITY), None)
                .unwrap()
                .quantity,
            MAX_QUANTITY
        );
        for quantity in [f64::from(MAX_QUANTITY) + 1.0, 30_000_000.0, f64::from(i32::MAX)] {
            assert!(
                matches!(
                    pricing.build_line_item("grading", quantity, None),
                    Err(DomainError::InvalidQuantity(_))
                ),
                "quantity {quantity}"
            );
        }
    }

    #[test]
    fn unstorable_subtotal_is_rejected() {
        let pricing = Pricing::new(PriceTable {
            grading: BigDecimal::from(5_000_000),
            mystery_pack: BigDecimal::from(150),
        });
        assert!(matches!(
            pricing.build_line_item("grading", 2_000.0, None),
            Err(DomainError::InvalidQuantity(_))
        ));
        assert!(pricing.build_line_item("grading", 1_999.0, None).is_ok());
    }

    #[test]
    fn sub_cent_prices_are_invalid() {
        let pricing = Pricing::default();
        let tenant = TenantPricing {
            grading_price: Some("99.555".parse().unwrap()),
            mystery_pack_price: Some("99.50".parse().unwrap()),
        };
        assert!(matches!(
            pricing.price_for(ProductType::Grading, Some(&tenant)),
            Err(DomainError::InvalidPricing { .. })
        ));

        let item = pricing
            .build_line_item("mysterypack", 3.0, Some(&tenant))
            .unwrap();
        assert_eq!(item.subtotal, "298.50".parse::<BigDecimal>().unwrap());
        assert_eq!(pricing.total(&[item]).skipped, Vec::<usize>::new());
    }

    #[test]
    fn storable_amounts() {
        assert!(ensure_storable(&"9999999999.99".parse().unwrap()).is_ok());
        assert!(matches!(
            ensure_storable(&BigDecimal::from(10_000_000_000_i64)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn unknown_product_is_rejected() {
        assert!(matches!(
            Pricing::default().build_line_item("slab", 1.0, None),
            Err(DomainError::InvalidProductType(_))
        ));
    }

    #[test]
    fn total_sums_subtotals() {
        let pricing = Pricing::default();
        let items = vec![
            pricing.build_line_item("grading", 2.0, None).unwrap(),
            pricing.build_line_item("mysterypack", 1.0, None).unwrap(),
        ];
        let total = pricing.total(&items);
        assert_eq!(total.amount, BigDecimal::from(850));
        assert!(total.skipped.is_empty());
    }

    #[test]
    fn total_skips_and_reports_corrupt_lines() {
        let pricing = Pricing::default();
        let good = pricing.build_line_item("grading", 1.0, None).unwrap();
        let mut corrupt = good.clone();
        corrupt.subtotal = BigDecimal::from(-1);

        let total = pricing.total(&[good, corrupt]);

        assert_eq!(total.amount, BigDecimal::from(350));
        assert_eq!(total.skipped, vec![1]);
    }

    #[test]
    fn total_of_nothing_is_zero() {
        let total = Pricing::default().total(&[]);
        assert_eq!(total.amount, BigDecimal::zero());
    }
}

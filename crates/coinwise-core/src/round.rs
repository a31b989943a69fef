//! # Round Generator
//!
//! Picks the next product uniformly at random from the products in a range.
//!
//! The random source is injected so tests and replays can seed it.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::catalog::ProductCatalog;
use crate::error::{CoreError, CoreResult};
use crate::types::{PriceRange, Round};

/// Draws a round from `products` filtered by `range`.
///
/// ## Errors
/// `NoProductsInRange` when no product's price falls within the range.
///
/// ## Example
/// ```rust
/// use coinwise_core::catalog::ProductCatalog;
/// use coinwise_core::round::next_round;
/// use coinwise_core::PriceRange;
///
/// let products = ProductCatalog::default_catalog();
/// let mut rng = rand::thread_rng();
/// let round = next_round(&products, &PriceRange::new("41-50", "41-50元", 41, 50), &mut rng).unwrap();
/// assert_eq!(round.product.name, "漢堡");
/// ```
pub fn next_round<R: Rng + ?Sized>(
    products: &ProductCatalog,
    range: &PriceRange,
    rng: &mut R,
) -> CoreResult<Round> {
    let pool = products.pool(range);
    let product = pool
        .choose(rng)
        .cloned()
        .ok_or(CoreError::NoProductsInRange {
            min: range.min,
            max: range.max,
        })?;

    Ok(Round {
        id: Uuid::new_v4().to_string(),
        product,
        started_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_empty_pool_errors() {
        let products = ProductCatalog::default_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let err = next_round(&products, &PriceRange::new("500-1000", "", 500, 1000), &mut rng)
            .unwrap_err();
        assert!(matches!(err, CoreError::NoProductsInRange { .. }));
        assert_eq!(err.to_string(), "No products priced between 500 and 1000");
    }

    #[test]
    fn test_round_stays_in_range() {
        let products = ProductCatalog::default_catalog();
        let range = PriceRange::new("11-50", "", 11, 50);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let round = next_round(&products, &range, &mut rng).unwrap();
            assert!(range.contains(round.price()));
        }
    }

    #[test]
    fn test_every_pool_member_is_reachable() {
        let products = ProductCatalog::new(vec![
            Product::new("a", "A", 10),
            Product::new("b", "B", 20),
            Product::new("c", "C", 30),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let seen: HashSet<String> = (0..200)
            .map(|_| {
                next_round(&products, &PriceRange::all(), &mut rng)
                    .unwrap()
                    .product
                    .id
            })
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_round_ids_are_unique() {
        let products = ProductCatalog::default_catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let a = next_round(&products, &PriceRange::all(), &mut rng).unwrap();
        let b = next_round(&products, &PriceRange::all(), &mut rng).unwrap();
        assert_ne!(a.id, b.id);
    }
}

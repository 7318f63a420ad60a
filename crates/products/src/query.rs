//! List filtering and aggregate statistics over a caller's products.

use serde::{Deserialize, Serialize};

use crate::product::Product;

/// Optional list filter; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    /// Case-insensitive substring of name or description.
    pub q: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductFilter {
    /// Search term with surrounding whitespace removed; `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        match self.search_term() {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                product.name.to_lowercase().contains(&term)
                    || product
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            }
        }
    }
}

/// Aggregate over a set of products. Price fields are `None` when `count == 0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductStats {
    pub count: u64,
    pub total_price: f64,
    pub average_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductStats {
    pub fn from_prices<I>(prices: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut stats = Self::default();
        let mut sum = 0.0;
        for price in prices {
            stats.count += 1;
            sum += price;
            stats.min_price = Some(stats.min_price.map_or(price, |m| m.min(price)));
            stats.max_price = Some(stats.max_price.map_or(price, |m| m.max(price)));
        }
        stats.total_price = round_cents(sum);
        if stats.count > 0 {
            stats.average_price = Some(round_cents(sum / stats.count as f64));
        }
        stats
    }

    pub fn from_products<'a, I>(products: I) -> Self
    where
        I: IntoIterator<Item = &'a Product>,
    {
        Self::from_prices(products.into_iter().map(|p| p.price))
    }
}

/// Prices are currency amounts; aggregates are reported to the cent.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

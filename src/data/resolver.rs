//! Resolution of a query to a catalog SKU and then to a price

use thiserror::Error;

use super::{Catalog, Price, PriceDimension};
use crate::config::PricingConfig;

/// Product attribute holding the EC2 instance type
const ATTR_INSTANCE_TYPE: &str = "instanceType";
/// Product attribute holding the region display name
const ATTR_LOCATION: &str = "location";
const ATTR_TENANCY: &str = "tenancy";
const ATTR_OPERATING_SYSTEM: &str = "operatingSystem";

/// Errors that can occur while resolving a query against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// More than one product matches the query
    #[error("More than one SKU found for {instance_type} {tenancy} {operating_system} in {location}: {}", .skus.join(", "))]
    AmbiguousMatch {
        instance_type: String,
        tenancy: String,
        operating_system: String,
        location: String,
        skus: Vec<String>,
    },

    /// The SKU has no term, price dimension or price under the term name
    #[error("No {term} price found for SKU {sku}")]
    PriceNotFound { sku: String, term: String },
}

/// Finds SKUs and prices in a decoded catalog
#[derive(Debug, Clone, PartialEq)]
pub struct EntryResolver {
    location: String,
    preferred_currencies: Vec<String>,
}

impl EntryResolver {
    /// Creates a resolver for a fixed location and currency preference order
    pub fn new(location: impl Into<String>, preferred_currencies: Vec<String>) -> Self {
        Self {
            location: location.into(),
            preferred_currencies,
        }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(config.location.clone(), config.preferred_currencies.clone())
    }

    /// Finds the single product matching the instance type, tenancy and
    /// operating system in the configured location
    ///
    /// # Returns
    /// * `Ok(Some(sku))` if exactly one product matches
    /// * `Ok(None)` if no product matches
    /// * `Err(ResolveError::AmbiguousMatch)` if two or more products match
    pub fn resolve_sku(
        &self,
        catalog: &Catalog,
        instance_type: &str,
        tenancy: &str,
        operating_system: &str,
    ) -> Result<Option<String>, ResolveError> {
        let mut skus: Vec<String> = catalog
            .products
            .iter()
            .filter(|(_, product)| {
                product.attribute(ATTR_INSTANCE_TYPE) == Some(instance_type)
                    && product.attribute(ATTR_LOCATION) == Some(self.location.as_str())
                    && product.attribute(ATTR_TENANCY) == Some(tenancy)
                    && product.attribute(ATTR_OPERATING_SYSTEM) == Some(operating_system)
            })
            .map(|(sku, _)| sku.clone())
            .collect();

        match skus.len() {
            0 => Ok(None),
            1 => Ok(skus.pop()),
            _ => {
                skus.sort();
                Err(ResolveError::AmbiguousMatch {
                    instance_type: instance_type.to_string(),
                    tenancy: tenancy.to_string(),
                    operating_system: operating_system.to_string(),
                    location: self.location.clone(),
                    skus,
                })
            }
        }
    }

    /// Picks the price of `sku` under the pricing term `term_name`
    ///
    /// Terms and price dimensions are visited in identifier order. The first
    /// preferred currency found in any dimension wins; otherwise the
    /// alphabetically first currency of the first priced dimension is used.
    pub fn resolve_price(
        &self,
        catalog: &Catalog,
        sku: &str,
        term_name: &str,
    ) -> Result<Price, ResolveError> {
        let not_found = || ResolveError::PriceNotFound {
            sku: sku.to_string(),
            term: term_name.to_string(),
        };

        let terms = catalog
            .terms
            .get(term_name)
            .and_then(|by_sku| by_sku.get(sku))
            .ok_or_else(not_found)?;

        let dimensions: Vec<&PriceDimension> = terms
            .values()
            .flat_map(|term| term.price_dimensions.values())
            .collect();

        for currency in &self.preferred_currencies {
            if let Some(value) = dimensions
                .iter()
                .find_map(|dimension| dimension.price_per_unit.get(currency))
            {
                return Ok(Price {
                    currency: currency.clone(),
                    value: value.clone(),
                });
            }
        }

        dimensions
            .iter()
            .find_map(|dimension| dimension.price_per_unit.iter().next())
            .map(|(currency, value)| Price {
                currency: currency.clone(),
                value: value.clone(),
            })
            .ok_or_else(not_found)
    }
}

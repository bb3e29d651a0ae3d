//! Core data models for EC2 price lookups
//!
//! This module contains the pricing catalog as published by the AWS Price List
//! bulk API, along with the query type callers use to ask for a price.

pub mod catalog;
pub mod resolver;

pub use catalog::{decode_catalog, CatalogClient, CatalogError, CatalogSource, HttpSource};
pub use resolver::{EntryResolver, ResolveError};

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Deserialize;

/// Terms for one pricing term name, keyed by SKU and then by term identifier
pub type TermsBySku = HashMap<String, BTreeMap<String, Term>>;

/// A decoded pricing offer file
///
/// The catalog is never mutated after decoding. Version metadata is passed
/// through untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// The version of the file format
    #[serde(default)]
    pub format_version: String,
    /// The disclaimers for the offer file
    #[serde(default)]
    pub disclaimer: String,
    /// The code for the service
    #[serde(default)]
    pub offer_code: String,
    /// The version of the offer file
    #[serde(default)]
    pub version: String,
    /// The publication date of the offer file
    #[serde(default)]
    pub publication_date: String,
    /// Products keyed by SKU
    pub products: HashMap<String, Product>,
    /// Pricing term name (e.g. "OnDemand") -> SKU -> term identifier -> term
    pub terms: HashMap<String, TermsBySku>,
}

/// One priced product configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// The SKU of the product
    #[serde(default)]
    pub sku: String,
    /// The product family of the product
    #[serde(default)]
    pub product_family: String,
    /// Attribute name -> value, e.g. `instanceType`, `location`, `tenancy`
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Product {
    /// Returns the value of an attribute, if present
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// A pricing plan applicable to a SKU
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    /// The term code of the product
    #[serde(default)]
    pub offer_term_code: String,
    /// The SKU this term prices
    #[serde(default)]
    pub sku: String,
    /// The effective date of the pricing details
    #[serde(default)]
    pub effective_date: String,
    #[serde(default)]
    pub term_attributes: HashMap<String, String>,
    /// Price dimensions keyed by rate code
    pub price_dimensions: BTreeMap<String, PriceDimension>,
}

/// One billable rate bucket within a term
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDimension {
    #[serde(default)]
    pub rate_code: String,
    /// The description of the rate
    #[serde(default)]
    pub description: String,
    /// The usage measurement unit for the price (e.g. "Hrs")
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub begin_range: String,
    #[serde(default)]
    pub end_range: String,
    /// Currency code -> decimal price kept as text
    pub price_per_unit: BTreeMap<String, String>,
}

/// A price picked out of a price dimension, still in its textual form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub currency: String,
    pub value: String,
}

/// The parameters of a price lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    /// EC2 instance type, e.g. "m4.4xlarge"
    pub instance_type: String,
    /// Tenancy, e.g. "Shared" or "Dedicated"
    pub tenancy: String,
    /// Operating system, e.g. "Linux"
    pub operating_system: String,
    /// Pricing term name, e.g. "OnDemand"
    pub term: String,
}

impl Query {
    pub fn new(
        instance_type: impl Into<String>,
        tenancy: impl Into<String>,
        operating_system: impl Into<String>,
        term: impl Into<String>,
    ) -> Self {
        Self {
            instance_type: instance_type.into(),
            tenancy: tenancy.into(),
            operating_system: operating_system.into(),
            term: term.into(),
        }
    }

    /// Returns the query fields in key derivation order
    pub fn fields(&self) -> [&str; 4] {
        [
            &self.instance_type,
            &self.tenancy,
            &self.operating_system,
            &self.term,
        ]
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.term, self.operating_system, self.tenancy, self.instance_type
        )
    }
}

//! # Query Criteria
//!
//! [`CatalogQuery`] holds the normalized criteria set. Raw request input
//! (where `"all"` and blank values mean "no constraint") is normalized
//! through [`CatalogQuery::from_raw`]; handlers hand it their query-string
//! fields verbatim.

use serde::{Deserialize, Serialize};

use crate::sort::SortBy;
use quarry_state::StockAvailability;

/// Normalized catalog criteria. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Exact category match.
    pub category: Option<String>,
    /// Exact subcategory match.
    pub subcategory: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<f64>,
    /// Inclusive upper price bound.
    pub max_price: Option<f64>,
    /// Exact stock availability match.
    pub stock_availability: Option<StockAvailability>,
    /// Case-insensitive substring, ORed across name, dimensions,
    /// category, and subcategory.
    pub keywords: Option<String>,
    /// Legacy alternate spelling for `category`; ignored when `category`
    /// is present.
    pub source: Option<String>,
    /// Result ordering.
    #[serde(default)]
    pub sort_by: SortBy,
}

/// Raw, pre-normalization criteria as they arrive on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCatalogQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub stock_availability: Option<String>,
    pub keywords: Option<String>,
    pub source: Option<String>,
    pub sort_by: Option<String>,
}

impl CatalogQuery {
    /// Normalize raw wire criteria.
    ///
    /// `"all"` and blank strings are treated as absent for the exact-match
    /// criteria. Unrecognized `stock_availability` labels are treated as
    /// absent rather than rejected — a filter request never errors, it
    /// just constrains less. Unrecognized `sort_by` falls back to the
    /// default ordering.
    pub fn from_raw(raw: RawCatalogQuery) -> Self {
        Self {
            category: exact_criterion(raw.category),
            subcategory: exact_criterion(raw.subcategory),
            min_price: raw.min_price,
            max_price: raw.max_price,
            stock_availability: exact_criterion(raw.stock_availability)
                .and_then(|s| StockAvailability::parse(&s)),
            keywords: raw.keywords.filter(|k| !k.trim().is_empty()),
            source: exact_criterion(raw.source),
            sort_by: SortBy::parse(raw.sort_by.as_deref()),
        }
    }
}

/// Treat `"all"` (the UI's "no filter" sentinel) and blank values as absent.
fn exact_criterion(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "all")
}

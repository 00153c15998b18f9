//! # quarry-catalog — Catalog Query Engine
//!
//! Composes a filter predicate and an ordering from independent, optional
//! criteria and applies them to the block inventory. A dispatched block
//! is never in the catalog: the `status != Dispatched` constraint is
//! ANDed in regardless of the other criteria.
//!
//! ## Composition Semantics
//!
//! All active criteria combine with logical AND; the keyword criterion's
//! four sub-field checks combine with logical OR. The `source` criterion
//! is a legacy alternate spelling for `category` and applies only when
//! `category` itself is absent.
//!
//! The engine never mutates entities — it filters and reorders owned
//! copies read from the store.

pub mod query;
pub mod sort;

pub use query::{CatalogQuery, RawCatalogQuery};
pub use sort::SortBy;

use quarry_state::{BlockStatus, StoneBlock};

impl CatalogQuery {
    /// Whether a block satisfies every active criterion.
    ///
    /// Dispatched blocks never match, regardless of the criteria.
    pub fn matches(&self, block: &StoneBlock) -> bool {
        if block.status == BlockStatus::Dispatched {
            return false;
        }

        // Category wins over its legacy alternate spelling.
        let category = self.category.as_deref().or(self.source.as_deref());
        if let Some(wanted) = category {
            if block.category != wanted {
                return false;
            }
        }

        if let Some(wanted) = self.subcategory.as_deref() {
            if block.subcategory != wanted {
                return false;
            }
        }

        if let Some(min) = self.min_price {
            if block.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if block.price > max {
                return false;
            }
        }

        if let Some(wanted) = self.stock_availability {
            if block.stock_availability != wanted {
                return false;
            }
        }

        if let Some(keywords) = self.keywords.as_deref() {
            let needle = keywords.trim().to_lowercase();
            if !needle.is_empty() {
                let hit = [
                    &block.name,
                    &block.dimensions,
                    &block.category,
                    &block.subcategory,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
                if !hit {
                    return false;
                }
            }
        }

        true
    }

    /// Filter and order the inventory according to this query.
    ///
    /// The sort is stable: equal keys keep the input (storage-native)
    /// order, which is the documented tie-break behavior.
    pub fn apply(&self, mut blocks: Vec<StoneBlock>) -> Vec<StoneBlock> {
        blocks.retain(|b| self.matches(b));
        self.sort_by.sort(&mut blocks);
        blocks
    }
}

//! # Result Orderings
//!
//! The `sort_by` enumeration and its comparison rules. Name orderings
//! collate case-insensitively via Unicode lowercase folding — "banana
//! Stone" sorts after "Apple Stone", unlike raw codepoint order where
//! uppercase letters sort first. All sorts are stable, so equal keys
//! keep the storage-native order.

use serde::{Deserialize, Serialize};

use quarry_state::StoneBlock;

/// Catalog result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Creation time, newest first. The default.
    #[default]
    Newest,
    /// Creation time, oldest first.
    Oldest,
    /// Price ascending.
    PriceLow,
    /// Price descending.
    PriceHigh,
    /// Name A-Z, case-insensitive.
    NameAsc,
    /// Name Z-A, case-insensitive.
    NameDesc,
}

impl SortBy {
    /// Parse a wire-format sort key; absent or unrecognized values fall
    /// back to [`SortBy::Newest`].
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("newest") => Self::Newest,
            Some("oldest") => Self::Oldest,
            Some("price_low") => Self::PriceLow,
            Some("price_high") => Self::PriceHigh,
            Some("name_asc") => Self::NameAsc,
            Some("name_desc") => Self::NameDesc,
            _ => Self::Newest,
        }
    }

    /// The wire-format string for this ordering.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PriceLow => "price_low",
            Self::PriceHigh => "price_high",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        }
    }

    /// Stable-sort blocks in place according to this ordering.
    pub fn sort(&self, blocks: &mut [StoneBlock]) {
        match self {
            Self::Newest => blocks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Self::Oldest => blocks.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            Self::PriceLow => blocks.sort_by(|a, b| a.price.total_cmp(&b.price)),
            Self::PriceHigh => blocks.sort_by(|a, b| b.price.total_cmp(&a.price)),
            Self::NameAsc => blocks.sort_by(|a, b| folded(&a.name).cmp(&folded(&b.name))),
            Self::NameDesc => blocks.sort_by(|a, b| folded(&b.name).cmp(&folded(&a.name))),
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-folded collation key for name orderings.
fn folded(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use quarry_core::{BlockId, IdentityToken};
    use quarry_state::{BlockStatus, StockAvailability, DEFAULT_GRADE};

    fn block(name: &str, price: f64, created_offset_secs: i64) -> StoneBlock {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::seconds(created_offset_secs);
        StoneBlock {
            id: BlockId::new(),
            identity_token: IdentityToken::from(uuid::Uuid::new_v4()),
            artifact_ref: "artifacts/aa.png".to_string(),
            name: name.to_string(),
            dimensions: "1x1x1 m".to_string(),
            category: "grey".to_string(),
            subcategory: "block".to_string(),
            price,
            price_unit: "per unit".to_string(),
            image_ref: "images/bb.png".to_string(),
            stock_availability: StockAvailability::InStock,
            stock_quantity: None,
            grade: DEFAULT_GRADE.to_string(),
            status: BlockStatus::Registered,
            created_at: created,
            updated_at: created,
        }
    }

    fn names(blocks: &[StoneBlock]) -> Vec<&str> {
        blocks.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn parse_known_keys() {
        assert_eq!(SortBy::parse(Some("oldest")), SortBy::Oldest);
        assert_eq!(SortBy::parse(Some("price_low")), SortBy::PriceLow);
        assert_eq!(SortBy::parse(Some("name_desc")), SortBy::NameDesc);
    }

    #[test]
    fn parse_defaults_to_newest() {
        assert_eq!(SortBy::parse(None), SortBy::Newest);
        assert_eq!(SortBy::parse(Some("NEWEST")), SortBy::Newest);
        assert_eq!(SortBy::parse(Some("nonsense")), SortBy::Newest);
    }

    #[test]
    fn newest_orders_by_creation_descending() {
        let mut blocks = vec![block("a", 1.0, 0), block("b", 1.0, 60), block("c", 1.0, 30)];
        SortBy::Newest.sort(&mut blocks);
        assert_eq!(names(&blocks), vec!["b", "c", "a"]);
    }

    #[test]
    fn oldest_orders_by_creation_ascending() {
        let mut blocks = vec![block("a", 1.0, 60), block("b", 1.0, 0)];
        SortBy::Oldest.sort(&mut blocks);
        assert_eq!(names(&blocks), vec!["b", "a"]);
    }

    #[test]
    fn price_orderings() {
        let mut blocks = vec![block("mid", 50.0, 0), block("low", 10.0, 0), block("high", 90.0, 0)];
        SortBy::PriceLow.sort(&mut blocks);
        assert_eq!(names(&blocks), vec!["low", "mid", "high"]);
        SortBy::PriceHigh.sort(&mut blocks);
        assert_eq!(names(&blocks), vec!["high", "mid", "low"]);
    }

    #[test]
    fn name_asc_is_case_insensitive() {
        // Raw codepoint order would put "Apple Stone" after "banana Stone"
        // only under name_desc; case-folded collation must not be fooled
        // by the lowercase 'b'.
        let mut blocks = vec![block("banana Stone", 1.0, 0), block("Apple Stone", 1.0, 0)];
        SortBy::NameAsc.sort(&mut blocks);
        assert_eq!(names(&blocks), vec!["Apple Stone", "banana Stone"]);
    }

    #[test]
    fn name_desc_reverses_folded_order() {
        let mut blocks = vec![block("Apple Stone", 1.0, 0), block("banana Stone", 1.0, 0)];
        SortBy::NameDesc.sort(&mut blocks);
        assert_eq!(names(&blocks), vec!["banana Stone", "Apple Stone"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let mut blocks = vec![
            block("first", 25.0, 0),
            block("second", 25.0, 0),
            block("third", 25.0, 0),
        ];
        SortBy::PriceLow.sort(&mut blocks);
        assert_eq!(names(&blocks), vec!["first", "second", "third"]);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&SortBy::PriceHigh).unwrap();
        assert_eq!(json, "\"price_high\"");
    }
}

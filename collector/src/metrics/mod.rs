pub mod records;
pub mod row;

pub use records::*;
pub use row::*;
use serde::{
    Deserialize,
    Serialize,
};
use strum::{
    Display,
    EnumIter,
    EnumString,
};

/// A repository selected for collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name as known to the hosting platform, e.g. `iocage-plugin-plex`.
    pub full_name: String,
    /// `full_name` without the fleet prefix, e.g. `plex`.
    pub display_name: String,
    /// Owner (organization) the repository lives under.
    pub owner: String,
}

impl Repository {
    /// Returns `None` when `full_name` does not carry `prefix`; such repositories are not part of the fleet.
    pub fn with_prefix(owner: impl Into<String>, full_name: impl Into<String>, prefix: &str) -> Option<Self> {
        let full_name = full_name.into();
        let display_name = full_name.strip_prefix(prefix)?.to_string();
        Some(Self {
            owner: owner.into(),
            full_name,
            display_name,
        })
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MetricCategory {
    Referrers,
    Paths,
    Views,
    Clones,
}

impl MetricCategory {
    /// Category order used when none is configured.
    pub const DEFAULT_ORDER: [MetricCategory; 4] = [
        MetricCategory::Referrers,
        MetricCategory::Paths,
        MetricCategory::Views,
        MetricCategory::Clones,
    ];
}

/// How much data is gathered per repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AggregationMode {
    /// One clones fetch per repository, one `[repo, count, uniques]` row.
    #[default]
    Simplified,
    /// Every listed category, in the listed order.
    Full { categories: Vec<MetricCategory> },
}

impl AggregationMode {
    /// Column count every row must be padded to for this mode.
    pub fn width(&self) -> usize {
        match self {
            AggregationMode::Simplified => 3,
            AggregationMode::Full { .. } => CanonicalRow::WIDTH,
        }
    }

    /// Header row written ahead of all data rows.
    pub fn header(&self) -> CanonicalRow {
        let names: &[&str] = match self {
            AggregationMode::Simplified => &["repo", "count", "uniques"],
            AggregationMode::Full { .. } => &["repo", "count", "uniques", "date", "name"],
        };
        CanonicalRow::new(names.iter().map(|name| Cell::text(*name)).collect())
    }

    pub fn is_simplified(&self) -> bool {
        matches!(self, AggregationMode::Simplified)
    }
}

/// Everything gathered for one repository during one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryBlock {
    pub repository: Repository,
    pub rows: Vec<CanonicalRow>,
    /// The raw records behind `rows`, in fetch order, kept for lossless JSON persistence.
    pub traffic: Vec<RawRecords>,
}

impl RepositoryBlock {
    /// The block's JSON form: one field per fetched category, timestamps at full precision.
    pub fn to_json(&self) -> serde_json::Value {
        let fields = self
            .traffic
            .iter()
            .map(|records| (records.category().to_string(), records.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn display_name_strips_the_fleet_prefix() {
        let repo = Repository::with_prefix("freenas", "iocage-plugin-foo", "iocage-plugin-").unwrap();
        assert_eq!(repo.display_name, "foo");
        assert_eq!(repo.full_name, "iocage-plugin-foo");

        assert!(Repository::with_prefix("freenas", "freenas-docs", "iocage-plugin-").is_none());
    }

    #[test]
    fn categories_parse_from_lowercase_names() {
        assert_eq!(MetricCategory::from_str("views").unwrap(), MetricCategory::Views);
        assert_eq!(MetricCategory::Referrers.to_string(), "referrers");
        assert!(MetricCategory::from_str("stars").is_err());
    }

    #[test]
    fn headers_match_mode_width() {
        let full = AggregationMode::Full {
            categories: MetricCategory::DEFAULT_ORDER.to_vec(),
        };
        assert_eq!(full.header().len(), full.width());
        assert_eq!(AggregationMode::Simplified.header().len(), AggregationMode::Simplified.width());
    }
}

use super::MetricCategory;
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// A site sending visitors to the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referrer {
    pub referrer: String,
    pub count: u64,
    pub uniques: u64,
}

/// A popular content path inside the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPath {
    pub path: String,
    #[serde(default)]
    pub title: String,
    pub count: u64,
    pub uniques: u64,
}

/// One bucket of a views or clones time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
    #[serde(default)]
    pub uniques: u64,
}

/// A views or clones time series together with its totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSeries {
    pub count: u64,
    pub uniques: u64,
    #[serde(default, alias = "views", alias = "clones")]
    pub samples: Vec<TrafficSample>,
}

/// Views are reported per day, optionally complemented by weekly buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewTraffic {
    pub daily: TrafficSeries,
    pub weekly: Option<TrafficSeries>,
}

/// Traffic records as returned by the source for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRecords {
    Referrers(Vec<Referrer>),
    Paths(Vec<ContentPath>),
    Views(ViewTraffic),
    Clones(TrafficSeries),
}

impl RawRecords {
    /// The record set a source reports for a category it has no data for.
    pub fn empty(category: MetricCategory) -> Self {
        match category {
            MetricCategory::Referrers => RawRecords::Referrers(Vec::new()),
            MetricCategory::Paths => RawRecords::Paths(Vec::new()),
            MetricCategory::Views => RawRecords::Views(ViewTraffic::default()),
            MetricCategory::Clones => RawRecords::Clones(TrafficSeries::default()),
        }
    }

    pub fn category(&self) -> MetricCategory {
        match self {
            RawRecords::Referrers(_) => MetricCategory::Referrers,
            RawRecords::Paths(_) => MetricCategory::Paths,
            RawRecords::Views(_) => MetricCategory::Views,
            RawRecords::Clones(_) => MetricCategory::Clones,
        }
    }

    /// Serialized form used in JSON snapshots. Series keep the platform's field names.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RawRecords::Referrers(referrers) => serde_json::json!(referrers),
            RawRecords::Paths(paths) => serde_json::json!(paths),
            RawRecords::Views(views) => {
                let mut value = series_json(&views.daily, "views");
                if let Some(weekly) = &views.weekly {
                    value["weekly"] = series_json(weekly, "views");
                }
                value
            }
            RawRecords::Clones(clones) => series_json(clones, "clones"),
        }
    }
}

fn series_json(series: &TrafficSeries, samples_key: &str) -> serde_json::Value {
    let mut value = serde_json::json!({
        "count": series.count,
        "uniques": series.uniques,
    });
    value[samples_key] = serde_json::json!(series.samples);
    value
}

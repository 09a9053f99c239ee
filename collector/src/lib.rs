//! # Plugin Traffic Collector
//!
//! Pulls traffic telemetry for plugin repositories and shapes it into rows.
//!
//! ## Architecture
//!
//! - **`metrics`**: Repository handles, metric categories, raw traffic records and canonical rows
//! - **`source`**: The `MetricSource` seam and its GitHub REST implementation
//! - **`normalizer`**: Converts one category's raw records into canonical rows
//! - **`aggregator`**: Runs the normalizer over an ordered category list for one repository
//! - **`error`**: Error taxonomy shared with the publisher
//!
//! ## Row shape
//!
//! Every category is flattened into `[label, count, uniques, date, name]`. Categories that supply
//! fewer fields produce shorter rows; sinks pad them to a fixed width before writing.

#[macro_use]
extern crate tracing;

pub mod aggregator;
pub mod error;
pub mod metrics;
pub mod normalizer;
pub mod source;

pub use aggregator::CategoryAggregator;
pub use error::{
    Error,
    ErrorScope,
    Result,
};
pub use metrics::*;
pub use normalizer::normalize;
pub use source::{
    GithubSource,
    MetricSource,
    RepositoryFilter,
    SourceFuture,
};

//! # Plugin Traffic Publisher
//!
//! Delivers aggregated repository blocks to one sink per run.
//!
//! - **`router`**: `OutputRouter` streams blocks into the selected sink and closes it at run end
//! - **`text`**: Fixed-width text files (`data_<repo>`, `data_plugins`)
//! - **`snapshot`**: Timestamped JSON snapshots (`data_plugins_<time_t>.json`)
//! - **`merger`**: Folds snapshots from several runs into one document
//! - **`sheets`**: Spreadsheet service seam, Google Sheets client, post-processing templates and the publisher
//! - **`report`**: End-of-run summary table

#[macro_use]
extern crate tracing;

pub mod merger;
pub mod report;
pub mod router;
pub mod sheets;
pub mod snapshot;
pub mod text;

pub use merger::{
    discover_snapshots,
    merge,
    MergeOutcome,
    MergedSnapshot,
    MERGED_FILE_NAME,
};
pub use report::{
    RepositoryOutcome,
    RunReport,
};
pub use router::{
    OutputRouter,
    RunArtifact,
    SinkTarget,
};
pub use sheets::{
    GoogleSheets,
    Publication,
    SpreadsheetPublisher,
    SpreadsheetService,
    Template,
    TemplateSet,
};
pub use snapshot::Snapshot;

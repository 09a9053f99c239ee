mod google;
mod publisher;
mod templates;

pub use google::GoogleSheets;
#[cfg(test)]
pub(crate) use publisher::tests::{
    is_blank,
    updated_rows,
    Call,
    FakeSheets,
};
use plugin_traffic_collector::{
    CanonicalRow,
    Result,
};
pub use publisher::{
    Publication,
    SpreadsheetPublisher,
    REGION_ROWS,
};
use std::{
    future::Future,
    pin::Pin,
};
pub use templates::{
    Template,
    TemplateSet,
};

pub type SheetFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The remote spreadsheet service.
pub trait SpreadsheetService: Send + Sync {
    /// Creates an empty spreadsheet and returns its id.
    fn create_spreadsheet<'a>(&'a self, title: &'a str) -> SheetFuture<'a, String>;

    /// Overwrites `range` with `rows`.
    fn update_range<'a>(&'a self, spreadsheet_id: &'a str, range: &'a str, rows: &'a [CanonicalRow])
        -> SheetFuture<'a, ()>;

    /// Sends a structural request document as-is.
    fn batch_update<'a>(&'a self, spreadsheet_id: &'a str, request: &'a [u8]) -> SheetFuture<'a, ()>;
}

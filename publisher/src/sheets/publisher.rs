use super::{
    SpreadsheetService,
    TemplateSet,
};
use plugin_traffic_collector::{
    AggregationMode,
    CanonicalRow,
    Error,
    Result,
};
use std::iter;

/// Rows covered by every publish. Shorter runs are padded with blank rows so earlier, longer
/// publishes leave nothing behind.
pub const REGION_ROWS: usize = 1000;

/// Outcome of a spreadsheet publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub spreadsheet_id: String,
    /// Whether the spreadsheet was created by this publish.
    pub created: bool,
    /// Templates the service rejected. The cell data was written regardless.
    pub failed_templates: Vec<String>,
}

/// Writes a run's rows into a new or existing spreadsheet, then applies the templates.
pub struct SpreadsheetPublisher {
    service: Box<dyn SpreadsheetService>,
    title: String,
    templates: TemplateSet,
}

impl SpreadsheetPublisher {
    pub fn new(service: impl SpreadsheetService + 'static, title: impl Into<String>, templates: TemplateSet) -> Self {
        Self {
            service: Box::new(service),
            title: title.into(),
            templates,
        }
    }

    /// The sheet region overwritten by a publish of `height` rows.
    pub fn range(mode: &AggregationMode, height: usize) -> String {
        let last_column = match mode {
            AggregationMode::Simplified => 'C',
            AggregationMode::Full { .. } => 'E',
        };
        format!("A1:{last_column}{height}")
    }

    /// Publishes the header for `mode` followed by `rows`. Without `existing_id` a new spreadsheet
    /// is created, so repeated runs without an id never share a spreadsheet.
    #[instrument(level = "info", skip_all, fields(rows = rows.len()))]
    pub async fn publish(
        &self,
        mode: &AggregationMode,
        rows: &[CanonicalRow],
        existing_id: Option<&str>,
    ) -> Result<Publication> {
        let (spreadsheet_id, created) = match existing_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => (id.to_string(), false),
            None => {
                let id = self.service.create_spreadsheet(&self.title).await?;
                if id.is_empty() {
                    return Err(Error::Spreadsheet(eyre::eyre!("the service returned an empty spreadsheet id")));
                }
                info!(spreadsheet_id = %id, title = %self.title, "created spreadsheet");
                (id, true)
            }
        };

        let width = mode.width();
        let written = rows.len() + 1;
        let height = written.max(REGION_ROWS);
        let values = iter::once(mode.header())
            .chain(rows.iter().cloned())
            .chain(iter::repeat_with(|| CanonicalRow::new(Vec::new())).take(height - written))
            .map(|row| row.padded(width))
            .collect::<Vec<_>>();
        self.service
            .update_range(&spreadsheet_id, &Self::range(mode, height), &values)
            .await?;
        info!(spreadsheet_id = %spreadsheet_id, rows = written, "wrote cells");

        // The sort and chart requests address the three simplified columns only.
        if !mode.is_simplified() && !self.templates.is_empty() {
            debug!(templates = ?self.templates.names(), "skipping templates for a full-mode sheet");
        }
        let templates = self.templates.iter().filter(|_| mode.is_simplified());

        let mut failed_templates = Vec::new();
        for template in templates {
            let request = template.render(&spreadsheet_id);
            match self.service.batch_update(&spreadsheet_id, &request).await {
                Ok(()) => debug!(template = %template.name, "applied template"),
                Err(e) => {
                    warn!(template = %template.name, error = %e, "template request failed, cells are kept");
                    failed_templates.push(template.name.clone());
                }
            }
        }

        Ok(Publication {
            spreadsheet_id,
            created,
            failed_templates,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sheets::SheetFuture;
    use plugin_traffic_collector::{
        row,
        Cell,
        MetricCategory,
    };
    use pretty_assertions::assert_eq;
    use std::sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Arc,
        Mutex,
    };

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Create(String),
        Update {
            id: String,
            range: String,
            rows: Vec<CanonicalRow>,
        },
        Batch {
            id: String,
            request: Vec<u8>,
        },
    }

    /// Records every call; shared handles let tests inspect calls after the publisher took ownership.
    #[derive(Clone, Default)]
    pub(crate) struct FakeSheets {
        pub(crate) calls: Arc<Mutex<Vec<Call>>>,
        created: Arc<AtomicUsize>,
        pub(crate) reject_batches: bool,
    }

    impl FakeSheets {
        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SpreadsheetService for FakeSheets {
        fn create_spreadsheet<'a>(&'a self, title: &'a str) -> SheetFuture<'a, String> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(Call::Create(title.to_string()));
                let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(format!("sheet-{n}"))
            })
        }

        fn update_range<'a>(
            &'a self,
            spreadsheet_id: &'a str,
            range: &'a str,
            rows: &'a [CanonicalRow],
        ) -> SheetFuture<'a, ()> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(Call::Update {
                    id: spreadsheet_id.to_string(),
                    range: range.to_string(),
                    rows: rows.to_vec(),
                });
                Ok(())
            })
        }

        fn batch_update<'a>(&'a self, spreadsheet_id: &'a str, request: &'a [u8]) -> SheetFuture<'a, ()> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(Call::Batch {
                    id: spreadsheet_id.to_string(),
                    request: request.to_vec(),
                });
                if self.reject_batches {
                    return Err(Error::Spreadsheet(eyre::eyre!("400 Bad Request")));
                }
                Ok(())
            })
        }
    }

    pub(crate) fn is_blank(row: &CanonicalRow) -> bool {
        row.cells().iter().all(|cell| matches!(cell, Cell::Empty))
    }

    pub(crate) fn updated_rows(sheets: &FakeSheets) -> Vec<CanonicalRow> {
        sheets
            .calls()
            .into_iter()
            .find_map(|call| match call {
                Call::Update { rows, .. } => Some(rows),
                _ => None,
            })
            .unwrap()
    }

    fn templates() -> TemplateSet {
        let dir = temp_dir::TempDir::new().unwrap();
        TemplateSet::load(&["sort".to_string(), "chart".to_string()], dir.path()).unwrap()
    }

    #[tokio::test]
    async fn creates_a_new_spreadsheet_per_run_without_an_id() {
        let sheets = FakeSheets::default();
        let publisher = SpreadsheetPublisher::new(sheets.clone(), "traffic", TemplateSet::none());
        let rows = vec![row!["foo", 6u64, 4u64]];

        let first = publisher
            .publish(&AggregationMode::Simplified, &rows, None)
            .await
            .unwrap();
        let second = publisher
            .publish(&AggregationMode::Simplified, &rows, None)
            .await
            .unwrap();

        assert!(first.created);
        assert!(!first.spreadsheet_id.is_empty());
        assert_ne!(first.spreadsheet_id, second.spreadsheet_id);
    }

    #[tokio::test]
    async fn header_then_rows_then_templates_in_order() {
        let sheets = FakeSheets::default();
        let publisher = SpreadsheetPublisher::new(sheets.clone(), "traffic", templates());
        let publication = publisher
            .publish(&AggregationMode::Simplified, &[row!["foo", 6u64]], Some("existing"))
            .await
            .unwrap();

        assert_eq!(
            publication,
            Publication {
                spreadsheet_id: "existing".to_string(),
                created: false,
                failed_templates: Vec::new(),
            }
        );

        let calls = sheets.calls();
        assert_eq!(calls.len(), 3);
        let Call::Update { id, range, rows } = &calls[0] else {
            panic!("expected an update first");
        };
        assert_eq!(id, "existing");
        assert_eq!(range, "A1:C1000");
        assert_eq!(
            rows[..2],
            [
                row!["repo", "count", "uniques"],
                CanonicalRow::new(vec![Cell::text("foo"), Cell::count(6), Cell::Empty]),
            ]
        );
        assert_eq!(rows.len(), REGION_ROWS);
        assert!(rows[2..].iter().all(is_blank));
        let batches = calls[1..]
            .iter()
            .map(|call| match call {
                Call::Batch { request, .. } => serde_json::from_slice::<serde_json::Value>(request).unwrap(),
                other => panic!("unexpected call {other:?}"),
            })
            .collect::<Vec<_>>();
        assert!(batches[0]["requests"][0].get("sortRange").is_some());
        assert!(batches[1]["requests"][0].get("addChart").is_some());
    }

    #[tokio::test]
    async fn full_mode_uses_the_wide_header() {
        let sheets = FakeSheets::default();
        let publisher = SpreadsheetPublisher::new(sheets.clone(), "traffic", TemplateSet::none());
        let mode = AggregationMode::Full {
            categories: vec![MetricCategory::Clones],
        };
        publisher
            .publish(&mode, &[row!["clones: total_count", 3u64]], Some("existing"))
            .await
            .unwrap();

        let Call::Update { range, rows, .. } = &sheets.calls()[0] else {
            panic!("expected an update");
        };
        assert_eq!(range, "A1:E1000");
        assert_eq!(rows[0], row!["repo", "count", "uniques", "date", "name"]);
        assert!(rows.iter().all(|row| row.len() == CanonicalRow::WIDTH));
    }

    #[tokio::test]
    async fn failed_templates_do_not_undo_the_cell_write() {
        let sheets = FakeSheets {
            reject_batches: true,
            ..FakeSheets::default()
        };
        let publisher = SpreadsheetPublisher::new(sheets.clone(), "traffic", templates());
        let publication = publisher
            .publish(&AggregationMode::Simplified, &[], Some("existing"))
            .await
            .unwrap();

        assert_eq!(publication.failed_templates, vec!["sort".to_string(), "chart".to_string()]);
        assert!(matches!(sheets.calls()[0], Call::Update { .. }));
    }

    #[tokio::test]
    async fn resolved_id_is_substituted_into_templates() {
        let sheets = FakeSheets::default();
        let dir = temp_dir::TempDir::new().unwrap();
        std::fs::write(dir.child("sort.json"), r#"{"id":"{{SPREADSHEET_ID}}"}"#).unwrap();
        let templates = TemplateSet::load(&["sort".to_string()], dir.path()).unwrap();
        let publisher = SpreadsheetPublisher::new(sheets.clone(), "traffic", templates);

        publisher
            .publish(&AggregationMode::Simplified, &[], None)
            .await
            .unwrap();

        assert_eq!(
            sheets.calls().last(),
            Some(&Call::Batch {
                id: "sheet-1".to_string(),
                request: br#"{"id":"sheet-1"}"#.to_vec(),
            })
        );
    }

    #[tokio::test]
    async fn full_mode_sheets_are_not_sorted_or_charted() {
        let sheets = FakeSheets::default();
        let publisher = SpreadsheetPublisher::new(sheets.clone(), "traffic", templates());
        let mode = AggregationMode::Full {
            categories: vec![MetricCategory::Referrers],
        };
        let rows = vec![row!["referrers"], row!["", 10u64, 4u64, "", "github.com"]];

        let publication = publisher.publish(&mode, &rows, Some("existing")).await.unwrap();

        assert!(publication.failed_templates.is_empty());
        let calls = sheets.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls.iter().any(|call| matches!(call, Call::Batch { .. })));
        assert_eq!(updated_rows(&sheets)[2], row!["", 10u64, 4u64, "", "github.com"]);
    }

    #[tokio::test]
    async fn republishing_fewer_rows_blanks_the_rest_of_the_region() {
        let sheets = FakeSheets::default();
        let publisher = SpreadsheetPublisher::new(sheets.clone(), "traffic", TemplateSet::none());
        let long = (0..5u64).map(|n| row![format!("repo{n}"), n, n]).collect::<Vec<_>>();
        publisher
            .publish(&AggregationMode::Simplified, &long, Some("existing"))
            .await
            .unwrap();
        publisher
            .publish(&AggregationMode::Simplified, &long[..1], Some("existing"))
            .await
            .unwrap();

        let updates = sheets
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update { range, rows, .. } => Some((range, rows)),
                _ => None,
            })
            .collect::<Vec<_>>();
        let (first_range, first) = &updates[0];
        let (second_range, second) = &updates[1];
        assert_eq!(first_range, second_range);
        assert_eq!(first.len(), second.len());
        assert_eq!(second[1], row!["repo0", 0u64, 0u64]);
        assert!(second[2..].iter().all(is_blank));
    }

    #[tokio::test]
    async fn large_runs_extend_the_region() {
        let sheets = FakeSheets::default();
        let publisher = SpreadsheetPublisher::new(sheets.clone(), "traffic", TemplateSet::none());
        let rows = (0..REGION_ROWS as u64).map(|n| row!["repo", n, n]).collect::<Vec<_>>();
        publisher
            .publish(&AggregationMode::Simplified, &rows, Some("existing"))
            .await
            .unwrap();

        let Call::Update { range, rows: written, .. } = &sheets.calls()[0] else {
            panic!("expected an update");
        };
        assert_eq!(range, "A1:C1001");
        assert_eq!(written.len(), REGION_ROWS + 1);
        assert!(!written.iter().any(is_blank));
    }
}

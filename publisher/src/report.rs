use crate::router::{
    RunArtifact,
    SinkTarget,
};
use comfy_table::{
    presets,
    Attribute,
    Cell,
    Color,
    ContentArrangement,
    Table,
};
use plugin_traffic_collector::Repository;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryOutcome {
    Published { rows: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReportEntry {
    repository: String,
    outcome: RepositoryOutcome,
}

/// Summary of one collection run, printed once the sink is closed.
#[derive(Debug, Clone)]
pub struct RunReport {
    sink: SinkTarget,
    entries: Vec<ReportEntry>,
    artifact: Option<RunArtifact>,
}

impl RunReport {
    pub fn new(sink: SinkTarget) -> Self {
        Self {
            sink,
            entries: Vec::new(),
            artifact: None,
        }
    }

    pub fn record_published(&mut self, repository: &Repository, rows: usize) {
        self.entries.push(ReportEntry {
            repository: repository.full_name.clone(),
            outcome: RepositoryOutcome::Published { rows },
        });
    }

    pub fn record_failure(&mut self, repository: &Repository, reason: impl fmt::Display) {
        self.entries.push(ReportEntry {
            repository: repository.full_name.clone(),
            outcome: RepositoryOutcome::Failed {
                reason: reason.to_string(),
            },
        });
    }

    pub fn set_artifact(&mut self, artifact: RunArtifact) {
        self.artifact = Some(artifact);
    }

    pub fn artifact(&self) -> Option<&RunArtifact> {
        self.artifact.as_ref()
    }

    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.outcome, RepositoryOutcome::Failed { .. }))
            .count()
    }

    /// True when at least one repository was attempted and none made it into the sink.
    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty() && self.failures() == self.entries.len()
    }

    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Repository").add_attribute(Attribute::Bold),
                Cell::new("Rows").add_attribute(Attribute::Bold),
                Cell::new("Status").add_attribute(Attribute::Bold),
            ]);

        for entry in &self.entries {
            let (rows, status) = match &entry.outcome {
                RepositoryOutcome::Published { rows } => (rows.to_string(), Cell::new("ok").fg(Color::Green)),
                RepositoryOutcome::Failed { reason } => ("-".to_string(), Cell::new(reason).fg(Color::Red)),
            };
            table.add_row(vec![Cell::new(&entry.repository), Cell::new(rows), status]);
        }
        table
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.table())?;
        write!(
            f,
            "{} repositories, {} failed, sink: {}",
            self.entries.len(),
            self.failures(),
            self.sink
        )?;
        if let Some(artifact) = &self.artifact {
            write!(f, "\noutput: {artifact}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn repository(name: &str) -> Repository {
        Repository::with_prefix("freenas", format!("iocage-plugin-{name}"), "iocage-plugin-").unwrap()
    }

    #[test]
    fn counts_failures() {
        let mut report = RunReport::new(SinkTarget::IndividualFiles);
        assert!(!report.all_failed());

        report.record_failure(&repository("foo"), "disk full");
        assert!(report.all_failed());

        report.record_published(&repository("bar"), 12);
        assert_eq!(report.failures(), 1);
        assert!(!report.all_failed());
    }

    #[test]
    fn summary_names_the_sink_and_artifact() {
        let mut report = RunReport::new(SinkTarget::SingleFile);
        report.record_published(&repository("foo"), 1);
        report.set_artifact(RunArtifact::File(PathBuf::from("out/data_plugins")));

        let rendered = report.to_string();
        assert!(rendered.contains("iocage-plugin-foo"));
        assert!(rendered.contains("ok"));
        let tail = rendered.lines().rev().take(2).collect::<Vec<_>>();
        assert_eq!(tail, vec!["output: out/data_plugins", "1 repositories, 0 failed, sink: single file"]);
    }

    #[test]
    fn one_table_row_per_repository() {
        let mut report = RunReport::new(SinkTarget::JsonSnapshot);
        report.record_published(&repository("foo"), 1);
        report.record_failure(&repository("bar"), "404 Not Found");
        assert_eq!(report.table().row_iter().count(), 2);
    }
}

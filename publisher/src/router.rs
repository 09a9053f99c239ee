use crate::{
    sheets::{
        Publication,
        SpreadsheetPublisher,
    },
    snapshot::Snapshot,
    text::TextFile,
};
use plugin_traffic_collector::{
    row,
    AggregationMode,
    CanonicalRow,
    Error,
    RepositoryBlock,
    Result,
};
use std::{
    fmt,
    fs,
    io::ErrorKind,
    path::{
        Path,
        PathBuf,
    },
};

pub const INDIVIDUAL_FILE_PREFIX: &str = "data_";
pub const SINGLE_FILE_NAME: &str = "data_plugins";

/// Where one run's blocks go. Selected once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    IndividualFiles,
    SingleFile,
    JsonSnapshot,
    Spreadsheet { id: Option<String> },
}

impl SinkTarget {
    /// Whether a failed write only affects the repository being routed.
    pub fn isolates_repositories(&self) -> bool {
        matches!(self, SinkTarget::IndividualFiles)
    }
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::IndividualFiles => write!(f, "individual files"),
            SinkTarget::SingleFile => write!(f, "single file"),
            SinkTarget::JsonSnapshot => write!(f, "json snapshot"),
            SinkTarget::Spreadsheet { id: Some(id) } => write!(f, "spreadsheet {id}"),
            SinkTarget::Spreadsheet { id: None } => write!(f, "new spreadsheet"),
        }
    }
}

/// What a finished run left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunArtifact {
    Files(Vec<PathBuf>),
    File(PathBuf),
    Spreadsheet(Publication),
}

impl fmt::Display for RunArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunArtifact::Files(paths) if paths.is_empty() => write!(f, "no files written"),
            RunArtifact::Files(paths) => {
                let paths = paths.iter().map(|path| path.display().to_string()).collect::<Vec<_>>();
                write!(f, "{}", paths.join(", "))
            }
            RunArtifact::File(path) => write!(f, "{}", path.display()),
            RunArtifact::Spreadsheet(publication) => {
                let verb = if publication.created { "created" } else { "updated" };
                write!(f, "spreadsheet {} ({verb})", publication.spreadsheet_id)?;
                if !publication.failed_templates.is_empty() {
                    write!(f, ", failed templates: {}", publication.failed_templates.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

enum SinkState {
    Individual {
        dir: PathBuf,
        written: Vec<PathBuf>,
    },
    Single(TextFile),
    Json {
        dir: PathBuf,
        snapshot: Snapshot,
    },
    Spreadsheet {
        id: Option<String>,
        publisher: SpreadsheetPublisher,
        rows: Vec<CanonicalRow>,
    },
}

/// Streams a run's repository blocks into its sink.
///
/// The router is opened before the first repository and finished after the last. Shared
/// destinations (the combined file, the snapshot, the spreadsheet rows) live inside the router,
/// so dropping it on an early return releases them. The spreadsheet is only contacted from
/// [`OutputRouter::finish`].
pub struct OutputRouter {
    mode: AggregationMode,
    state: SinkState,
}

impl OutputRouter {
    pub fn open(
        target: SinkTarget,
        mode: AggregationMode,
        output_dir: &Path,
        captured_at: i64,
        publisher: Option<SpreadsheetPublisher>,
    ) -> Result<Self> {
        let state = match target {
            SinkTarget::IndividualFiles => SinkState::Individual {
                dir: output_dir.to_path_buf(),
                written: Vec::new(),
            },
            SinkTarget::SingleFile => {
                let mut file = TextFile::create(output_dir.join(SINGLE_FILE_NAME), mode.width())?;
                file.write_row(&mode.header())?;
                SinkState::Single(file)
            }
            SinkTarget::JsonSnapshot => SinkState::Json {
                dir: output_dir.to_path_buf(),
                snapshot: Snapshot::new(captured_at),
            },
            SinkTarget::Spreadsheet { id } => {
                let publisher = publisher.ok_or_else(|| {
                    Error::Configuration("the spreadsheet sink needs a spreadsheet service".to_string())
                })?;
                SinkState::Spreadsheet {
                    id,
                    publisher,
                    rows: Vec::new(),
                }
            }
        };
        Ok(Self { mode, state })
    }

    pub fn mode(&self) -> &AggregationMode {
        &self.mode
    }

    pub fn route(&mut self, block: &RepositoryBlock) -> Result<()> {
        let full = !self.mode.is_simplified();
        match &mut self.state {
            SinkState::Individual { dir, written } => {
                let path = dir.join(format!("{INDIVIDUAL_FILE_PREFIX}{}", block.repository.display_name));
                let file = TextFile::create(&path, self.mode.width())?;
                match write_block(file, &self.mode.header(), &block.rows) {
                    Ok(path) => written.push(path),
                    Err(e) => {
                        discard_partial(&path);
                        return Err(e);
                    }
                }
            }
            SinkState::Single(file) => {
                if full {
                    file.write_line(&block.repository.full_name)?;
                }
                for row in &block.rows {
                    file.write_row(row)?;
                }
            }
            SinkState::Json { snapshot, .. } => snapshot.insert(block),
            SinkState::Spreadsheet { rows, .. } => {
                if full {
                    rows.push(row![block.repository.display_name.as_str()]);
                }
                rows.extend(block.rows.iter().cloned());
            }
        }
        trace!(repository = %block.repository.full_name, rows = block.rows.len(), "routed");
        Ok(())
    }

    /// Closes the sink. File sinks are synced to disk; the spreadsheet receives every buffered row.
    pub async fn finish(self) -> Result<RunArtifact> {
        let Self { mode, state } = self;
        let artifact = match state {
            SinkState::Individual { written, .. } => RunArtifact::Files(written),
            SinkState::Single(file) => RunArtifact::File(file.finish()?),
            SinkState::Json { dir, snapshot } => RunArtifact::File(snapshot.write_to(&dir)?),
            SinkState::Spreadsheet { id, publisher, rows } => {
                RunArtifact::Spreadsheet(publisher.publish(&mode, &rows, id.as_deref()).await?)
            }
        };
        info!(%artifact, "run output complete");
        Ok(artifact)
    }
}

fn write_block(mut file: TextFile, header: &CanonicalRow, rows: &[CanonicalRow]) -> Result<PathBuf> {
    file.write_row(header)?;
    for row in rows {
        file.write_row(row)?;
    }
    file.finish()
}

/// A repository whose output failed leaves no truncated file behind.
fn discard_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "cannot remove partial output"),
    }
}

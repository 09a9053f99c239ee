use chrono::Utc;
use color_eyre::Result;
use eyre::{
    bail,
    Context as _,
};
use plugin_traffic_collector::{
    CategoryAggregator,
    ErrorScope,
    GithubSource,
    MetricSource,
};
use plugin_traffic_config::{
    Args,
    Command,
    Config,
    MergeArgs,
    SinkKind,
};
use plugin_traffic_publisher::{
    discover_snapshots,
    merge,
    GoogleSheets,
    MergeOutcome,
    OutputRouter,
    RunReport,
    SinkTarget,
    SpreadsheetPublisher,
    TemplateSet,
    MERGED_FILE_NAME,
};
use std::{
    fs,
    path::PathBuf,
};

pub struct App {
    args: Args,
}

impl App {
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    pub async fn run(self) -> Result<()> {
        match self.args.command() {
            Command::Collect(args) => {
                let config = Config::new(args)?;
                debug!(
                    config_dir = %config.config_dir().display(),
                    data_dir = %config.data_dir().display(),
                    "directories"
                );
                let report = collect(&config).await?;
                println!("{report}");
                if report.all_failed() {
                    bail!("none of the {} repositories could be collected", report.failures());
                }
                Ok(())
            }
            Command::Merge(args) => {
                if let Some(output) = merge_snapshots(&args)? {
                    println!("{}", output.display());
                }
                Ok(())
            }
        }
    }
}

pub fn sink_target(sink: SinkKind, config: &Config) -> SinkTarget {
    match sink {
        SinkKind::Individual => SinkTarget::IndividualFiles,
        SinkKind::Single => SinkTarget::SingleFile,
        SinkKind::Json => SinkTarget::JsonSnapshot,
        SinkKind::Spreadsheet => SinkTarget::Spreadsheet {
            id: config.spreadsheet.id.clone(),
        },
    }
}

/// Validates `config`, wires up the GitHub source and, for the spreadsheet sink, the publisher,
/// then runs one collection.
pub async fn collect(config: &Config) -> Result<RunReport> {
    let sink = config.validate()?;
    let source = GithubSource::new(
        config.github_api_url.clone(),
        config.github_token.clone().unwrap_or_default(),
        config.weekly_views,
    )?;

    let publisher = match sink {
        SinkKind::Spreadsheet => {
            let templates = TemplateSet::load(&config.spreadsheet.templates, &config.templates_dir())?;
            let sheets = GoogleSheets::new(
                config.spreadsheet.api_url.clone(),
                config.spreadsheet.access_token.clone().unwrap_or_default(),
            )?;
            Some(SpreadsheetPublisher::new(sheets, config.spreadsheet.title.clone(), templates))
        }
        SinkKind::Individual | SinkKind::Single | SinkKind::Json => None,
    };

    run_collection(config, sink, &source, publisher, Utc::now().timestamp()).await
}

/// Visits every repository in listing order and routes its block to the sink.
///
/// Repositories whose traffic cannot be fetched are skipped and reported. Write failures skip the
/// repository only when the sink gives each repository its own file; otherwise the run stops.
pub async fn run_collection<S: MetricSource + ?Sized>(
    config: &Config,
    sink: SinkKind,
    source: &S,
    publisher: Option<SpreadsheetPublisher>,
    captured_at: i64,
) -> Result<RunReport> {
    let mode = config.aggregation_mode();
    let target = sink_target(sink, config);

    let repositories = source.list_repositories(&config.repository_filter()).await?;
    info!(
        organization = %config.organization,
        repositories = repositories.len(),
        sink = %target,
        "collecting traffic"
    );

    fs::create_dir_all(&config.output_dir)
        .wrap_err_with(|| format!("Failed to create {}", config.output_dir.display()))?;
    let mut router = OutputRouter::open(target.clone(), mode.clone(), &config.output_dir, captured_at, publisher)?;
    let aggregator = CategoryAggregator::new(source);
    let mut report = RunReport::new(target.clone());

    for repository in &repositories {
        let block = match aggregator.aggregate(repository, &mode).await {
            Ok(block) => block,
            Err(e) if e.scope() == ErrorScope::Repository => {
                warn!(repository = %repository.full_name, error = %e, "skipping repository");
                report.record_failure(repository, &e);
                continue;
            }
            Err(e) => {
                error!(repository = %repository.full_name, error = %e, "aborting run");
                return Err(e.into());
            }
        };

        match router.route(&block) {
            Ok(()) => report.record_published(repository, block.rows.len()),
            Err(e) if target.isolates_repositories() => {
                warn!(repository = %repository.full_name, error = %e, "output for repository lost");
                report.record_failure(repository, &e);
            }
            Err(e) => {
                error!(repository = %repository.full_name, error = %e, "aborting run");
                return Err(e.into());
            }
        }
    }

    report.set_artifact(router.finish().await?);
    Ok(report)
}

/// Merges the snapshots named in `args`, or every snapshot in its input directory, and returns
/// the written path. Returns `None` when there was nothing to merge.
pub fn merge_snapshots(args: &MergeArgs) -> Result<Option<PathBuf>> {
    let inputs = if args.files.is_empty() {
        discover_snapshots(&args.input_dir)?
    } else {
        args.files.clone()
    };

    match merge(&inputs)? {
        MergeOutcome::NothingToMerge => {
            info!(input_dir = %args.input_dir.display(), "nothing to merge");
            Ok(None)
        }
        MergeOutcome::Merged(document) => {
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| args.input_dir.join(MERGED_FILE_NAME));
            document.write_to(&output)?;
            info!(
                inputs = inputs.len(),
                repositories = document.repositories.len(),
                output = %output.display(),
                "merged snapshots"
            );
            Ok(Some(output))
        }
    }
}

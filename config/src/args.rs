use crate::SinkKind;
use clap::{
    Parser,
    Subcommand,
};
use plugin_traffic_collector::MetricCategory;
use std::path::PathBuf;

/// Collects GitHub traffic for iocage plugin repositories and publishes it.
#[derive(Parser, Debug, Clone)]
#[command(author, version = version(), about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub collect: CollectArgs,

    /// Log debug output (`RUST_LOG` takes precedence).
    #[clap(long, global = true, action)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect traffic and publish it (the default).
    Collect(CollectArgs),
    /// Merge JSON snapshots written by earlier runs into one document.
    Merge(MergeArgs),
}

impl Args {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Collect(self.collect.clone()))
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct CollectArgs {
    /// Where to publish the collected rows.
    #[clap(long, value_name = "SINK")]
    pub sink: Option<SinkKind>,

    /// Create one file per repository (same as `--sink individual`).
    #[clap(short = 'i', long, action, conflicts_with_all = ["single", "json", "sink"])]
    pub individual: bool,

    /// Create a single file for all repositories (same as `--sink single`).
    #[clap(short = 's', long, action, conflicts_with_all = ["json", "sink"])]
    pub single: bool,

    /// Write a timestamped JSON snapshot (same as `--sink json`).
    #[clap(short = 'j', long, action, conflicts_with = "sink")]
    pub json: bool,

    /// Gather every selected category instead of clone totals only.
    #[clap(long, action)]
    pub full: bool,

    /// Get referrers.
    #[clap(short = 'r', long, action)]
    pub referrers: bool,

    /// Get paths.
    #[clap(short = 'p', long, action)]
    pub paths: bool,

    /// Get views.
    #[clap(short = 'v', long, action)]
    pub views: bool,

    /// Get clones.
    #[clap(short = 'c', long, action)]
    pub clones: bool,

    /// Category to gather, repeatable; output follows the order given.
    #[clap(long = "category", value_name = "CATEGORY")]
    pub category: Vec<MetricCategory>,

    /// Skip the weekly views breakdown.
    #[clap(long, action)]
    pub no_weekly: bool,

    /// Directory the file sinks write into.
    #[clap(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Organization owning the plugin repositories.
    #[clap(long, value_name = "ORG")]
    pub organization: Option<String>,

    /// Name prefix selecting the plugin repositories.
    #[clap(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// GitHub access token.
    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// Existing spreadsheet to overwrite; a new one is created when absent.
    #[clap(long, value_name = "ID")]
    pub spreadsheet_id: Option<String>,

    /// Access token for the spreadsheet service.
    #[clap(long, env = "SHEETS_ACCESS_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub sheets_token: Option<String>,
}

impl CollectArgs {
    /// The sink chosen on the command line, if any.
    pub fn sink(&self) -> Option<SinkKind> {
        match (self.individual, self.single, self.json) {
            (true, _, _) => Some(SinkKind::Individual),
            (_, true, _) => Some(SinkKind::Single),
            (_, _, true) => Some(SinkKind::Json),
            _ => self.sink,
        }
    }

    /// `--category` values in the order given, followed by the short category flags.
    pub fn categories(&self) -> Vec<MetricCategory> {
        let flags = [
            (self.referrers, MetricCategory::Referrers),
            (self.paths, MetricCategory::Paths),
            (self.views, MetricCategory::Views),
            (self.clones, MetricCategory::Clones),
        ];
        let mut categories = Vec::new();
        let selected = self
            .category
            .iter()
            .copied()
            .chain(flags.into_iter().filter(|(set, _)| *set).map(|(_, category)| category));
        for category in selected {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }

    pub fn wants_full(&self) -> bool {
        self.full || !self.categories().is_empty()
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct MergeArgs {
    /// Directory searched for `data_plugins_<timestamp>.json` snapshots.
    #[clap(long, value_name = "DIR", default_value = ".")]
    pub input_dir: PathBuf,

    /// Where to write the merged document (defaults to `data_plugins_merged.json` in the input directory).
    #[clap(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Explicit snapshot files; disables the directory search.
    #[clap(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for CollectArgs {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(sink) = self.sink() {
                cache.insert("sink".to_string(), sink.to_string().into());
            }
            if self.wants_full() {
                cache.insert("mode".to_string(), "full".into());
            }
            let categories = self.categories();
            if !categories.is_empty() {
                let categories = categories
                    .iter()
                    .map(|category| Value::from(category.to_string()))
                    .collect::<Vec<_>>();
                cache.insert("categories".to_string(), categories.into());
            }
            if self.no_weekly {
                cache.insert("weekly_views".to_string(), false.into());
            }
            if let Some(dir) = &self.output_dir {
                cache.insert("output_dir".to_string(), dir.display().to_string().into());
            }
            if let Some(organization) = &self.organization {
                cache.insert("organization".to_string(), organization.clone().into());
            }
            if let Some(prefix) = &self.prefix {
                cache.insert("name_prefix".to_string(), prefix.clone().into());
            }
            if let Some(token) = &self.github_token {
                cache.insert("github_token".to_string(), token.clone().into());
            }
            if let Some(id) = &self.spreadsheet_id {
                cache.insert("spreadsheet.id".to_string(), id.clone().into());
            }
            if let Some(token) = &self.sheets_token {
                cache.insert("spreadsheet.access_token".to_string(), token.clone().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_dir_path = crate::get_config_dir().display().to_string();
    let data_dir_path = crate::get_data_dir().display().to_string();

    format!(
        "\
{version}
Authors: {author}

Config directory: {config_dir_path}
Data directory: {data_dir_path}",
        version = clap::crate_version!()
    )
}

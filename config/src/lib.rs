#[macro_use]
extern crate tracing;

mod app_config;
mod args;

use app_config::AppConfig;
pub use app_config::{
    get_config_dir,
    get_data_dir,
};
pub use args::{
    Args,
    CollectArgs,
    Command,
    MergeArgs,
};
use plugin_traffic_collector::{
    AggregationMode,
    Error,
    MetricCategory,
    RepositoryFilter,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::path::{
    Path,
    PathBuf,
};
use strum::Display;
use url::Url;

/// Output selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SinkKind {
    /// One `data_<repo>` file per repository.
    Individual,
    /// One `data_plugins` file.
    Single,
    /// One `data_plugins_<timestamp>.json` snapshot.
    Json,
    /// A remote spreadsheet.
    Spreadsheet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    #[default]
    Simplified,
    Full,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpreadsheetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    pub api_url: Url,
    /// Post-processing templates for simplified sheets, applied sort first, then chart.
    #[serde(default)]
    pub templates: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    pub app_config: AppConfig,
    pub organization: String,
    pub name_prefix: String,
    #[serde(default, skip_serializing)]
    pub github_token: Option<String>,
    pub github_api_url: Url,
    #[serde(default)]
    pub sink: Option<SinkKind>,
    #[serde(default)]
    pub mode: ModeKind,
    #[serde(default)]
    pub categories: Vec<MetricCategory>,
    #[serde(default)]
    pub weekly_views: bool,
    pub output_dir: PathBuf,
    pub spreadsheet: SpreadsheetConfig,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    /// Layers the built-in defaults, `config.yaml` from the config directory, then `args`.
    pub fn new(args: CollectArgs) -> Result<Self, config::ConfigError> {
        Self::load(&get_config_dir(), &get_data_dir(), args)
    }

    fn load(config_dir: &Path, data_dir: &Path, args: CollectArgs) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.display().to_string())?
            .set_default("config_dir", config_dir.display().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let config_files = [("config.yaml", config::FileFormat::Yaml)];

        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
        }

        builder = builder.add_source(args);

        let cfg: Self = builder.build()?.try_deserialize()?;
        debug!(
            sink = ?cfg.sink,
            mode = ?cfg.mode,
            github_token_len = cfg.github_token.as_ref().map_or(0, String::len),
            "configuration loaded"
        );

        Ok(cfg)
    }

    pub fn config_dir(&self) -> &Path {
        &self.app_config.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.app_config.data_dir
    }

    /// Directory holding template overrides.
    pub fn templates_dir(&self) -> PathBuf {
        self.config_dir().join("templates")
    }

    pub fn aggregation_mode(&self) -> AggregationMode {
        match self.mode {
            ModeKind::Simplified => AggregationMode::Simplified,
            ModeKind::Full => AggregationMode::Full {
                categories: self.categories.clone(),
            },
        }
    }

    pub fn repository_filter(&self) -> RepositoryFilter {
        RepositoryFilter::new(self.organization.clone(), self.name_prefix.clone())
    }

    /// Rejects configurations that cannot run, before anything talks to the network.
    pub fn validate(&self) -> Result<SinkKind, Error> {
        if self.github_token.as_deref().is_none_or(|token| token.trim().is_empty()) {
            return Err(Error::Configuration(
                "a GitHub access token is required (--github-token or GITHUB_TOKEN)".to_string(),
            ));
        }
        let Some(sink) = self.sink else {
            return Err(Error::Configuration(
                "specify an output: individual (-i), single (-s), json (-j) or --sink spreadsheet".to_string(),
            ));
        };
        if sink == SinkKind::Spreadsheet
            && self
                .spreadsheet
                .access_token
                .as_deref()
                .is_none_or(|token| token.trim().is_empty())
        {
            return Err(Error::Configuration(
                "the spreadsheet sink needs an access token (--sheets-token or SHEETS_ACCESS_TOKEN)".to_string(),
            ));
        }
        if self.mode == ModeKind::Full && self.categories.is_empty() {
            return Err(Error::Configuration("full mode needs at least one category".to_string()));
        }
        Ok(sink)
    }
}

use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    env,
    path::{
        Path,
        PathBuf,
    },
};

/// Where the run keeps its state (`data_dir`) and looks for `config.yaml` and template
/// overrides (`config_dir`).
#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub(crate) data_dir: PathBuf,
    #[serde(default)]
    pub(crate) config_dir: PathBuf,
}

pub const DATA_DIR_ENV: &str = "PLUGIN_TRAFFIC_DATA";
pub const CONFIG_DIR_ENV: &str = "PLUGIN_TRAFFIC_CONFIG";

lazy_static::lazy_static! {
    static ref PROJECT_DIRS: Option<ProjectDirs> = ProjectDirs::from("org", "freenas", "plugin-traffic");
}

/// An explicit, non-empty `env_var` wins, then the platform directory, then `./<fallback>`.
fn resolve_dir(env_var: &str, platform: fn(&ProjectDirs) -> &Path, fallback: &str) -> PathBuf {
    env::var_os(env_var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| PROJECT_DIRS.as_ref().map(|dirs| platform(dirs).to_path_buf()))
        .unwrap_or_else(|| Path::new(".").join(fallback))
}

pub fn get_data_dir() -> PathBuf {
    resolve_dir(DATA_DIR_ENV, ProjectDirs::data_local_dir, ".data")
}

pub fn get_config_dir() -> PathBuf {
    resolve_dir(CONFIG_DIR_ENV, ProjectDirs::config_local_dir, ".config")
}

#[macro_use]
extern crate tracing;

mod app;
mod errors;
mod logging;

pub use app::{
    collect,
    merge_snapshots,
    run_collection,
    sink_target,
    App,
};
pub use errors::init_errors;
pub use logging::init_logging;
pub use plugin_traffic_config::Args;

use color_eyre::Result;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

const CRATES: [&str; 4] = [
    "plugin_traffic",
    "plugin_traffic_collector",
    "plugin_traffic_config",
    "plugin_traffic_publisher",
];

/// Filter used when `RUST_LOG` is not set.
fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|krate| format!("{krate}={level}")));
    directives.join(",")
}

/// Logs to stderr so the run report on stdout stays clean.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directives(verbose)))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}

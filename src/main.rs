use clap::Parser;
use color_eyre::Result;
use plugin_traffic::{
    init_errors,
    init_logging,
    App,
    Args,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let args = Args::parse();
    init_logging(args.verbose)?;
    App::new(args).run().await
}

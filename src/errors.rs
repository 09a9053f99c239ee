use color_eyre::Result;

/// Installs the `color_eyre` report hook and a panic hook: `better-panic` backtraces in debug
/// builds, a `human-panic` crash report in release builds.
pub fn init_errors() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        #[cfg(not(debug_assertions))]
        {
            use human_panic::{
                handle_dump,
                print_msg,
                Metadata,
            };
            let metadata = Metadata::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
                .authors(env!("CARGO_PKG_AUTHORS").replace(':', ", "));
            let file_path = handle_dump(&metadata, panic_info);
            // Nothing sensible is left to do if the message cannot be printed.
            let _ = print_msg(file_path, &metadata);
        }

        let report = panic_hook.panic_report(panic_info).to_string();
        error!("{report}");

        #[cfg(debug_assertions)]
        {
            better_panic::Settings::auto()
                .most_recent_first(false)
                .lineno_suffix(true)
                .verbosity(better_panic::Verbosity::Full)
                .create_panic_handler()(panic_info);
        }

        std::process::exit(1);
    }));
    Ok(())
}

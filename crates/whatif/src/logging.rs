use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to stderr.
///
/// Stdout is reserved for report output, so all diagnostics go to stderr.
/// The `RUST_LOG` environment variable, when set, takes precedence over the
/// `level` argument.
pub fn init_logging(level: &str) {
    let default_filter = format!("whatif={level},whatif_core={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .init();
}

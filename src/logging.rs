use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Installs the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Log lines go to stderr so command output on stdout stays pipeable.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}

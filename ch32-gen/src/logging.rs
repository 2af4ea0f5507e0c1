use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[clap(rename_all = "UPPER")]
pub enum LevelFilter {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LevelFilter {
    fn into_tracing(self) -> tracing::level_filters::LevelFilter {
        match self {
            Self::Off => tracing::level_filters::LevelFilter::OFF,
            Self::Error => tracing::level_filters::LevelFilter::ERROR,
            Self::Warn => tracing::level_filters::LevelFilter::WARN,
            Self::Info => tracing::level_filters::LevelFilter::INFO,
            Self::Debug => tracing::level_filters::LevelFilter::DEBUG,
            Self::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

/// Sets up logging to stderr, so stdout only carries command output.
///
/// * `level` - The log level to use. If `None`, falls back to `RUST_LOG` in the environment.
/// * `fallback` - The log level used when neither `level` nor `RUST_LOG` is given.
pub fn setup_logging(level: Option<LevelFilter>, fallback: LevelFilter) {
    let filter = match level {
        // Given on the command line, ignore RUST_LOG.
        Some(filter) => EnvFilter::builder()
            .with_default_directive(filter.into_tracing().into())
            .parse_lossy(""),
        // Use RUST_LOG or the command's fallback.
        None => EnvFilter::builder()
            .with_default_directive(fallback.into_tracing().into())
            .from_env_lossy(),
    };

    tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

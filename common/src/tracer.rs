//! Installs the global [tracing] subscriber.
use thiserror::Error;
use tracing_subscriber::{EnvFilter, filter::ParseError};

#[derive(Debug, Error)]
pub enum TracerError {
    #[error("Invalid log filter directive: {0}")]
    Filter(#[from] ParseError),
    #[error("Invalid RUST_LOG: {0}")]
    Environment(#[source] ParseError),
    #[error("Cannot install tracing subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Options for [init_tracer].
#[derive(Debug, Clone)]
pub struct TracerOptions<'a> {
    /// Filter used when `RUST_LOG` is not set.
    default_directive: &'a str,
    /// Emit ANSI colour codes.
    ansi: bool,
}

impl<'a> TracerOptions<'a> {
    pub fn new(default_directive: &'a str) -> Self {
        Self {
            default_directive,
            ansi: true,
        }
    }

    pub fn with_ansi(self, ansi: bool) -> Self {
        Self { ansi, ..self }
    }
}

/// Installs a formatting subscriber writing to stderr.
///
/// The `RUST_LOG` environment variable takes precedence over the default directive
/// given in `options`. An invalid `RUST_LOG` is an error rather than being ignored.
pub fn init_tracer(options: TracerOptions) -> Result<(), TracerError> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(from_env.as_deref(), options.default_directive)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(options.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(TracerError::Install)
}

fn build_filter(from_env: Option<&str>, default_directive: &str) -> Result<EnvFilter, TracerError> {
    match from_env {
        Some(directives) => EnvFilter::try_new(directives).map_err(TracerError::Environment),
        None => Ok(EnvFilter::try_new(default_directive)?),
    }
}

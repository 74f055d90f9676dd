//! Types, constants and helpers shared by the crates of this workspace.
pub mod metrics;
pub mod tracer;

use chrono::{DateTime, Utc};

pub use tracer::{TracerError, TracerOptions, init_tracer};

/// Every instant handled by the pipeline is an absolute UTC time with nanosecond resolution.
pub type Timestamp = DateTime<Utc>;

/// Raw sample value, after decoding.
pub type Sample = f64;

/// Length of the analysis span, in seconds.
pub const SECONDS_PER_DAY: i64 = 86_400;

pub const NANOSECONDS_PER_SECOND: i64 = 1_000_000_000;

/// Builds the version string reported by `--version`.
///
/// The calling crate must depend on `git-version`.
#[macro_export]
macro_rules! version {
    () => {
        git_version::git_version!(
            args = ["--tags", "--always", "--dirty"],
            fallback = env!("CARGO_PKG_VERSION")
        )
    };
}

//! Metric names and descriptions shared by the pipeline components.
//!
//! The counters are recorded through the [metrics] facade; they are only
//! collected if the binary installs a recorder.

pub mod names {
    use const_format::concatcp;

    pub const METRIC_NAME_PREFIX: &str = "seismic_rms_";
    pub const WINDOWS_PROCESSED: &str = concatcp!(METRIC_NAME_PREFIX, "windows_processed");
    pub const WINDOWS_WITHOUT_DATA: &str = concatcp!(METRIC_NAME_PREFIX, "windows_without_data");
    pub const TRACES_REJECTED: &str = concatcp!(METRIC_NAME_PREFIX, "traces_rejected");
    pub const RESULTS_EMITTED: &str = concatcp!(METRIC_NAME_PREFIX, "results_emitted");
}

use ::metrics::{Unit, describe_counter};
use names::{RESULTS_EMITTED, TRACES_REJECTED, WINDOWS_PROCESSED, WINDOWS_WITHOUT_DATA};

/// Registers a description for every counter in [names].
pub fn describe_metrics() {
    describe_counter!(
        WINDOWS_PROCESSED,
        Unit::Count,
        "Number of time windows processed"
    );
    describe_counter!(
        WINDOWS_WITHOUT_DATA,
        Unit::Count,
        "Number of time windows in which the store had no data"
    );
    describe_counter!(
        TRACES_REJECTED,
        Unit::Count,
        "Number of traces rejected by the minimum duration policy"
    );
    describe_counter!(
        RESULTS_EMITTED,
        Unit::Count,
        "Number of window results written to the outputs"
    );
}

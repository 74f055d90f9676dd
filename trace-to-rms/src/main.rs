//! # Trace to RMS
//!
//! The Trace to RMS component performs the following functions:
//! * Reads a waveform archive holding one day of seismometer data.
//! * Divides the day containing the first record into fixed size, possibly overlapping, windows.
//! * For each window, computes the mean, RMS, extrema and demeaned extrema of every matching trace,
//!   ignoring traces with too little data.
//! * Writes the results as a CRLF delimited time series (`.rms`) and as a JSON document (`.json`),
//!   both timestamped relative to the first result.
//! * Reports the run's counters in the Prometheus text format.
//!
mod aggregator;
mod anchor;
mod output;
mod parameters;
mod processing;
mod scheduler;
mod statistics;
#[cfg(test)]
mod testing;

use clap::Parser;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use miette::{IntoDiagnostic, WrapErr};
use output::DualWriter;
use parameters::{AggregationParameters, OutputParameters, ProcessSettings};
use processing::{process, resolve_span};
use scheduler::WindowSpec;
use seismic_rms_common::{TracerOptions, init_tracer, metrics::describe_metrics};
use seismic_rms_waveform_store::{ArchiveStore, RereadingStore, WaveformStore};
use std::{
    fs::File,
    io::{BufWriter, IsTerminal},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// [clap] derived struct to handle command line parameters.
#[derive(Debug, Parser)]
#[clap(author, version = seismic_rms_common::version!(), about)]
struct Cli {
    /// Waveform archive to analyse
    input_file: PathBuf,

    /// Length of each window, in seconds
    #[clap(allow_negative_numbers = true)]
    window_size: i64,

    /// Percentage by which consecutive windows overlap
    #[clap(allow_negative_numbers = true)]
    window_overlap: i64,

    #[clap(flatten)]
    aggregation: AggregationParameters,

    #[clap(flatten)]
    output: OutputParameters,

    /// If set, the archive is read again from disk for every window instead of being held in memory
    #[clap(long)]
    reread_per_window: bool,

    /// If set, the counters of the run are written to this file in the Prometheus text format,
    /// otherwise they are logged at debug level
    #[clap(long)]
    metrics_file: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set
    #[clap(long, env, default_value = "info")]
    log_level: String,
}

fn main() -> miette::Result<()> {
    let args = Cli::parse();

    init_tracer(TracerOptions::new(&args.log_level).with_ansi(std::io::stderr().is_terminal()))
        .into_diagnostic()?;

    // Install the recorder before any metric is described or recorded.
    let metrics = PrometheusBuilder::new().install_recorder().into_diagnostic()?;
    describe_metrics();

    // Everything which can be checked without the data is checked before any output is created.
    let spec = WindowSpec::new(args.window_size, args.window_overlap).into_diagnostic()?;
    args.aggregation.validate().into_diagnostic()?;
    let paths = args.output.paths(&args.input_file).into_diagnostic()?;

    let settings = ProcessSettings {
        spec,
        pattern: &args.aggregation.source_id_pattern,
        minimum_duration: args.aggregation.minimum_duration,
    };

    if args.reread_per_window {
        run(&RereadingStore::new(&args.input_file), &settings, &paths)?;
    } else {
        let store = ArchiveStore::open(&args.input_file)
            .into_diagnostic()
            .wrap_err_with(|| format!("Cannot open {}", args.input_file.display()))?;
        run(&store, &settings, &paths)?;
    }

    report_metrics(&metrics, args.metrics_file.as_deref())
}

fn run<S: WaveformStore>(
    store: &S,
    settings: &ProcessSettings,
    paths: &parameters::OutputPaths,
) -> miette::Result<()> {
    let (span, nslc) = resolve_span(store).into_diagnostic()?;

    let writer = DualWriter::new(create(&paths.rms)?, create(&paths.json)?, nslc);
    let (summary, _) = process(store, settings, span, writer).into_diagnostic()?;

    info!(
        "Wrote {} results to {} and {}",
        summary.results_emitted,
        paths.rms.display(),
        paths.json.display()
    );
    Ok(())
}

fn report_metrics(metrics: &PrometheusHandle, path: Option<&Path>) -> miette::Result<()> {
    let rendered = metrics.render();
    match path {
        Some(path) => std::fs::write(path, rendered)
            .into_diagnostic()
            .wrap_err_with(|| format!("Cannot write metrics to {}", path.display())),
        None => {
            debug!("Metrics:\n{rendered}");
            Ok(())
        }
    }
}

fn create(path: &Path) -> miette::Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot create {}", path.display()))
}

//! Drives the windows of a run through aggregation and into the outputs.
use crate::{
    aggregator::{AggregateError, Aggregator, WindowOutcome},
    anchor::{AnchorError, AnchorState},
    output::{DualWriter, OutputError, Outputs},
    parameters::ProcessSettings,
    scheduler::{AnalysisSpan, Schedule},
};
use metrics::counter;
use seismic_rms_common::metrics::names::{
    RESULTS_EMITTED, WINDOWS_PROCESSED, WINDOWS_WITHOUT_DATA,
};
use seismic_rms_waveform_store::{Nslc, SourceIdError, StoreError, WaveformStore};
use std::io::Write;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub(crate) enum ProcessError {
    #[error("Cannot read the first record: {0}")]
    FirstRecord(#[from] StoreError),
    #[error("Cannot resolve the source of the first record: {0}")]
    SourceId(#[from] SourceIdError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Anchor(#[from] AnchorError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) windows: usize,
    pub(crate) windows_without_data: usize,
    pub(crate) channels_rejected: usize,
    pub(crate) results_emitted: usize,
}

/// Derives the analysis span and the source codes from the store's first record.
///
/// The span is the day containing the end of that record.
#[instrument(skip_all, err(level = "error"))]
pub(crate) fn resolve_span<S: WaveformStore>(
    store: &S,
) -> Result<(AnalysisSpan, Nslc), ProcessError> {
    let first = store.first_record()?;
    let nslc = first.source_id.nslc()?;
    let span = AnalysisSpan::day_containing(first.end_time);
    info!(
        "Analysing {} from {} to {}",
        first.source_id, span.start, span.end
    );
    Ok((span, nslc))
}

/// Summarises every window of `span` and writes the results.
///
/// Windows are processed strictly one after another. The outputs are closed
/// once the last window has been processed.
#[instrument(skip_all, fields(
    window_size = settings.spec.size_seconds(),
    stride = settings.spec.stride_seconds(),
    num_windows
))]
pub(crate) fn process<S, R, J>(
    store: &S,
    settings: &ProcessSettings,
    span: AnalysisSpan,
    mut writer: DualWriter<R, J>,
) -> Result<(RunSummary, Outputs<R, J>), ProcessError>
where
    S: WaveformStore,
    R: Write,
    J: Write,
{
    let schedule = Schedule::new(span, settings.spec);
    tracing::Span::current().record("num_windows", schedule.window_count());

    let aggregator = Aggregator::new(store, settings.pattern, settings.minimum_duration);
    let mut state = AnchorState::default();
    let mut summary = RunSummary::default();

    for window in schedule.windows() {
        summary.windows += 1;
        counter!(WINDOWS_PROCESSED).increment(1);

        match aggregator.aggregate(&window)? {
            WindowOutcome::NoData => {
                summary.windows_without_data += 1;
                counter!(WINDOWS_WITHOUT_DATA).increment(1);
            }
            WindowOutcome::Channels { accepted, rejected } => {
                summary.channels_rejected += rejected;
                for channel in accepted {
                    let result = state.accept(channel)?;
                    writer.write_result(&result)?;
                    counter!(RESULTS_EMITTED).increment(1);
                    debug!(
                        "Result {} for {} at +{}s",
                        state.emitted(),
                        result.source_id,
                        result.relative.num_seconds()
                    );
                }
            }
        }
    }

    summary.results_emitted = state.close()?;
    let outputs = writer.finish()?;
    match state.anchor() {
        Some(anchor) => info!("Results are relative to {anchor}"),
        None => warn!("No trace had enough data to be summarised"),
    }
    info!(
        "Processed {} windows, {} without data, {} traces rejected, {} results written",
        summary.windows,
        summary.windows_without_data,
        summary.channels_rejected,
        summary.results_emitted
    );
    Ok((summary, outputs))
}

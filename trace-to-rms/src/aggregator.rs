//! Retrieves the channels of each window from the store and summarises the ones with enough data.
use crate::{
    scheduler::Window,
    statistics::{StatisticsError, Summary},
};
use metrics::counter;
use seismic_rms_common::{Timestamp, metrics::names::TRACES_REJECTED};
use seismic_rms_waveform_store::{
    ChannelSamples, SourceId, SourceIdPattern, StoreError, WaveformStore,
};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error)]
pub(crate) enum AggregateError {
    #[error("Cannot read waveform data for window {index}: {source}")]
    Store {
        index: usize,
        #[source]
        source: StoreError,
    },
    #[error("Cannot summarise {source_id} in window {index}: {source}")]
    Statistics {
        index: usize,
        source_id: SourceId,
        #[source]
        source: StatisticsError,
    },
}

/// Statistics of one channel in one window.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChannelSummary {
    pub(crate) source_id: SourceId,
    /// Halfway between the first and last sample of the channel.
    pub(crate) midpoint: Timestamp,
    pub(crate) stats: Summary,
}

/// What the store returned for a window.
#[derive(Debug, PartialEq)]
pub(crate) enum WindowOutcome {
    NoData,
    Channels {
        accepted: Vec<ChannelSummary>,
        rejected: usize,
    },
}

pub(crate) struct Aggregator<'a, S: WaveformStore> {
    store: &'a S,
    pattern: &'a SourceIdPattern,
    /// Channels whose sample count multiplied by sample rate is below this are rejected.
    minimum_duration: f64,
}

impl<'a, S: WaveformStore> Aggregator<'a, S> {
    pub(crate) fn new(store: &'a S, pattern: &'a SourceIdPattern, minimum_duration: f64) -> Self {
        Self {
            store,
            pattern,
            minimum_duration,
        }
    }

    /// Summarises every channel of `window` which passes the minimum duration policy.
    ///
    /// A window without data is not an error, any other store failure is.
    #[instrument(skip_all, level = "debug", fields(index = window.index, start = %window.start, num_channels, num_accepted))]
    pub(crate) fn aggregate(&self, window: &Window) -> Result<WindowOutcome, AggregateError> {
        let channels = match self
            .store
            .query_channels_in_window(self.pattern, window.range())
        {
            Ok(channels) => channels,
            Err(e) if e.is_no_data() => {
                debug!("No data in window {}", window.index);
                return Ok(WindowOutcome::NoData);
            }
            Err(source) => {
                return Err(AggregateError::Store {
                    index: window.index,
                    source,
                });
            }
        };
        tracing::Span::current().record("num_channels", channels.len());

        let mut accepted = Vec::with_capacity(channels.len());
        let mut rejected = 0;
        for channel in channels {
            if channel.samples.is_empty() {
                info!(
                    "Rejecting {} in window {}: no samples",
                    channel.source_id, window.index
                );
                counter!(TRACES_REJECTED).increment(1);
                rejected += 1;
                continue;
            }
            if self.is_too_short(&channel) {
                info!(
                    "Rejecting {} in window {}: {} samples at {} Hz is below {}",
                    channel.source_id,
                    window.index,
                    channel.sample_count(),
                    channel.sample_rate,
                    self.minimum_duration
                );
                counter!(TRACES_REJECTED).increment(1);
                rejected += 1;
                continue;
            }
            accepted.push(summarise(window, channel)?);
        }
        tracing::Span::current().record("num_accepted", accepted.len());
        Ok(WindowOutcome::Channels { accepted, rejected })
    }

    /// The sample count is multiplied, not divided, by the sample rate.
    fn is_too_short(&self, channel: &ChannelSamples) -> bool {
        (channel.sample_count() as f64) * channel.sample_rate < self.minimum_duration
    }
}

/// Consumes the channel's samples.
#[instrument(skip_all, level = "trace", fields(source_id = %channel.source_id, num_samples = channel.sample_count()))]
fn summarise(window: &Window, channel: ChannelSamples) -> Result<ChannelSummary, AggregateError> {
    let stats = Summary::compute(&channel.samples).map_err(|source| {
        AggregateError::Statistics {
            index: window.index,
            source_id: channel.source_id.clone(),
            source,
        }
    })?;
    Ok(ChannelSummary {
        midpoint: channel.earliest + (channel.latest - channel.earliest) / 2,
        source_id: channel.source_id,
        stats,
    })
}

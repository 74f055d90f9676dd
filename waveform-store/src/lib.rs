//! Waveform storage consumed by the windowed statistics pipeline.
//!
//! Records are held in a [WaveformArchive], and are retrieved per time window
//! through the [WaveformStore] trait, grouped into one [ChannelSamples] per source.
mod archive;
mod source_id;
mod store;

pub use archive::{Record, WaveformArchive};
pub use source_id::{Nslc, SourceId, SourceIdError, SourceIdPattern};
pub use store::{ArchiveStore, RereadingStore};

use seismic_rms_common::{Sample, Timestamp};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot read waveform archive {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed waveform archive: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Waveform archive contains no records")]
    EmptyArchive,
    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: &'static str },
    #[error("No data between {start} and {end}")]
    NoDataInRange { start: Timestamp, end: Timestamp },
}

impl StoreError {
    /// Returns true if the error only indicates that a query matched nothing.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoDataInRange { .. })
    }
}

/// Half open interval `[start, end)` used to select records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }
}

/// Identity and time extent of a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHeader {
    pub source_id: SourceId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

/// All samples of one source selected by a query, concatenated in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSamples {
    pub source_id: SourceId,
    pub samples: Vec<Sample>,
    /// Sample rate of the first record.
    pub sample_rate: f64,
    /// Start time of the earliest record.
    pub earliest: Timestamp,
    /// End time of the latest record.
    pub latest: Timestamp,
}

impl ChannelSamples {
    /// Concatenates records already sorted by time, returns [None] if there are none.
    fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Option<Self> {
        let mut records = records.into_iter();
        let first = records.next()?;
        let mut channel = Self {
            source_id: first.source_id.clone(),
            samples: first.samples.clone(),
            sample_rate: first.sample_rate,
            earliest: first.start_time,
            latest: first.end_time(),
        };
        for record in records {
            channel.earliest = channel.earliest.min(record.start_time);
            channel.latest = channel.latest.max(record.end_time());
            channel.samples.extend_from_slice(&record.samples);
        }
        Some(channel)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

/// Source of waveform data, queried once per time window.
pub trait WaveformStore {
    /// Header of the first record in the store.
    fn first_record(&self) -> Result<RecordHeader, StoreError>;

    /// Retrieves the samples of every source matching `pattern` with data in `range`.
    ///
    /// Fails with [StoreError::NoDataInRange] if nothing matches.
    fn query_channels_in_window(
        &self,
        pattern: &SourceIdPattern,
        range: TimeRange,
    ) -> Result<Vec<ChannelSamples>, StoreError>;
}

//! A waveform archive is a JSON document holding decoded waveform records.
//!
//! ```json
//! {
//!     "records": [
//!         {
//!             "source-id": "FDSN:TW_YULB__H_H_E",
//!             "start-time": "2020-02-04T00:00:00Z",
//!             "sample-rate": 100.0,
//!             "samples": [12.0, 15.0, 9.0]
//!         }
//!     ]
//! }
//! ```
use crate::{ChannelSamples, RecordHeader, SourceId, SourceIdPattern, StoreError, TimeRange};
use chrono::TimeDelta;
use itertools::Itertools;
use seismic_rms_common::{NANOSECONDS_PER_SECOND, Sample, Timestamp};
use serde::Deserialize;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::{debug, instrument};

/// One contiguous run of samples from a single source.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Record {
    pub source_id: SourceId,
    pub start_time: Timestamp,
    /// Samples per second.
    pub sample_rate: f64,
    pub samples: Vec<Sample>,
}

impl Record {
    /// Time of the last sample.
    pub fn end_time(&self) -> Timestamp {
        if self.samples.len() <= 1 || self.sample_rate <= 0.0 {
            return self.start_time;
        }
        let span_ns = (self.samples.len() - 1) as f64 / self.sample_rate
            * NANOSECONDS_PER_SECOND as f64;
        self.start_time + TimeDelta::nanoseconds(span_ns.round() as i64)
    }

    /// Whether any part of the record lies within `range`.
    pub fn overlaps(&self, range: &TimeRange) -> bool {
        self.start_time < range.end && self.end_time() >= range.start
    }

    pub fn header(&self) -> RecordHeader {
        RecordHeader {
            source_id: self.source_id.clone(),
            start_time: self.start_time,
            end_time: self.end_time(),
        }
    }

    fn validate(&self, index: usize) -> Result<(), StoreError> {
        if !self.sample_rate.is_finite() || self.sample_rate < 0.0 {
            return Err(StoreError::InvalidRecord {
                index,
                reason: "sample rate must be a non-negative number",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaveformArchive {
    records: Vec<Record>,
}

impl WaveformArchive {
    /// Builds an archive from records, in file order.
    pub fn from_records(records: Vec<Record>) -> Result<Self, StoreError> {
        let archive = Self { records };
        archive.validate()?;
        Ok(archive)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StoreError> {
        let archive: Self = serde_json::from_reader(reader)?;
        archive.validate()?;
        Ok(archive)
    }

    #[instrument(skip_all, level = "debug", fields(path = %path.display(), num_records))]
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::Io {
            path: path.to_owned(),
            source,
        })?;
        let archive = Self::from_reader(BufReader::new(file))?;
        tracing::Span::current().record("num_records", archive.records.len());
        Ok(archive)
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.records.is_empty() {
            return Err(StoreError::EmptyArchive);
        }
        self.records
            .iter()
            .enumerate()
            .try_for_each(|(index, record)| record.validate(index))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The first record in file order.
    pub fn first_record(&self) -> Result<RecordHeader, StoreError> {
        self.records
            .first()
            .map(Record::header)
            .ok_or(StoreError::EmptyArchive)
    }

    /// Selects every record of a matching source which overlaps `range`.
    ///
    /// Records are taken whole, samples outside `range` are not trimmed.
    /// The records of each source are concatenated in time order, and the
    /// resulting channels are ordered by source id.
    #[instrument(skip_all, level = "trace", fields(start = %range.start, end = %range.end))]
    pub fn select(
        &self,
        pattern: &SourceIdPattern,
        range: TimeRange,
    ) -> Result<Vec<ChannelSamples>, StoreError> {
        let chunks = self
            .records
            .iter()
            .filter(|record| pattern.matches(&record.source_id) && record.overlaps(&range))
            .sorted_by(|a, b| {
                a.source_id
                    .cmp(&b.source_id)
                    .then(a.start_time.cmp(&b.start_time))
            })
            .chunk_by(|record| record.source_id.clone());

        let channels = chunks
            .into_iter()
            .filter_map(|(_, records)| ChannelSamples::from_records(records))
            .collect::<Vec<_>>();

        if channels.is_empty() {
            debug!("No records between {} and {}", range.start, range.end);
            return Err(StoreError::NoDataInRange {
                start: range.start,
                end: range.end,
            });
        }
        Ok(channels)
    }
}

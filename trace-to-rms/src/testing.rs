//! Fixtures shared by the unit tests of this crate.
use chrono::{TimeDelta, TimeZone, Utc};
use seismic_rms_common::{Sample, Timestamp};
use seismic_rms_waveform_store::{
    ArchiveStore, ChannelSamples, Record, RecordHeader, SourceId, SourceIdPattern, StoreError,
    TimeRange, WaveformArchive, WaveformStore,
};

pub(crate) const EAST: &str = "FDSN:TW_YULB__H_H_E";
pub(crate) const NORTH: &str = "FDSN:TW_YULB__H_H_N";

/// Time on the day used by the fixtures.
pub(crate) fn time(hour: u32, min: u32, sec: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2020, 2, 4, hour, min, sec).unwrap()
}

/// A record of `count` samples at `rate` Hz, ramping up from `offset`.
pub(crate) fn ramp(id: &str, start: Timestamp, rate: f64, count: usize, offset: f64) -> Record {
    Record {
        source_id: SourceId::new(id),
        start_time: start,
        sample_rate: rate,
        samples: (0..count).map(|i| offset + i as Sample).collect(),
    }
}

pub(crate) fn store(records: Vec<Record>) -> ArchiveStore {
    ArchiveStore::new(WaveformArchive::from_records(records).unwrap())
}

/// Fails every query, as a corrupt archive would.
pub(crate) struct BrokenStore {
    pub(crate) first: RecordHeader,
}

impl BrokenStore {
    pub(crate) fn new() -> Self {
        Self {
            first: RecordHeader {
                source_id: SourceId::new(EAST),
                start_time: time(0, 0, 0),
                end_time: time(0, 0, 0) + TimeDelta::seconds(10),
            },
        }
    }
}

impl WaveformStore for BrokenStore {
    fn first_record(&self) -> Result<RecordHeader, StoreError> {
        Ok(self.first.clone())
    }

    fn query_channels_in_window(
        &self,
        _: &SourceIdPattern,
        _: TimeRange,
    ) -> Result<Vec<ChannelSamples>, StoreError> {
        Err(StoreError::InvalidRecord {
            index: 0,
            reason: "corrupt",
        })
    }
}

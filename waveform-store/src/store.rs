//! [WaveformStore] implementations backed by a [WaveformArchive].
use crate::{
    ChannelSamples, RecordHeader, SourceIdPattern, StoreError, TimeRange, WaveformArchive,
    WaveformStore,
};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Loads the archive once and answers every query from memory.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    archive: WaveformArchive,
}

impl ArchiveStore {
    pub fn new(archive: WaveformArchive) -> Self {
        Self { archive }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(WaveformArchive::from_path(path)?))
    }
}

impl WaveformStore for ArchiveStore {
    fn first_record(&self) -> Result<RecordHeader, StoreError> {
        self.archive.first_record()
    }

    fn query_channels_in_window(
        &self,
        pattern: &SourceIdPattern,
        range: TimeRange,
    ) -> Result<Vec<ChannelSamples>, StoreError> {
        self.archive.select(pattern, range)
    }
}

/// Reads and parses the archive file again for every query.
///
/// Memory use is bounded by a single copy of the archive at any time,
/// at the cost of reparsing the file once per window.
#[derive(Debug, Clone)]
pub struct RereadingStore {
    path: PathBuf,
}

impl RereadingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WaveformStore for RereadingStore {
    fn first_record(&self) -> Result<RecordHeader, StoreError> {
        WaveformArchive::from_path(&self.path)?.first_record()
    }

    #[instrument(skip_all, level = "trace", fields(path = %self.path.display()))]
    fn query_channels_in_window(
        &self,
        pattern: &SourceIdPattern,
        range: TimeRange,
    ) -> Result<Vec<ChannelSamples>, StoreError> {
        WaveformArchive::from_path(&self.path)?.select(pattern, range)
    }
}

//! Tracks the anchor timestamp and the number of results emitted during a run.
//!
//! The anchor is the midpoint of the first accepted channel; every result is
//! timestamped relative to it, so the first row is always at zero. The state
//! advances only on accepted channels, so rejected ones can never become the
//! anchor or disturb the punctuation of the JSON array.
use crate::{aggregator::ChannelSummary, statistics::Summary};
use chrono::TimeDelta;
use seismic_rms_common::Timestamp;
use seismic_rms_waveform_store::SourceId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum AnchorError {
    #[error("Cannot accept a result after the outputs were closed")]
    Closed,
}

/// A summary placed on the run's time axis, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WindowResult {
    pub(crate) source_id: SourceId,
    pub(crate) midpoint: Timestamp,
    /// `midpoint - anchor`
    pub(crate) relative: TimeDelta,
    pub(crate) stats: Summary,
    /// Set only for the result which fixed the anchor.
    pub(crate) is_first: bool,
}

impl WindowResult {
    /// Every JSON element but the first is preceded by a comma.
    pub(crate) fn needs_separator(&self) -> bool {
        !self.is_first
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) enum AnchorState {
    /// No result accepted yet.
    #[default]
    Uninitialized,
    /// At least one result accepted.
    Anchored { anchor: Timestamp, emitted: usize },
    /// The outputs have been closed.
    Closed {
        anchor: Option<Timestamp>,
        emitted: usize,
    },
}

impl AnchorState {
    pub(crate) fn accept(&mut self, summary: ChannelSummary) -> Result<WindowResult, AnchorError> {
        let (anchor, emitted) = match *self {
            Self::Uninitialized => (summary.midpoint, 0),
            Self::Anchored { anchor, emitted } => (anchor, emitted),
            Self::Closed { .. } => return Err(AnchorError::Closed),
        };
        *self = Self::Anchored {
            anchor,
            emitted: emitted + 1,
        };
        Ok(WindowResult {
            relative: summary.midpoint - anchor,
            is_first: emitted == 0,
            source_id: summary.source_id,
            midpoint: summary.midpoint,
            stats: summary.stats,
        })
    }

    /// Moves to the closed state, returning the number of results emitted.
    pub(crate) fn close(&mut self) -> Result<usize, AnchorError> {
        let (anchor, emitted) = match *self {
            Self::Uninitialized => (None, 0),
            Self::Anchored { anchor, emitted } => (Some(anchor), emitted),
            Self::Closed { .. } => return Err(AnchorError::Closed),
        };
        *self = Self::Closed { anchor, emitted };
        Ok(emitted)
    }

    pub(crate) fn anchor(&self) -> Option<Timestamp> {
        match *self {
            Self::Uninitialized => None,
            Self::Anchored { anchor, .. } => Some(anchor),
            Self::Closed { anchor, .. } => anchor,
        }
    }

    pub(crate) fn emitted(&self) -> usize {
        match *self {
            Self::Uninitialized => 0,
            Self::Anchored { emitted, .. } | Self::Closed { emitted, .. } => emitted,
        }
    }
}

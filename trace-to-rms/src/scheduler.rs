//! Divides the analysis span into fixed size, possibly overlapping, windows.
use chrono::{NaiveTime, TimeDelta};
use seismic_rms_common::{SECONDS_PER_DAY, Timestamp};
use seismic_rms_waveform_store::TimeRange;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum InvalidWindowSpec {
    #[error("Window size must be greater than zero seconds, got {0}")]
    NonPositiveSize(i64),
    #[error("Window size of {0} seconds is too large")]
    SizeTooLarge(i64),
    #[error("Window overlap must be less than 100 percent, got {0}")]
    OverlapTooLarge(i64),
    #[error("Window overlap must not be negative, got {0}")]
    NegativeOverlap(i64),
}

/// Size of each window and the percentage by which consecutive windows overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WindowSpec {
    size_seconds: i64,
    overlap_percent: i64,
}

impl WindowSpec {
    pub(crate) fn new(size_seconds: i64, overlap_percent: i64) -> Result<Self, InvalidWindowSpec> {
        if size_seconds <= 0 {
            return Err(InvalidWindowSpec::NonPositiveSize(size_seconds));
        }
        if TimeDelta::try_seconds(size_seconds).is_none() {
            return Err(InvalidWindowSpec::SizeTooLarge(size_seconds));
        }
        if overlap_percent >= 100 {
            return Err(InvalidWindowSpec::OverlapTooLarge(overlap_percent));
        }
        if overlap_percent < 0 {
            return Err(InvalidWindowSpec::NegativeOverlap(overlap_percent));
        }
        Ok(Self {
            size_seconds,
            overlap_percent,
        })
    }

    /// Seconds between the starts of consecutive windows.
    ///
    /// As `size * overlap / 100` is truncated and strictly less than `size`, this is at least one.
    pub(crate) fn stride_seconds(&self) -> i64 {
        let overlap = i128::from(self.size_seconds) * i128::from(self.overlap_percent) / 100;
        self.size_seconds - overlap as i64
    }

    pub(crate) fn size_seconds(&self) -> i64 {
        self.size_seconds
    }
}

/// The calendar day which is divided into windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AnalysisSpan {
    pub(crate) start: Timestamp,
    pub(crate) end: Timestamp,
}

impl AnalysisSpan {
    /// The day, from midnight UTC, which contains `time`.
    pub(crate) fn day_containing(time: Timestamp) -> Self {
        let start = time.date_naive().and_time(NaiveTime::MIN).and_utc();
        Self {
            start,
            end: start + TimeDelta::seconds(SECONDS_PER_DAY),
        }
    }

    pub(crate) fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Window {
    pub(crate) index: usize,
    pub(crate) start: Timestamp,
    pub(crate) end: Timestamp,
}

impl Window {
    pub(crate) fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

/// The windows covering an [AnalysisSpan].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Schedule {
    span: AnalysisSpan,
    spec: WindowSpec,
}

impl Schedule {
    pub(crate) fn new(span: AnalysisSpan, spec: WindowSpec) -> Self {
        Self { span, spec }
    }

    /// Number of windows, counted against the full span whatever the extent of the data.
    pub(crate) fn window_count(&self) -> usize {
        usize::try_from(self.span.seconds() / self.spec.stride_seconds()).unwrap_or_default()
    }

    /// Returns a fresh iterator over the windows, starting from the first.
    pub(crate) fn windows(&self) -> Windows {
        Windows {
            span_start: self.span.start,
            size: TimeDelta::seconds(self.spec.size_seconds()),
            stride_seconds: self.spec.stride_seconds(),
            count: self.window_count(),
            index: 0,
        }
    }
}

/// Lazily generates the windows of a [Schedule].
#[derive(Debug, Clone)]
pub(crate) struct Windows {
    span_start: Timestamp,
    size: TimeDelta,
    stride_seconds: i64,
    count: usize,
    index: usize,
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.index >= self.count {
            return None;
        }
        let offset = self
            .stride_seconds
            .checked_mul(i64::try_from(self.index).ok()?)
            .and_then(TimeDelta::try_seconds)?;
        let start = self.span_start.checked_add_signed(offset)?;
        let end = start.checked_add_signed(self.size)?;
        let window = Window {
            index: self.index,
            start,
            end,
        };
        self.index += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day() -> AnalysisSpan {
        AnalysisSpan::day_containing(Utc.with_ymd_and_hms(2020, 2, 4, 13, 37, 0).unwrap())
    }

    #[test]
    fn span_is_aligned_to_midnight() {
        let time = Utc.with_ymd_and_hms(2020, 2, 4, 23, 59, 59).unwrap()
            + TimeDelta::milliseconds(500);
        let span = AnalysisSpan::day_containing(time);
        assert_eq!(span.start, Utc.with_ymd_and_hms(2020, 2, 4, 0, 0, 0).unwrap());
        assert_eq!(span.end, Utc.with_ymd_and_hms(2020, 2, 5, 0, 0, 0).unwrap());
        assert_eq!(span.seconds(), SECONDS_PER_DAY);
    }

    #[test]
    fn invalid_specs() {
        assert_eq!(
            WindowSpec::new(0, 0),
            Err(InvalidWindowSpec::NonPositiveSize(0))
        );
        assert_eq!(
            WindowSpec::new(-10, 0),
            Err(InvalidWindowSpec::NonPositiveSize(-10))
        );
        assert_eq!(
            WindowSpec::new(10, 100),
            Err(InvalidWindowSpec::OverlapTooLarge(100))
        );
        assert_eq!(
            WindowSpec::new(10, -1),
            Err(InvalidWindowSpec::NegativeOverlap(-1))
        );
        assert_eq!(
            WindowSpec::new(i64::MAX, 0),
            Err(InvalidWindowSpec::SizeTooLarge(i64::MAX))
        );
    }

    #[test]
    fn stride() {
        assert_eq!(WindowSpec::new(10, 0).unwrap().stride_seconds(), 10);
        assert_eq!(WindowSpec::new(10, 50).unwrap().stride_seconds(), 5);
        assert_eq!(WindowSpec::new(10, 33).unwrap().stride_seconds(), 7);
        assert_eq!(WindowSpec::new(1, 50).unwrap().stride_seconds(), 1);
        assert_eq!(WindowSpec::new(1, 99).unwrap().stride_seconds(), 1);
        assert_eq!(WindowSpec::new(600, 25).unwrap().stride_seconds(), 450);
    }

    #[test]
    fn stride_is_always_positive() {
        for size in 1..=300 {
            for overlap in 0..100 {
                let spec = WindowSpec::new(size, overlap).unwrap();
                let stride = spec.stride_seconds();
                assert!(stride > 0, "size {size}, overlap {overlap}");
                assert!(stride <= size);
                assert_eq!(
                    Schedule::new(day(), spec).window_count(),
                    (SECONDS_PER_DAY / stride) as usize
                );
            }
        }
    }

    #[test]
    fn window_count() {
        let schedule = Schedule::new(day(), WindowSpec::new(60, 50).unwrap());
        assert_eq!(schedule.window_count(), 2880);
        assert_eq!(schedule.windows().len(), 2880);
        assert_eq!(schedule.windows().count(), 2880);

        let too_large = Schedule::new(day(), WindowSpec::new(2 * SECONDS_PER_DAY, 0).unwrap());
        assert_eq!(too_large.windows().count(), 0);
    }

    #[test]
    fn overlapping_windows() {
        let span = day();
        let schedule = Schedule::new(span, WindowSpec::new(10, 50).unwrap());
        let windows = schedule.windows().take(3).collect::<Vec<_>>();

        assert_eq!(windows[0].index, 0);
        assert_eq!(windows[0].start, span.start);
        assert_eq!(windows[0].end, span.start + TimeDelta::seconds(10));
        assert_eq!(windows[1].start, span.start + TimeDelta::seconds(5));
        assert_eq!(windows[1].end, span.start + TimeDelta::seconds(15));
        assert_eq!(windows[2].index, 2);
        assert_eq!(windows[2].start, span.start + TimeDelta::seconds(10));
    }

    #[test]
    fn last_window() {
        let span = day();
        let schedule = Schedule::new(span, WindowSpec::new(3600, 0).unwrap());
        let last = schedule.windows().last().unwrap();
        assert_eq!(last.index, 23);
        assert_eq!(last.start, span.start + TimeDelta::hours(23));
        assert_eq!(last.end, span.end);
    }

    #[test]
    fn restartable() {
        let schedule = Schedule::new(day(), WindowSpec::new(120, 10).unwrap());
        let mut partial = schedule.windows();
        partial.nth(100);
        assert_eq!(partial.len(), schedule.window_count() - 101);

        let first = schedule.windows().collect::<Vec<_>>();
        let second = schedule.windows().collect::<Vec<_>>();
        assert_eq!(first, second);
    }
}

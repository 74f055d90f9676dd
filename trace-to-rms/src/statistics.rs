//! Descriptive statistics of the samples of one channel in one window.
use seismic_rms_common::Sample;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum StatisticsError {
    #[error("Cannot compute statistics of an empty sample buffer")]
    EmptyInput,
}

/// Summary of a sample buffer.
#[derive(Default, Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    /// The arithmetic mean.
    pub(crate) mean: f64,
    /// The population standard deviation, i.e. the divisor is the number of samples.
    pub(crate) sd: f64,
    pub(crate) min: f64,
    pub(crate) max: f64,
    /// `min - mean`
    pub(crate) min_demean: f64,
    /// `max - mean`
    pub(crate) max_demean: f64,
}

impl Summary {
    /// Computes the summary of `samples` in two passes, without allocating.
    pub(crate) fn compute(samples: &[Sample]) -> Result<Self, StatisticsError> {
        let (&first, rest) = samples.split_first().ok_or(StatisticsError::EmptyInput)?;
        let n = samples.len() as f64;

        let (sum, min, max) = rest
            .iter()
            .fold((first, first, first), |(sum, min, max), &x| {
                (sum + x, min.min(x), max.max(x))
            });
        let mean = sum / n;
        let sum_of_squares = samples.iter().map(|&x| (x - mean).powi(2)).sum::<f64>();

        Ok(Self {
            mean,
            sd: (sum_of_squares / n).sqrt(),
            min,
            max,
            min_demean: min - mean,
            max_demean: max - mean,
        })
    }
}

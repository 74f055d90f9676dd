//! Defines the command line options, and the settings derived from them.
use crate::scheduler::WindowSpec;
use clap::Parser;
use seismic_rms_waveform_store::SourceIdPattern;
use std::path::{Path, PathBuf};
use thiserror::Error;

const RMS_EXTENSION: &str = "rms";
const JSON_EXTENSION: &str = "json";

#[derive(Debug, Error, PartialEq)]
pub(crate) enum ParameterError {
    #[error("Input path {0} does not name a file")]
    NoFileName(PathBuf),
    #[error("Minimum duration must be a finite number, got {0}")]
    MinimumDuration(f64),
}

/// Settings controlling which traces are summarised.
#[derive(Debug, Clone, Parser)]
pub(crate) struct AggregationParameters {
    /// Only sources whose id matches this glob pattern are summarised.
    #[clap(long, default_value = "*")]
    pub(crate) source_id_pattern: SourceIdPattern,

    /// A trace is ignored if its number of samples multiplied by its sample rate is less than this.
    #[clap(long, default_value = "20")]
    pub(crate) minimum_duration: f64,
}

impl AggregationParameters {
    pub(crate) fn validate(&self) -> Result<(), ParameterError> {
        if self.minimum_duration.is_finite() {
            Ok(())
        } else {
            Err(ParameterError::MinimumDuration(self.minimum_duration))
        }
    }
}

/// Settings controlling where the outputs are written.
#[derive(Debug, Clone, Parser)]
pub(crate) struct OutputParameters {
    /// Directory in which the `.rms` and `.json` files are created.
    #[clap(long, env, default_value = ".")]
    pub(crate) output_dir: PathBuf,
}

/// Locations of the two output files.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OutputPaths {
    pub(crate) rms: PathBuf,
    pub(crate) json: PathBuf,
}

impl OutputParameters {
    /// The outputs are named after the input's file name, with `.rms` or `.json` appended.
    pub(crate) fn paths(&self, input: &Path) -> Result<OutputPaths, ParameterError> {
        let name = input
            .file_name()
            .ok_or_else(|| ParameterError::NoFileName(input.to_owned()))?
            .to_string_lossy();
        Ok(OutputPaths {
            rms: self.output_dir.join(format!("{name}.{RMS_EXTENSION}")),
            json: self.output_dir.join(format!("{name}.{JSON_EXTENSION}")),
        })
    }
}

/// Everything the processing loop needs to know about the run.
#[derive(Debug)]
pub(crate) struct ProcessSettings<'a> {
    pub(crate) spec: WindowSpec,
    pub(crate) pattern: &'a SourceIdPattern,
    pub(crate) minimum_duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_keep_the_input_extension() {
        let output = OutputParameters {
            output_dir: PathBuf::from("out"),
        };
        assert_eq!(
            output
                .paths(Path::new("/data/YULB.TW..HHE.2020.035.json"))
                .unwrap(),
            OutputPaths {
                rms: PathBuf::from("out/YULB.TW..HHE.2020.035.json.rms"),
                json: PathBuf::from("out/YULB.TW..HHE.2020.035.json.json"),
            }
        );
    }

    #[test]
    fn input_without_file_name() {
        let output = OutputParameters {
            output_dir: PathBuf::from("."),
        };
        assert_eq!(
            output.paths(Path::new("/")),
            Err(ParameterError::NoFileName(PathBuf::from("/")))
        );
    }

    #[test]
    fn minimum_duration_must_be_finite() {
        let parameters = AggregationParameters {
            source_id_pattern: SourceIdPattern::default(),
            minimum_duration: f64::NAN,
        };
        assert!(parameters.validate().is_err());

        let parameters = AggregationParameters {
            minimum_duration: 20.0,
            ..parameters
        };
        assert!(parameters.validate().is_ok());
    }
}

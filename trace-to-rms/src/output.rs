//! Writes window results to the time series (`.rms`) and JSON outputs.
//!
//! The time series starts with a header naming the anchor time and the source,
//! followed by one CRLF terminated row per result:
//! ```text
//! "2020,035,00:00:29","YULB","TW","HHE",""
//! 0,12.00,3.45,1.00,20.00,-11.00,8.00
//! ```
//! The JSON output is a single object whose `data` array holds one element per result.
use crate::anchor::WindowResult;
use seismic_rms_common::Timestamp;
use seismic_rms_waveform_store::Nslc;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use std::io::Write;
use thiserror::Error;

const RMS_HEADER_TIME_FORMAT: &str = "%Y,%j,%H:%M:%S";
const JSON_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
pub(crate) enum OutputError {
    #[error("Cannot write time series output: {0}")]
    Rms(#[source] std::io::Error),
    #[error("Cannot write JSON output: {0}")]
    Json(#[source] std::io::Error),
    #[error("Cannot serialise JSON output: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// A number written with exactly two decimal places.
struct Fixed2(f64);

impl Serialize for Fixed2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawValue::from_string(format!("{:.2}", self.0))
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonElement {
    timestamp: String,
    mean: Fixed2,
    rms: Fixed2,
    min: Fixed2,
    max: Fixed2,
    min_demean: Fixed2,
    max_demean: Fixed2,
}

impl From<&WindowResult> for JsonElement {
    fn from(result: &WindowResult) -> Self {
        Self {
            timestamp: result.midpoint.format(JSON_TIME_FORMAT).to_string(),
            mean: Fixed2(result.stats.mean),
            rms: Fixed2(result.stats.sd),
            min: Fixed2(result.stats.min),
            max: Fixed2(result.stats.max),
            min_demean: Fixed2(result.stats.min_demean),
            max_demean: Fixed2(result.stats.max_demean),
        }
    }
}

/// The underlying writers, returned once the outputs are complete.
pub(crate) struct Outputs<R, J> {
    pub(crate) rms: R,
    pub(crate) json: J,
}

pub(crate) struct DualWriter<R: Write, J: Write> {
    rms: R,
    json: J,
    nslc: Nslc,
    json_preamble_written: bool,
}

impl<R: Write, J: Write> DualWriter<R, J> {
    pub(crate) fn new(rms: R, json: J, nslc: Nslc) -> Self {
        Self {
            rms,
            json,
            nslc,
            json_preamble_written: false,
        }
    }

    /// Writes the result to both outputs, preceded by the headers if it is the first.
    pub(crate) fn write_result(&mut self, result: &WindowResult) -> Result<(), OutputError> {
        if result.is_first {
            self.write_rms_header(result.midpoint)?;
            self.write_json_preamble()?;
        }

        let stats = &result.stats;
        write!(
            self.rms,
            "{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}\r\n",
            result.relative.num_seconds(),
            stats.mean,
            stats.sd,
            stats.min,
            stats.max,
            stats.min_demean,
            stats.max_demean
        )
        .map_err(OutputError::Rms)?;

        let element = serde_json::to_string(&JsonElement::from(result))?;
        if result.needs_separator() {
            self.json.write_all(b",").map_err(OutputError::Json)?;
        }
        self.json
            .write_all(element.as_bytes())
            .map_err(OutputError::Json)
    }

    /// Closes the JSON document and flushes both outputs.
    ///
    /// If no result was written the JSON document still carries the source
    /// and an empty `data` array, while the time series stays empty.
    pub(crate) fn finish(mut self) -> Result<Outputs<R, J>, OutputError> {
        if !self.json_preamble_written {
            self.write_json_preamble()?;
        }
        self.json.write_all(b"]}").map_err(OutputError::Json)?;
        self.json.flush().map_err(OutputError::Json)?;
        self.rms.flush().map_err(OutputError::Rms)?;
        Ok(Outputs {
            rms: self.rms,
            json: self.json,
        })
    }

    fn write_rms_header(&mut self, anchor: Timestamp) -> Result<(), OutputError> {
        write!(
            self.rms,
            "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"\r\n",
            anchor.format(RMS_HEADER_TIME_FORMAT),
            self.nslc.station,
            self.nslc.network,
            self.nslc.channel,
            self.nslc.location
        )
        .map_err(OutputError::Rms)
    }

    fn write_json_preamble(&mut self) -> Result<(), OutputError> {
        if self.json_preamble_written {
            return Ok(());
        }
        write!(
            self.json,
            "{{\"network\":{},\"station\":{},\"location\":{},\"channel\":{},\"data\":[",
            serde_json::to_string(&self.nslc.network)?,
            serde_json::to_string(&self.nslc.station)?,
            serde_json::to_string(&self.nslc.location)?,
            serde_json::to_string(&self.nslc.channel)?
        )
        .map_err(OutputError::Json)?;
        self.json_preamble_written = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        statistics::Summary,
        testing::{EAST, time},
    };
    use chrono::TimeDelta;
    use seismic_rms_waveform_store::SourceId;
    use serde_json::Value;

    fn nslc() -> Nslc {
        SourceId::new(EAST).nslc().unwrap()
    }

    fn result(midpoint: Timestamp, relative: i64, is_first: bool, samples: &[f64]) -> WindowResult {
        WindowResult {
            source_id: SourceId::new(EAST),
            midpoint,
            relative: TimeDelta::seconds(relative),
            stats: Summary::compute(samples).unwrap(),
            is_first,
        }
    }

    fn finish(writer: DualWriter<Vec<u8>, Vec<u8>>) -> (String, String) {
        let outputs = writer.finish().unwrap();
        (
            String::from_utf8(outputs.rms).unwrap(),
            String::from_utf8(outputs.json).unwrap(),
        )
    }

    #[test]
    fn no_results() {
        let (rms, json) = finish(DualWriter::new(Vec::new(), Vec::new(), nslc()));
        assert_eq!(rms, "");
        assert_eq!(
            json,
            r#"{"network":"TW","station":"YULB","location":"","channel":"HHE","data":[]}"#
        );
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["data"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn one_result() {
        let mut writer = DualWriter::new(Vec::new(), Vec::new(), nslc());
        writer
            .write_result(&result(time(0, 0, 29), 0, true, &[1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        let (rms, json) = finish(writer);

        assert_eq!(
            rms,
            "\"2020,035,00:00:29\",\"YULB\",\"TW\",\"HHE\",\"\"\r\n0,2.50,1.12,1.00,4.00,-1.50,1.50\r\n"
        );
        assert_eq!(
            json,
            concat!(
                r#"{"network":"TW","station":"YULB","location":"","channel":"HHE","data":["#,
                r#"{"timestamp":"2020-02-04T00:00:29","mean":2.50,"rms":1.12,"min":1.00,"max":4.00,"minDemean":-1.50,"maxDemean":1.50}"#,
                r#"]}"#
            )
        );
    }

    #[test]
    fn several_results() {
        let mut writer = DualWriter::new(Vec::new(), Vec::new(), nslc());
        writer
            .write_result(&result(time(0, 0, 29), 0, true, &[1.0]))
            .unwrap();
        writer
            .write_result(&result(time(0, 1, 29), 60, false, &[2.0]))
            .unwrap();
        writer
            .write_result(&result(time(0, 3, 29), 180, false, &[3.0]))
            .unwrap();
        let (rms, json) = finish(writer);

        let lines = rms.split_terminator("\r\n").collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("\"2020,035,00:00:29\""));
        assert_eq!(lines[1], "0,1.00,0.00,1.00,1.00,0.00,0.00");
        assert_eq!(lines[2], "60,2.00,0.00,2.00,2.00,0.00,0.00");
        assert_eq!(lines[3], "180,3.00,0.00,3.00,3.00,0.00,0.00");
        assert!(!rms.replace("\r\n", "").contains('\n'));

        let value: Value = serde_json::from_str(&json).unwrap();
        let data = value["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[1]["timestamp"], "2020-02-04T00:01:29");
        assert_eq!(data[2]["mean"], 3.0);
        assert_eq!(value["station"], "YULB");
    }

    #[test]
    fn relative_seconds_truncate() {
        let mut writer = DualWriter::new(Vec::new(), Vec::new(), nslc());
        let mut first = result(time(0, 0, 0), 0, true, &[1.0]);
        first.relative = TimeDelta::milliseconds(999);
        writer.write_result(&first).unwrap();
        let (rms, _) = finish(writer);
        assert!(rms.lines().nth(1).unwrap().starts_with("0,"));
    }

    #[test]
    fn codes_are_escaped_in_json() {
        let nslc = Nslc {
            network: "X\"Y".into(),
            station: "S\\T".into(),
            location: "".into(),
            channel: "BHZ".into(),
        };
        let (_, json) = finish(DualWriter::new(Vec::new(), Vec::new(), nslc));
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["network"], "X\"Y");
        assert_eq!(value["station"], "S\\T");
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut writer = DualWriter::new(Vec::new(), Vec::new(), nslc());
        let mut bad = result(time(0, 0, 0), 0, true, &[1.0]);
        bad.stats.mean = f64::INFINITY;
        assert!(matches!(
            writer.write_result(&bad),
            Err(OutputError::Serialise(_))
        ));
    }
}

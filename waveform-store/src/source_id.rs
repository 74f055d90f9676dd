//! Source identifiers, and their decomposition into network, station, location and channel codes.
use serde::Deserialize;
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

const FDSN_PREFIX: &str = "FDSN:";

const MAX_NETWORK_LEN: usize = 10;
const MAX_STATION_LEN: usize = 10;
const MAX_LOCATION_LEN: usize = 10;
const MAX_CHANNEL_LEN: usize = 30;

#[derive(Debug, Error)]
pub enum SourceIdError {
    #[error("Source id \"{0}\" does not have network, station, location and channel fields")]
    MissingFields(String),
    #[error("Source id \"{id}\" has an empty {field} code")]
    EmptyField { id: String, field: &'static str },
    #[error("Source id \"{id}\" has a {field} code longer than {max} characters")]
    FieldTooLong {
        id: String,
        field: &'static str,
        max: usize,
    },
    #[error("Invalid source id pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Identifies one stream of samples, e.g. `FDSN:TW_YULB__H_H_E`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the identifier into its network, station, location and channel codes.
    ///
    /// Both the FDSN form `FDSN:NET_STA_LOC_B_S_SS` and the legacy `NET_STA_LOC_CHAN`
    /// form are accepted. A channel made of three single character codes, such as
    /// `H_H_Z`, is collapsed to `HHZ`.
    pub fn nslc(&self) -> Result<Nslc, SourceIdError> {
        let body = self.0.strip_prefix(FDSN_PREFIX).unwrap_or(&self.0);
        let mut fields = body.splitn(4, '_');
        let (Some(network), Some(station), Some(location), Some(channel)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(SourceIdError::MissingFields(self.0.clone()));
        };

        let nslc = Nslc {
            network: self.checked_field(network, "network", MAX_NETWORK_LEN)?,
            station: self.checked_field(station, "station", MAX_STATION_LEN)?,
            location: self.checked_field(location, "location", MAX_LOCATION_LEN)?,
            channel: self.checked_field(&collapse_channel(channel), "channel", MAX_CHANNEL_LEN)?,
        };
        if nslc.network.is_empty() {
            return Err(SourceIdError::EmptyField {
                id: self.0.clone(),
                field: "network",
            });
        }
        if nslc.station.is_empty() {
            return Err(SourceIdError::EmptyField {
                id: self.0.clone(),
                field: "station",
            });
        }
        Ok(nslc)
    }

    fn checked_field(
        &self,
        value: &str,
        field: &'static str,
        max: usize,
    ) -> Result<String, SourceIdError> {
        if value.chars().count() > max {
            Err(SourceIdError::FieldTooLong {
                id: self.0.clone(),
                field,
                max,
            })
        } else {
            Ok(value.to_owned())
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `B_S_SS` with single character band, source and subsource codes becomes `BSS`.
fn collapse_channel(channel: &str) -> String {
    let codes = channel.split('_').collect::<Vec<_>>();
    if codes.len() == 3 && codes.iter().all(|code| code.chars().count() == 1) {
        codes.concat()
    } else {
        channel.to_owned()
    }
}

/// Network, station, location and channel codes of a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nslc {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
}

/// Glob pattern used to select sources, `*` selects every source.
#[derive(Debug, Clone, Default)]
pub enum SourceIdPattern {
    #[default]
    Any,
    Glob(glob::Pattern),
}

impl SourceIdPattern {
    pub fn new(pattern: &str) -> Result<Self, SourceIdError> {
        Ok(Self::Glob(glob::Pattern::new(pattern)?))
    }

    pub fn matches(&self, source_id: &SourceId) -> bool {
        match self {
            Self::Any => true,
            Self::Glob(pattern) => pattern.matches(source_id.as_str()),
        }
    }
}

impl FromStr for SourceIdPattern {
    type Err = SourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for SourceIdPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Glob(pattern) => f.write_str(pattern.as_str()),
        }
    }
}

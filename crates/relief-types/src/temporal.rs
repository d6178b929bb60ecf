use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Fixed capture time of the global ledger's genesis block.
pub const GLOBAL_GENESIS_TIMESTAMP: &str = "2026-02-01T00:00:00";

/// ISO-8601 wall-clock capture time of a block.
///
/// The text is kept verbatim: it participates in the block digest, so a
/// reloaded block must present exactly the characters it was hashed with.
/// Parsing is only done for display and for relief-id date stamps.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Current UTC time with millisecond precision and a `Z` suffix.
    pub fn now() -> Self {
        Self(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// The fixed genesis capture time of the global ledger.
    pub fn global_genesis() -> Self {
        Self(GLOBAL_GENESIS_TIMESTAMP.to_string())
    }

    /// Wrap stored text without validation.
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The stored text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the stored text as a UTC instant.
    ///
    /// Accepts RFC 3339 and the zone-less `YYYY-MM-DDTHH:MM:SS` form, which
    /// is interpreted as UTC.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, TypeError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.0) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.0, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| TypeError::InvalidTimestamp {
                value: self.0.clone(),
                reason: e.to_string(),
            })
    }

    /// `YYYYMMDD` stamp used in relief identifiers.
    pub fn date_stamp(&self) -> Result<String, TypeError> {
        Ok(self.to_datetime()?.format("%Y%m%d").to_string())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

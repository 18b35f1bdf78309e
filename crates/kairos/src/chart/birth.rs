use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ephemeris::GeoLocation;
use crate::error::{KairosError, Result};

/// Coordinates are rounded to this many decimals in cache keys (about 11 m).
const KEY_COORD_DECIMALS: i32 = 4;

/// Birth instant and place: the only inputs a natal chart depends on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BirthData {
    pub instant: DateTime<Utc>,
    pub location: GeoLocation,
}

impl BirthData {
    pub fn new(instant: DateTime<Utc>, location: GeoLocation) -> Self {
        Self { instant, location }
    }

    /// Parse a civil date (`YYYY-MM-DD`) and clock time (`HH:MM` or `HH:MM:SS`)
    /// recorded at `utc_offset_minutes` east of UTC.
    pub fn from_local(date: &str, time: &str, utc_offset_minutes: i32, lat: f64, lon: f64) -> Result<Self> {
        let location = GeoLocation::new(lat, lon)?;

        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| KairosError::InvalidInstant {
            input: date.to_string(),
            reason: e.to_string(),
        })?;
        let time = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M"))
            .map_err(|e| KairosError::InvalidInstant {
                input: time.to_string(),
                reason: e.to_string(),
            })?;
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).ok_or_else(|| {
            KairosError::InvalidInstant {
                input: utc_offset_minutes.to_string(),
                reason: "UTC offset must be within +/-24h".to_string(),
            }
        })?;

        let local = NaiveDateTime::new(date, time);
        let instant = offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| KairosError::InvalidInstant {
                input: local.to_string(),
                reason: "ambiguous local time".to_string(),
            })?
            .with_timezone(&Utc);

        Ok(Self { instant, location })
    }

    /// Canonical cache key: UTC date, UTC time of day, rounded latitude and longitude.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.instant.format("%Y-%m-%d"),
            self.instant.format("%H:%M:%S"),
            key_coord(self.location.lat),
            key_coord(self.location.lon),
        )
    }
}

fn key_coord(value: f64) -> String {
    let scale = 10f64.powi(KEY_COORD_DECIMALS);
    // + 0.0 folds -0.0 so both hemispheres of zero share a key
    let rounded = (value * scale).round() / scale + 0.0;
    format!("{:.*}", KEY_COORD_DECIMALS as usize, rounded)
}

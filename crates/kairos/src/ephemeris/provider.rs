use chrono::{DateTime, TimeZone, Utc};

use crate::ephemeris::types::{Body, BodyLongitude, GeoLocation};
use crate::error::ProviderError;
use crate::geometry::normalize;

/// Julian day of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Source of raw ecliptic longitudes.
///
/// Implementations must fail explicitly for inputs they cannot serve instead
/// of returning 0 or NaN. Callers go through [`checked_longitude`] and
/// [`checked_angles`], which enforce finiteness and normalization.
pub trait EphemerisProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Geocentric tropical longitude of `body`, degrees.
    fn longitude(
        &self,
        body: Body,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<f64, ProviderError>;

    /// Ecliptic longitude of the ascendant, degrees.
    fn ascendant(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError>;

    /// Ecliptic longitude of the midheaven, degrees.
    fn midheaven(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError>;
}

/// Query a body and normalize the result to [0, 360).
pub fn checked_longitude(
    provider: &dyn EphemerisProvider,
    body: Body,
    instant: DateTime<Utc>,
    location: GeoLocation,
) -> Result<f64, ProviderError> {
    let raw = provider.longitude(body, instant, location)?;
    finite(raw, body.as_str(), instant)
}

/// Query ascendant and midheaven, normalized.
pub fn checked_angles(
    provider: &dyn EphemerisProvider,
    instant: DateTime<Utc>,
    location: GeoLocation,
) -> Result<(f64, f64), ProviderError> {
    let asc = finite(provider.ascendant(instant, location)?, "ascendant", instant)?;
    let mc = finite(provider.midheaven(instant, location)?, "midheaven", instant)?;
    Ok((asc, mc))
}

/// Resolve every body in [`Body::ALL`] at one instant.
pub fn all_longitudes(
    provider: &dyn EphemerisProvider,
    instant: DateTime<Utc>,
    location: GeoLocation,
) -> Result<Vec<BodyLongitude>, ProviderError> {
    Body::ALL
        .iter()
        .map(|&body| {
            checked_longitude(provider, body, instant, location).map(|lon| BodyLongitude { body, lon })
        })
        .collect()
}

fn finite(value: f64, what: &str, instant: DateTime<Utc>) -> Result<f64, ProviderError> {
    if !value.is_finite() {
        return Err(ProviderError::NonFinite {
            body: what.to_string(),
            instant,
        });
    }
    Ok(normalize(value))
}

/// Convert UTC datetime to Julian Day
pub fn datetime_to_julian_day(dt: DateTime<Utc>) -> f64 {
    let seconds = dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9;
    UNIX_EPOCH_JD + seconds / SECONDS_PER_DAY
}

/// Convert Julian Day to UTC datetime, rounded to the millisecond.
pub fn julian_day_to_datetime(jd: f64) -> Option<DateTime<Utc>> {
    let millis = ((jd - UNIX_EPOCH_JD) * SECONDS_PER_DAY * 1000.0).round();
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Broken;

    impl EphemerisProvider for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn longitude(&self, _: Body, _: DateTime<Utc>, _: GeoLocation) -> Result<f64, ProviderError> {
            Ok(f64::NAN)
        }
        fn ascendant(&self, _: DateTime<Utc>, _: GeoLocation) -> Result<f64, ProviderError> {
            Ok(-30.0)
        }
        fn midheaven(&self, _: DateTime<Utc>, _: GeoLocation) -> Result<f64, ProviderError> {
            Ok(f64::INFINITY)
        }
    }

    #[test]
    fn julian_day_of_j2000() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((datetime_to_julian_day(j2000) - 2_451_545.0).abs() < 1e-9);
        assert_eq!(julian_day_to_datetime(2_451_545.0), Some(j2000));
    }

    #[test]
    fn nan_longitude_is_an_error_not_zero() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let loc = GeoLocation { lat: 0.0, lon: 0.0 };
        let err = checked_longitude(&Broken, Body::Mars, now, loc).unwrap_err();
        assert_eq!(
            err,
            ProviderError::NonFinite {
                body: "mars".to_string(),
                instant: now
            }
        );
        assert!(checked_angles(&Broken, now, loc).is_err());
    }
}

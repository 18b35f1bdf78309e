//! Moon void-of-course detection.
//!
//! The Moon is void when it makes no further major aspect before leaving its
//! sign. Detection scans forward in fixed steps from the check instant up to
//! the sooner of the estimated sign change or a hard cap, testing the Moon
//! against every other body.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::aspects::{Aspect, AspectCalculator};
use crate::ephemeris::{checked_longitude, Body, BodyLongitude, EphemerisProvider, GeoLocation};
use crate::error::ProviderError;
use crate::geometry::{forward_arc, zodiac_position};
use crate::western::ZodiacSign;

pub const DEFAULT_VOID_ORB: f64 = 8.0;
pub const DEFAULT_VOID_STEP_MINUTES: i64 = 60;
pub const DEFAULT_VOID_CAP_HOURS: i64 = 72;

/// Below this hourly motion the sign change cannot be estimated.
const MIN_MOON_SPEED: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidResult {
    pub checked_at: DateTime<Utc>,
    pub is_void: bool,
    /// Last aspect the Moon made, if one falls within the backward scan.
    pub void_start: Option<DateTime<Utc>>,
    pub void_end: Option<DateTime<Utc>>,
    /// Estimated instant the Moon enters the next sign.
    pub sign_change: Option<DateTime<Utc>>,
    /// Last instant the forward scan reached.
    pub scanned_until: DateTime<Utc>,
    pub next_aspect: Option<Aspect>,
    pub next_aspect_at: Option<DateTime<Utc>>,
    pub next_aspect_label: Option<String>,
    pub moon_sign: ZodiacSign,
    /// Degree within `moon_sign`, [0, 30)
    pub moon_degree: f64,
}

impl VoidResult {
    /// Whether the scan established the void all the way to the sign change.
    pub fn reaches_sign_change(&self) -> bool {
        self.is_void && self.sign_change.is_some_and(|change| change <= self.scanned_until)
    }

    /// Whether `instant` falls inside this result's void interval. A void cut
    /// short by the scan cap covers nothing beyond its own check instant.
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        self.reaches_sign_change()
            && instant >= self.checked_at
            && self.void_end.is_some_and(|end| instant < end)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VoidOfCourseDetector {
    calculator: AspectCalculator,
    step: Duration,
    cap: Duration,
}

impl VoidOfCourseDetector {
    pub fn new(orb: f64, step: Duration, cap: Duration) -> Self {
        Self {
            calculator: AspectCalculator::new(orb),
            step: if step > Duration::zero() {
                step
            } else {
                Duration::minutes(DEFAULT_VOID_STEP_MINUTES)
            },
            cap,
        }
    }

    pub fn detect(
        &self,
        provider: &dyn EphemerisProvider,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<VoidResult, ProviderError> {
        let moon = checked_longitude(provider, Body::Moon, instant, location)?;
        let position = zodiac_position(moon);
        let sign_change = self.estimate_sign_change(provider, instant, location, moon)?;

        let horizon = match sign_change {
            Some(change) => (instant + self.cap).min(change),
            None => instant + self.cap,
        };

        let mut result = VoidResult {
            checked_at: instant,
            is_void: false,
            void_start: None,
            void_end: None,
            sign_change,
            scanned_until: horizon,
            next_aspect: None,
            next_aspect_at: None,
            next_aspect_label: None,
            moon_sign: position.sign,
            moon_degree: position.degree,
        };

        let mut at = instant + self.step;
        while at <= horizon {
            if let Some(aspect) = self.moon_aspect(provider, at, location)? {
                if sign_change.map_or(true, |change| at < change) {
                    log::debug!("Moon not void at {instant}: {} at {at}", aspect.label());
                    result.next_aspect_label = Some(aspect.label());
                    result.next_aspect = Some(aspect);
                    result.next_aspect_at = Some(at);
                    return Ok(result);
                }
                break;
            }
            at += self.step;
        }

        result.is_void = true;
        result.void_start = self.last_aspect_before(provider, instant, location)?;
        // the sign change bounds the interval only when the scan reached it
        result.void_end = match sign_change {
            Some(change) if change <= horizon => Some(change),
            _ => Some(horizon),
        };
        log::debug!(
            "Moon void at {instant} in {} until {:?}",
            result.moon_sign,
            result.void_end
        );
        Ok(result)
    }

    /// Linear extrapolation of the Moon's motion over one hour.
    fn estimate_sign_change(
        &self,
        provider: &dyn EphemerisProvider,
        instant: DateTime<Utc>,
        location: GeoLocation,
        moon: f64,
    ) -> Result<Option<DateTime<Utc>>, ProviderError> {
        let later = checked_longitude(provider, Body::Moon, instant + Duration::hours(1), location)?;
        let speed = forward_arc(moon, later);
        if speed < MIN_MOON_SPEED || speed >= 180.0 {
            return Ok(None);
        }
        let remaining = 30.0 - zodiac_position(moon).degree;
        let seconds = (remaining / speed * 3600.0).round() as i64;
        Ok(Some(instant + Duration::seconds(seconds)))
    }

    fn last_aspect_before(
        &self,
        provider: &dyn EphemerisProvider,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<Option<DateTime<Utc>>, ProviderError> {
        let limit = instant - self.cap;
        let mut at = instant - self.step;
        while at >= limit {
            if self.moon_aspect(provider, at, location)?.is_some() {
                return Ok(Some(at));
            }
            at -= self.step;
        }
        Ok(None)
    }

    fn moon_aspect(
        &self,
        provider: &dyn EphemerisProvider,
        at: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<Option<Aspect>, ProviderError> {
        let moon = checked_longitude(provider, Body::Moon, at, location)?;
        let others = Body::ALL
            .iter()
            .filter(|&&b| b != Body::Moon)
            .map(|&body| checked_longitude(provider, body, at, location).map(|lon| BodyLongitude { body, lon }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.calculator.tightest_from(Body::Moon, moon, &others))
    }
}

impl Default for VoidOfCourseDetector {
    fn default() -> Self {
        Self::new(
            DEFAULT_VOID_ORB,
            Duration::minutes(DEFAULT_VOID_STEP_MINUTES),
            Duration::hours(DEFAULT_VOID_CAP_HOURS),
        )
    }
}

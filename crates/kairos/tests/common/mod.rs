#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use kairos::ephemeris::{Body, EphemerisProvider, GeoLocation};
use kairos::ProviderError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

pub fn new_york() -> GeoLocation {
    GeoLocation::new(40.7128, -74.006).unwrap()
}

fn index(body: Body) -> usize {
    Body::ALL.iter().position(|&b| b == body).unwrap()
}

/// Bodies moving at constant speed from `epoch()`.
#[derive(Debug, Clone)]
pub struct LinearSky {
    base: [f64; 10],
    /// Degrees per day
    speed: [f64; 10],
    pub ascendant: f64,
    pub midheaven: f64,
}

impl LinearSky {
    /// Everything at 0 deg and stationary; ascendant 0.
    pub fn new() -> Self {
        Self {
            base: [0.0; 10],
            speed: [0.0; 10],
            ascendant: 0.0,
            midheaven: 270.0,
        }
    }

    pub fn with(mut self, body: Body, lon: f64, speed_per_day: f64) -> Self {
        self.base[index(body)] = lon;
        self.speed[index(body)] = speed_per_day;
        self
    }

    pub fn all_at(mut self, lon: f64) -> Self {
        self.base = [lon; 10];
        self
    }

    pub fn rising(mut self, ascendant: f64) -> Self {
        self.ascendant = ascendant;
        self.midheaven = ascendant - 90.0;
        self
    }
}

impl EphemerisProvider for LinearSky {
    fn name(&self) -> &str {
        "linear"
    }

    fn longitude(&self, body: Body, instant: DateTime<Utc>, _: GeoLocation) -> Result<f64, ProviderError> {
        let days = (instant - epoch()).num_seconds() as f64 / 86_400.0;
        let i = index(body);
        Ok(self.base[i] + self.speed[i] * days)
    }

    fn ascendant(&self, _: DateTime<Utc>, _: GeoLocation) -> Result<f64, ProviderError> {
        Ok(self.ascendant)
    }

    fn midheaven(&self, _: DateTime<Utc>, _: GeoLocation) -> Result<f64, ProviderError> {
        Ok(self.midheaven)
    }
}

/// Fails every call at the listed instants.
pub struct FailingAt<P> {
    pub inner: P,
    pub instants: Vec<DateTime<Utc>>,
}

impl<P: EphemerisProvider> FailingAt<P> {
    fn check(&self, body: Body, instant: DateTime<Utc>) -> Result<(), ProviderError> {
        if self.instants.contains(&instant) {
            return Err(ProviderError::calculation_failed(body, instant, "injected failure"));
        }
        Ok(())
    }
}

impl<P: EphemerisProvider> EphemerisProvider for FailingAt<P> {
    fn name(&self) -> &str {
        "failing"
    }

    fn longitude(&self, body: Body, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        self.check(body, instant)?;
        self.inner.longitude(body, instant, location)
    }

    fn ascendant(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        self.check(Body::Sun, instant)?;
        self.inner.ascendant(instant, location)
    }

    fn midheaven(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        self.check(Body::Sun, instant)?;
        self.inner.midheaven(instant, location)
    }
}

/// Counts chart builds (one ascendant lookup each) and can be told to fail.
pub struct CountingProvider<P> {
    pub inner: P,
    pub builds: AtomicUsize,
    pub failing: AtomicBool,
    pub delay: StdDuration,
}

impl<P> CountingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            builds: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: StdDuration::ZERO,
        }
    }

    pub fn slow(inner: P, delay: StdDuration) -> Self {
        Self {
            delay,
            ..Self::new(inner)
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl<P: EphemerisProvider> EphemerisProvider for CountingProvider<P> {
    fn name(&self) -> &str {
        "counting"
    }

    fn longitude(&self, body: Body, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::calculation_failed(body, instant, "backend offline"));
        }
        self.inner.longitude(body, instant, location)
    }

    fn ascendant(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.inner.ascendant(instant, location)
    }

    fn midheaven(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        self.inner.midheaven(instant, location)
    }
}

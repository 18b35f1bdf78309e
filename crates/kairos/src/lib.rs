//! Natal charts, aspect scoring, Moon void-of-course detection and
//! best-timing search over a pluggable ephemeris.

pub mod aspects;
pub mod chart;
pub mod engine;
pub mod ephemeris;
pub mod error;
pub mod geometry;
pub mod settings;
pub mod timing;
pub mod western;

pub use chart::{BirthData, ChartCache, NatalChart};
pub use engine::Engine;
pub use ephemeris::{AnalyticEphemeris, Body, EphemerisProvider, GeoLocation};
#[cfg(feature = "swisseph")]
pub use ephemeris::SwissEphemeris;
pub use error::{ErrorClass, KairosError, ProviderError, Result};
pub use settings::EngineSettings;
pub use timing::{ActionProfile, ProfileRegistry, SearchOutcome, SearchRequest, TimedMoment, VoidResult};

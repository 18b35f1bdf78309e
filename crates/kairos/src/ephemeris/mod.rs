pub mod analytic;
pub mod provider;
#[cfg(feature = "swisseph")]
pub mod swiss;
pub mod types;

pub use analytic::AnalyticEphemeris;
pub use provider::{
    all_longitudes, checked_angles, checked_longitude, datetime_to_julian_day, julian_day_to_datetime,
    EphemerisProvider,
};
#[cfg(feature = "swisseph")]
pub use swiss::SwissEphemeris;
pub use types::{Body, BodyLongitude, GeoLocation};

use chrono::{DateTime, Utc};
use std::env;
use std::path::PathBuf;
use std::sync::Mutex;
use swisseph::swe::{calc_ut, houses_ex};
use swisseph::AscMc;

use crate::ephemeris::provider::{datetime_to_julian_day, EphemerisProvider};
use crate::ephemeris::types::{Body, GeoLocation};
use crate::error::ProviderError;

// SUN=0 .. PLUTO=9
const PLANET_IDS: &[(Body, i32)] = &[
    (Body::Sun, 0),
    (Body::Moon, 1),
    (Body::Mercury, 2),
    (Body::Venus, 3),
    (Body::Mars, 4),
    (Body::Jupiter, 5),
    (Body::Saturn, 6),
    (Body::Uranus, 7),
    (Body::Neptune, 8),
    (Body::Pluto, 9),
];

/// FLG_SWIEPH
const FLAGS: i32 = 2;
const EQUAL_HOUSES: u8 = b'E';

/// Swiss Ephemeris backend. The C library keeps global state, so calls are serialized.
pub struct SwissEphemeris {
    ephemeris_path: PathBuf,
    guard: Mutex<()>,
}

impl SwissEphemeris {
    /// Create a provider with optional ephemeris path, falling back to
    /// `SWISS_EPHEMERIS_PATH` and then `/usr/local/share/swisseph`.
    pub fn new(ephemeris_path: Option<PathBuf>) -> Result<Self, ProviderError> {
        let path = ephemeris_path.unwrap_or_else(|| {
            env::var("SWISS_EPHEMERIS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/usr/local/share/swisseph"))
        });

        if !path.exists() {
            return Err(ProviderError::EphemerisFiles {
                path: path.display().to_string(),
                message: "Ephemeris path does not exist. Please ensure Swiss Ephemeris data files are installed."
                    .to_string(),
            });
        }

        Ok(Self {
            ephemeris_path: path,
            guard: Mutex::new(()),
        })
    }

    pub fn ephemeris_path(&self) -> &PathBuf {
        &self.ephemeris_path
    }

    fn angles(&self, instant: DateTime<Utc>, location: GeoLocation) -> (f64, f64) {
        let jd = datetime_to_julian_day(instant);
        let _lock = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let (_cusps, ascmc) = houses_ex(jd, FLAGS, location.lat, location.lon, EQUAL_HOUSES as i32);
        let ascmc = AscMc::from_array(ascmc);
        (ascmc.ascendant, ascmc.mc)
    }
}

impl EphemerisProvider for SwissEphemeris {
    fn name(&self) -> &str {
        "swisseph"
    }

    fn longitude(
        &self,
        body: Body,
        instant: DateTime<Utc>,
        _location: GeoLocation,
    ) -> Result<f64, ProviderError> {
        let code = PLANET_IDS
            .iter()
            .find(|(b, _)| *b == body)
            .map(|(_, code)| *code)
            .ok_or_else(|| ProviderError::UnknownBody {
                name: body.as_str().to_string(),
            })?;

        let jd = datetime_to_julian_day(instant);
        let _lock = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let result = calc_ut(jd, code as u32, FLAGS as u32)
            .map_err(|e| ProviderError::calculation_failed(body, instant, format!("Swiss Ephemeris error: {e}")))?;
        Ok(result.out[0])
    }

    fn ascendant(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        Ok(self.angles(instant, location).0)
    }

    fn midheaven(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        Ok(self.angles(instant, location).1)
    }
}

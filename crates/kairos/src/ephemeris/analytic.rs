//! Pure-Rust low-precision ephemeris.
//!
//! Planets use the Keplerian mean elements of Standish (JPL, valid 1800-2050),
//! rotated from the J2000 ecliptic to the equinox of date by the general
//! precession in longitude. The Moon uses the leading periodic terms of the
//! ELP-based series in Meeus ch. 47 (accurate to a few tenths of a degree).
//! Ascendant and midheaven come from mean sidereal time and the mean obliquity.

use chrono::{DateTime, Datelike, Utc};
use std::f64::consts::PI;

use crate::ephemeris::provider::{datetime_to_julian_day, EphemerisProvider};
use crate::ephemeris::types::{Body, GeoLocation};
use crate::error::ProviderError;
use crate::geometry::normalize;

const J2000_JD: f64 = 2_451_545.0;
const DAYS_PER_CENTURY: f64 = 36_525.0;
/// General precession in longitude, degrees per Julian century.
const PRECESSION_DEG_PER_CENTURY: f64 = 1.396_971_3;

const MIN_YEAR: i32 = 1800;
const MAX_YEAR: i32 = 2050;
/// House angles degenerate at the poles.
const MAX_ABS_LATITUDE: f64 = 89.9;

/// Keplerian elements at J2000 and their rates per century:
/// a (au), e, I, L, longitude of perihelion, longitude of ascending node (degrees).
struct Elements {
    base: [f64; 6],
    rate: [f64; 6],
}

const MERCURY: Elements = Elements {
    base: [0.38709927, 0.20563593, 7.00497902, 252.25032350, 77.45779628, 48.33076593],
    rate: [0.00000037, 0.00001906, -0.00594749, 149472.67411175, 0.16047689, -0.12534081],
};
const VENUS: Elements = Elements {
    base: [0.72333566, 0.00677672, 3.39467605, 181.97909950, 131.60246718, 76.67984255],
    rate: [0.00000390, -0.00004107, -0.00078890, 58517.81538729, 0.00268329, -0.27769418],
};
const EARTH_MOON_BARYCENTER: Elements = Elements {
    base: [1.00000261, 0.01671123, -0.00001531, 100.46457166, 102.93768193, 0.0],
    rate: [0.00000562, -0.00004392, -0.01294668, 35999.37244981, 0.32327364, 0.0],
};
const MARS: Elements = Elements {
    base: [1.52371034, 0.09339410, 1.84969142, -4.55343205, -23.94362959, 49.55953891],
    rate: [0.00001847, 0.00007882, -0.00813131, 19140.30268499, 0.44441088, -0.29257343],
};
const JUPITER: Elements = Elements {
    base: [5.20288700, 0.04838624, 1.30439695, 34.39644051, 14.72847983, 100.47390909],
    rate: [-0.00011607, -0.00013253, -0.00183714, 3034.74612775, 0.21252668, 0.20469106],
};
const SATURN: Elements = Elements {
    base: [9.53667594, 0.05386179, 2.48599187, 49.95424423, 92.59887831, 113.66242448],
    rate: [-0.00125060, -0.00050991, 0.00193609, 1222.49362201, -0.41897216, -0.28867794],
};
const URANUS: Elements = Elements {
    base: [19.18916464, 0.04725744, 0.77263783, 313.23810451, 170.95427630, 74.01692503],
    rate: [-0.00196176, -0.00004397, -0.00242939, 428.48202785, 0.40805281, 0.04240589],
};
const NEPTUNE: Elements = Elements {
    base: [30.06992276, 0.00859048, 1.77004347, -55.12002969, 44.96476227, 131.78422574],
    rate: [0.00026291, 0.00005105, 0.00035372, 218.45945325, -0.32241464, -0.00508664],
};
const PLUTO: Elements = Elements {
    base: [39.48211675, 0.24882730, 17.14001206, 238.92903833, 224.06891629, 110.30393684],
    rate: [-0.00031596, 0.00005170, 0.00004818, 145.20780515, -0.04062942, -0.01183482],
};

/// (coefficient in degrees, multipliers of D, M, M', F)
const MOON_TERMS: &[(f64, [f64; 4])] = &[
    (6.288774, [0.0, 0.0, 1.0, 0.0]),
    (1.274027, [2.0, 0.0, -1.0, 0.0]),
    (0.658314, [2.0, 0.0, 0.0, 0.0]),
    (0.213618, [0.0, 0.0, 2.0, 0.0]),
    (-0.185116, [0.0, 1.0, 0.0, 0.0]),
    (-0.114332, [0.0, 0.0, 0.0, 2.0]),
    (0.058793, [2.0, 0.0, -2.0, 0.0]),
    (0.057066, [2.0, -1.0, -1.0, 0.0]),
    (0.053322, [2.0, 0.0, 1.0, 0.0]),
    (0.045758, [2.0, -1.0, 0.0, 0.0]),
    (-0.040923, [0.0, 1.0, -1.0, 0.0]),
    (-0.034720, [1.0, 0.0, 0.0, 0.0]),
    (-0.030383, [0.0, 1.0, 1.0, 0.0]),
    (0.015327, [2.0, 0.0, 0.0, -2.0]),
    (-0.012528, [0.0, 0.0, 1.0, 2.0]),
    (0.010980, [0.0, 0.0, 1.0, -2.0]),
    (0.010675, [4.0, 0.0, -1.0, 0.0]),
    (0.010034, [0.0, 0.0, 3.0, 0.0]),
    (0.008548, [4.0, 0.0, -2.0, 0.0]),
    (-0.007888, [2.0, 1.0, -1.0, 0.0]),
    (-0.006766, [2.0, 1.0, 0.0, 0.0]),
    (-0.005163, [1.0, 0.0, -1.0, 0.0]),
    (0.004987, [1.0, 1.0, 0.0, 0.0]),
    (0.004036, [2.0, -1.0, 1.0, 0.0]),
];

/// Default provider: closed-form series, no data files.
#[derive(Debug, Clone, Default)]
pub struct AnalyticEphemeris;

impl AnalyticEphemeris {
    pub fn new() -> Self {
        Self
    }

    fn centuries(&self, instant: DateTime<Utc>) -> Result<f64, ProviderError> {
        let year = instant.year();
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ProviderError::OutOfRange {
                what: "year".to_string(),
                value: f64::from(year),
                supported: format!("{MIN_YEAR}..={MAX_YEAR}"),
            });
        }
        Ok((datetime_to_julian_day(instant) - J2000_JD) / DAYS_PER_CENTURY)
    }

    fn check_latitude(&self, location: GeoLocation) -> Result<(), ProviderError> {
        if location.lat.abs() >= MAX_ABS_LATITUDE || !location.lat.is_finite() {
            return Err(ProviderError::OutOfRange {
                what: "latitude".to_string(),
                value: location.lat,
                supported: format!("(-{MAX_ABS_LATITUDE}, {MAX_ABS_LATITUDE})"),
            });
        }
        Ok(())
    }

    /// Local sidereal time and mean obliquity, radians.
    fn sidereal_frame(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<(f64, f64), ProviderError> {
        self.check_latitude(location)?;
        let t = self.centuries(instant)?;
        let d = datetime_to_julian_day(instant) - J2000_JD;
        let gmst = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0;
        let lst = normalize(gmst + location.lon).to_radians();
        Ok((lst, mean_obliquity(t).to_radians()))
    }
}

impl EphemerisProvider for AnalyticEphemeris {
    fn name(&self) -> &str {
        "analytic"
    }

    fn longitude(
        &self,
        body: Body,
        instant: DateTime<Utc>,
        _location: GeoLocation,
    ) -> Result<f64, ProviderError> {
        let t = self.centuries(instant)?;
        let lon = match body {
            Body::Moon => moon_longitude(t),
            Body::Sun => {
                let (xe, ye, _) = heliocentric(&EARTH_MOON_BARYCENTER, t);
                precess(geocentric_longitude(-xe, -ye), t)
            }
            planet => {
                let (xe, ye, _) = heliocentric(&EARTH_MOON_BARYCENTER, t);
                let (xp, yp, _) = heliocentric(elements_for(planet), t);
                precess(geocentric_longitude(xp - xe, yp - ye), t)
            }
        };
        Ok(lon)
    }

    fn ascendant(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        let (lst, eps) = self.sidereal_frame(instant, location)?;
        let phi = location.lat.to_radians();
        let asc = f64::atan2(lst.cos(), -(lst.sin() * eps.cos() + phi.tan() * eps.sin()));
        Ok(normalize(asc.to_degrees()))
    }

    fn midheaven(&self, instant: DateTime<Utc>, location: GeoLocation) -> Result<f64, ProviderError> {
        let (lst, eps) = self.sidereal_frame(instant, location)?;
        let mc = f64::atan2(lst.sin(), lst.cos() * eps.cos());
        Ok(normalize(mc.to_degrees()))
    }
}

fn elements_for(body: Body) -> &'static Elements {
    match body {
        Body::Mercury => &MERCURY,
        Body::Venus => &VENUS,
        Body::Mars => &MARS,
        Body::Jupiter => &JUPITER,
        Body::Saturn => &SATURN,
        Body::Uranus => &URANUS,
        Body::Neptune => &NEPTUNE,
        Body::Pluto => &PLUTO,
        Body::Sun | Body::Moon => &EARTH_MOON_BARYCENTER,
    }
}

/// Mean obliquity of the ecliptic, degrees.
fn mean_obliquity(t: f64) -> f64 {
    23.439_291 - 0.013_004_2 * t
}

fn precess(lon_j2000: f64, t: f64) -> f64 {
    normalize(lon_j2000 + PRECESSION_DEG_PER_CENTURY * t)
}

fn geocentric_longitude(x: f64, y: f64) -> f64 {
    normalize(y.atan2(x).to_degrees())
}

/// Heliocentric J2000 ecliptic coordinates, au.
fn heliocentric(el: &Elements, t: f64) -> (f64, f64, f64) {
    let at = |i: usize| el.base[i] + el.rate[i] * t;
    let a = at(0);
    let e = at(1);
    let incl = at(2).to_radians();
    let mean_lon = at(3);
    let peri = at(4);
    let node = at(5);

    let arg_peri = (peri - node).to_radians();
    let node = node.to_radians();
    let mut mean_anomaly = (mean_lon - peri) % 360.0;
    if mean_anomaly > 180.0 {
        mean_anomaly -= 360.0;
    } else if mean_anomaly < -180.0 {
        mean_anomaly += 360.0;
    }
    let ecc_anomaly = solve_kepler(mean_anomaly.to_radians(), e);

    let xp = a * (ecc_anomaly.cos() - e);
    let yp = a * (1.0 - e * e).sqrt() * ecc_anomaly.sin();

    let (sw, cw) = arg_peri.sin_cos();
    let (so, co) = node.sin_cos();
    let (si, ci) = incl.sin_cos();

    let x = (cw * co - sw * so * ci) * xp + (-sw * co - cw * so * ci) * yp;
    let y = (cw * so + sw * co * ci) * xp + (-sw * so + cw * co * ci) * yp;
    let z = (sw * si) * xp + (cw * si) * yp;
    (x, y, z)
}

/// Newton iteration on E - e sin E = M, radians.
fn solve_kepler(mean_anomaly: f64, e: f64) -> f64 {
    let mut ecc = mean_anomaly + e * mean_anomaly.sin();
    for _ in 0..30 {
        let delta = (ecc - e * ecc.sin() - mean_anomaly) / (1.0 - e * ecc.cos());
        ecc -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    ecc
}

fn moon_longitude(t: f64) -> f64 {
    let mean_lon = 218.316_447_7 + 481_267.881_234_21 * t;
    let d = 297.850_192_1 + 445_267.111_403_4 * t;
    let m = 357.529_109_2 + 35_999.050_290_9 * t;
    let m_prime = 134.963_396_4 + 477_198.867_505_5 * t;
    let f = 93.272_095_0 + 483_202.017_523_3 * t;
    // Solar eccentricity damping of terms involving M.
    let ecc = 1.0 - 0.002_516 * t - 0.000_007_4 * t * t;

    let sum: f64 = MOON_TERMS
        .iter()
        .map(|(coeff, [cd, cm, cmp, cf])| {
            let arg = (cd * d + cm * m + cmp * m_prime + cf * f) * PI / 180.0;
            let damp = ecc.powi(cm.abs() as i32);
            coeff * damp * arg.sin()
        })
        .sum();
    normalize(mean_lon + sum)
}

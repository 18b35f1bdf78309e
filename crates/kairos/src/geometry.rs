//! Pure angular helpers shared by every calculation.

use crate::aspects::AspectType;
use crate::western::{ZodiacPosition, ZodiacSign};

/// Reduce any longitude to [0, 360).
pub fn normalize(longitude: f64) -> f64 {
    let lon = longitude.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if lon >= 360.0 {
        0.0
    } else {
        lon
    }
}

/// Sign and degree-in-sign for a longitude. 30.0 exactly belongs to the next sign.
pub fn zodiac_position(longitude: f64) -> ZodiacPosition {
    let lon = normalize(longitude);
    let index = (lon / 30.0).floor() as usize;
    let degree = lon - index as f64 * 30.0;
    ZodiacPosition {
        sign: ZodiacSign::from_index(index),
        degree: if degree >= 30.0 { 0.0 } else { degree.max(0.0) },
    }
}

/// Circular distance between two longitudes, in [0, 180]. Symmetric.
pub fn shortest_angular_distance(a: f64, b: f64) -> f64 {
    let diff = normalize(a - b);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Forward arc from `from` to `to`, in [0, 360).
pub fn forward_arc(from: f64, to: f64) -> f64 {
    normalize(to - from)
}

/// Classify an angular separation as the nearest major aspect within `orb`.
///
/// The deviation from the target must be strictly less than `orb`, so a
/// separation exactly `orb` away does not match. Separations outside [0, 180]
/// are folded onto it first. When two targets are equally close (only possible
/// with orb > 30), the smaller target angle wins.
pub fn aspect_type(angle: f64, orb: f64) -> Option<AspectType> {
    if !angle.is_finite() || !orb.is_finite() || orb < 0.0 {
        return None;
    }
    let separation = shortest_angular_distance(angle, 0.0);
    let mut best: Option<(AspectType, f64)> = None;
    for aspect in AspectType::ALL {
        let deviation = (separation - aspect.angle()).abs();
        if deviation >= orb {
            continue;
        }
        match best {
            Some((_, best_dev)) if deviation >= best_dev => {}
            _ => best = Some((aspect, deviation)),
        }
    }
    best.map(|(aspect, _)| aspect)
}

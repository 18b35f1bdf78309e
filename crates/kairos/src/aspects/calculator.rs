use crate::aspects::types::{Aspect, AspectTarget};
use crate::ephemeris::{Body, BodyLongitude};
use crate::geometry::{aspect_type, shortest_angular_distance};

/// Default orb for every major aspect, degrees.
pub const DEFAULT_ORB: f64 = 8.0;

/// Aspect calculator with a single orb for all aspect types.
#[derive(Debug, Clone, Copy)]
pub struct AspectCalculator {
    orb: f64,
}

impl AspectCalculator {
    pub fn new(orb: f64) -> Self {
        Self { orb }
    }

    pub fn orb(&self) -> f64 {
        self.orb
    }

    /// Aspect between a body and any other longitude, if one is within orb.
    pub fn calculate_aspect(&self, body: Body, lon: f64, target: AspectTarget, target_lon: f64) -> Option<Aspect> {
        let separation = shortest_angular_distance(lon, target_lon);
        aspect_type(separation, self.orb).map(|aspect_type| Aspect {
            body,
            target,
            aspect_type,
            separation,
            orb: (separation - aspect_type.angle()).abs(),
        })
    }

    /// Aspects between all body pairs of one chart, in input order.
    pub fn compute_pairwise(&self, bodies: &[BodyLongitude]) -> Vec<Aspect> {
        let mut pairs = Vec::new();
        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (a, b) = (&bodies[i], &bodies[j]);
                if let Some(aspect) = self.calculate_aspect(a.body, a.lon, AspectTarget::Body(b.body), b.lon) {
                    pairs.push(aspect);
                }
            }
        }
        pairs
    }

    /// Aspects from one body to every other body in `others`, skipping itself.
    pub fn compute_from(&self, body: Body, lon: f64, others: &[BodyLongitude]) -> Vec<Aspect> {
        others
            .iter()
            .filter(|other| other.body != body)
            .filter_map(|other| self.calculate_aspect(body, lon, AspectTarget::Body(other.body), other.lon))
            .collect()
    }

    /// Tightest aspect from one body to the others, ties broken by chart order.
    pub fn tightest_from(&self, body: Body, lon: f64, others: &[BodyLongitude]) -> Option<Aspect> {
        self.compute_from(body, lon, others)
            .into_iter()
            .fold(None, |best: Option<Aspect>, aspect| match best {
                Some(b) if b.orb <= aspect.orb => Some(b),
                _ => Some(aspect),
            })
    }
}

impl Default for AspectCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_ORB)
    }
}

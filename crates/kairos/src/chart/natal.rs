//! Natal chart construction: body longitudes, equal-house cusps, signs and
//! temperament tallies.
//!
//! Charts are built only through [`crate::chart::ChartCache`], so that equal
//! birth data always yields the same shared chart.

use serde::{Deserialize, Serialize};

use crate::aspects::{Aspect, AspectCalculator};
use crate::chart::birth::BirthData;
use crate::ephemeris::{all_longitudes, checked_angles, Body, BodyLongitude, EphemerisProvider, GeoLocation};
use crate::error::ProviderError;
use crate::geometry::{forward_arc, normalize, zodiac_position};
use crate::western::{Element, Modality, ZodiacPosition, ZodiacSign};

pub const HOUSE_COUNT: u8 = 12;

/// A body placed in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedBody {
    pub body: Body,
    pub lon: f64,
    pub position: ZodiacPosition,
    /// 1-12
    pub house: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseCusp {
    /// 1-12
    pub number: u8,
    pub lon: f64,
    pub position: ZodiacPosition,
}

/// Sun, Moon and rising signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigThree {
    pub sun: ZodiacSign,
    pub moon: ZodiacSign,
    pub rising: ZodiacSign,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementTally {
    pub fire: u8,
    pub earth: u8,
    pub air: u8,
    pub water: u8,
}

impl ElementTally {
    pub fn count(&self, element: Element) -> u8 {
        match element {
            Element::Fire => self.fire,
            Element::Earth => self.earth,
            Element::Air => self.air,
            Element::Water => self.water,
        }
    }

    fn add(&mut self, element: Element) {
        match element {
            Element::Fire => self.fire += 1,
            Element::Earth => self.earth += 1,
            Element::Air => self.air += 1,
            Element::Water => self.water += 1,
        }
    }

    /// Highest count; ties go to the earlier of fire, earth, air, water.
    pub fn dominant(&self) -> Element {
        [Element::Fire, Element::Earth, Element::Air, Element::Water]
            .into_iter()
            .fold(Element::Fire, |best, e| if self.count(e) > self.count(best) { e } else { best })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityTally {
    pub cardinal: u8,
    pub fixed: u8,
    pub mutable: u8,
}

impl ModalityTally {
    pub fn count(&self, modality: Modality) -> u8 {
        match modality {
            Modality::Cardinal => self.cardinal,
            Modality::Fixed => self.fixed,
            Modality::Mutable => self.mutable,
        }
    }

    fn add(&mut self, modality: Modality) {
        match modality {
            Modality::Cardinal => self.cardinal += 1,
            Modality::Fixed => self.fixed += 1,
            Modality::Mutable => self.mutable += 1,
        }
    }

    pub fn dominant(&self) -> Modality {
        [Modality::Cardinal, Modality::Fixed, Modality::Mutable]
            .into_iter()
            .fold(Modality::Cardinal, |best, m| if self.count(m) > self.count(best) { m } else { best })
    }
}

/// A complete natal chart. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalChart {
    birth: BirthData,
    bodies: Vec<PlacedBody>,
    houses: Vec<HouseCusp>,
    ascendant: f64,
    midheaven: f64,
    big_three: BigThree,
    elements: ElementTally,
    modalities: ModalityTally,
}

impl NatalChart {
    pub fn birth(&self) -> &BirthData {
        &self.birth
    }

    pub fn location(&self) -> GeoLocation {
        self.birth.location
    }

    /// All ten bodies in [`Body::ALL`] order.
    pub fn bodies(&self) -> &[PlacedBody] {
        &self.bodies
    }

    pub fn body(&self, body: Body) -> Option<&PlacedBody> {
        self.bodies.iter().find(|p| p.body == body)
    }

    /// Twelve cusps, house 1 first.
    pub fn houses(&self) -> &[HouseCusp] {
        &self.houses
    }

    /// Cusp longitude of house `number` (1-12).
    pub fn cusp(&self, number: u8) -> Option<f64> {
        self.houses.iter().find(|h| h.number == number).map(|h| h.lon)
    }

    pub fn ascendant(&self) -> f64 {
        self.ascendant
    }

    pub fn midheaven(&self) -> f64 {
        self.midheaven
    }

    pub fn big_three(&self) -> BigThree {
        self.big_three
    }

    pub fn element_tally(&self) -> ElementTally {
        self.elements
    }

    pub fn modality_tally(&self) -> ModalityTally {
        self.modalities
    }

    pub fn dominant_element(&self) -> Element {
        self.elements.dominant()
    }

    pub fn dominant_modality(&self) -> Modality {
        self.modalities.dominant()
    }

    /// House containing `lon`.
    pub fn house_of(&self, lon: f64) -> u8 {
        house_of(&self.houses, lon)
    }

    /// Major aspects between natal bodies.
    pub fn natal_aspects(&self, orb: f64) -> Vec<Aspect> {
        let longitudes: Vec<BodyLongitude> = self
            .bodies
            .iter()
            .map(|p| BodyLongitude { body: p.body, lon: p.lon })
            .collect();
        AspectCalculator::new(orb).compute_pairwise(&longitudes)
    }

    /// Serialized form handed to the API layer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Equal-house cusps: house n starts at ascendant + 30 * (n - 1).
pub fn equal_house_cusps(ascendant: f64) -> Vec<HouseCusp> {
    let ascendant = normalize(ascendant);
    (1..=HOUSE_COUNT)
        .map(|number| {
            let lon = normalize(ascendant + 30.0 * f64::from(number - 1));
            HouseCusp {
                number,
                lon,
                position: zodiac_position(lon),
            }
        })
        .collect()
}

/// The house whose cusp-to-next-cusp arc contains `lon`.
pub fn house_of(houses: &[HouseCusp], lon: f64) -> u8 {
    let lon = normalize(lon);
    for (i, cusp) in houses.iter().enumerate() {
        let next = &houses[(i + 1) % houses.len()];
        let span = forward_arc(cusp.lon, next.lon);
        if forward_arc(cusp.lon, lon) < span {
            return cusp.number;
        }
    }
    // Rounding left `lon` on no arc: it sits on a cusp boundary.
    houses
        .iter()
        .min_by(|a, b| forward_arc(a.lon, lon).total_cmp(&forward_arc(b.lon, lon)))
        .map(|h| h.number)
        .unwrap_or(1)
}

pub(crate) fn build(provider: &dyn EphemerisProvider, birth: &BirthData) -> Result<NatalChart, ProviderError> {
    let longitudes = all_longitudes(provider, birth.instant, birth.location)?;
    let (ascendant, midheaven) = checked_angles(provider, birth.instant, birth.location)?;
    let houses = equal_house_cusps(ascendant);

    let mut elements = ElementTally::default();
    let mut modalities = ModalityTally::default();
    let bodies: Vec<PlacedBody> = longitudes
        .iter()
        .map(|bl| {
            let position = zodiac_position(bl.lon);
            elements.add(position.sign.element());
            modalities.add(position.sign.modality());
            PlacedBody {
                body: bl.body,
                lon: bl.lon,
                position,
                house: house_of(&houses, bl.lon),
            }
        })
        .collect();

    let sign_of = |body: Body| {
        bodies
            .iter()
            .find(|p| p.body == body)
            .map(|p| p.position.sign)
            .ok_or_else(|| ProviderError::UnknownBody {
                name: body.as_str().to_string(),
            })
    };
    let big_three = BigThree {
        sun: sign_of(Body::Sun)?,
        moon: sign_of(Body::Moon)?,
        rising: zodiac_position(ascendant).sign,
    };

    log::info!(
        "Built natal chart via {} for {}: sun {}, moon {}, rising {}",
        provider.name(),
        birth.cache_key(),
        big_three.sun,
        big_three.moon,
        big_three.rising
    );

    Ok(NatalChart {
        birth: *birth,
        bodies,
        houses,
        ascendant,
        midheaven,
        big_three,
        elements,
        modalities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn house_one_is_the_ascendant() {
        for asc in [0.0, 24.78, 179.99, 359.5] {
            let cusps = equal_house_cusps(asc);
            assert_eq!(cusps.len(), 12);
            assert_eq!(cusps[0].number, 1);
            assert_eq!(cusps[0].lon, asc);
        }
    }

    #[test]
    fn tenth_house_from_aquarius_rising() {
        let cusps = equal_house_cusps(24.78);
        let tenth = cusps[9];
        assert_eq!(tenth.number, 10);
        assert!((tenth.lon - 294.78).abs() < 1e-9);
        assert_eq!(tenth.position.sign, ZodiacSign::Capricorn);
        assert!((tenth.position.degree - 24.78).abs() < 1e-9);
    }

    #[test]
    fn houses_wrap_through_aries() {
        let cusps = equal_house_cusps(350.0);
        assert_eq!(house_of(&cusps, 355.0), 1);
        assert_eq!(house_of(&cusps, 19.9), 1);
        assert_eq!(house_of(&cusps, 20.0), 2);
        assert_eq!(house_of(&cusps, 349.9), 12);
    }

    #[test]
    fn every_longitude_lands_in_exactly_one_house() {
        let cusps = equal_house_cusps(123.4);
        for tenth in 0..3599 {
            let lon = f64::from(tenth) / 10.0 + 0.05;
            let house = house_of(&cusps, lon);
            assert!((1..=12).contains(&house));
            let expected = (forward_arc(123.4, lon) / 30.0).floor() as u8 + 1;
            assert_eq!(house, expected.min(12), "lon {lon}");
        }
    }

    #[test]
    fn dominant_ties_resolve_in_fixed_order() {
        let tally = ElementTally {
            fire: 2,
            earth: 3,
            air: 3,
            water: 2,
        };
        assert_eq!(tally.dominant(), Element::Earth);
        assert_eq!(ModalityTally::default().dominant(), Modality::Cardinal);
    }
}

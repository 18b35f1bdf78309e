mod common;

use common::{epoch, new_york, LinearSky};
use kairos::chart::{BirthData, ChartCache};
use kairos::ephemeris::{AnalyticEphemeris, Body};
use kairos::western::{Element, ZodiacSign};
use kairos::KairosError;

fn sky() -> LinearSky {
    LinearSky::new()
        .rising(24.78)
        .with(Body::Sun, 100.0, 1.0)
        .with(Body::Moon, 200.0, 13.0)
        .with(Body::Mercury, 95.0, 1.2)
        .with(Body::Venus, 130.0, 1.1)
        .with(Body::Mars, 10.0, 0.5)
        .with(Body::Jupiter, 250.0, 0.1)
        .with(Body::Saturn, 330.0, 0.03)
        .with(Body::Uranus, 45.0, 0.01)
        .with(Body::Neptune, 355.0, 0.01)
        .with(Body::Pluto, 300.0, 0.01)
}

#[test]
fn test_house_one_is_the_ascendant() {
    let cache = ChartCache::new();
    let chart = cache.get_or_build(&sky(), &BirthData::new(epoch(), new_york())).unwrap();

    assert_eq!(chart.houses().len(), 12);
    assert_eq!(chart.cusp(1), Some(chart.ascendant()));
    assert!((chart.ascendant() - 24.78).abs() < 1e-9);
}

#[test]
fn test_tenth_cusp_from_equal_houses() {
    let cache = ChartCache::new();
    let chart = cache.get_or_build(&sky(), &BirthData::new(epoch(), new_york())).unwrap();

    let tenth = chart.houses()[9];
    assert_eq!(tenth.number, 10);
    assert!((tenth.lon - 294.78).abs() < 1e-9);
    assert_eq!(tenth.position.sign, ZodiacSign::Capricorn);
}

#[test]
fn test_bodies_are_placed_in_signs_and_houses() {
    let cache = ChartCache::new();
    let chart = cache.get_or_build(&sky(), &BirthData::new(epoch(), new_york())).unwrap();

    assert_eq!(chart.bodies().len(), 10);
    let sun = chart.body(Body::Sun).unwrap();
    assert_eq!(sun.position.sign, ZodiacSign::Cancer);
    assert!((sun.position.degree - 10.0).abs() < 1e-9);
    // 100 - 24.78 = 75.22 deg past the ascendant
    assert_eq!(sun.house, 3);
    // 355 is 330.22 past the ascendant
    assert_eq!(chart.body(Body::Neptune).unwrap().house, 12);

    let big_three = chart.big_three();
    assert_eq!(big_three.sun, ZodiacSign::Cancer);
    assert_eq!(big_three.moon, ZodiacSign::Libra);
    assert_eq!(big_three.rising, ZodiacSign::Aries);
}

#[test]
fn test_temperament_tallies_cover_every_body() {
    let cache = ChartCache::new();
    let chart = cache.get_or_build(&sky(), &BirthData::new(epoch(), new_york())).unwrap();

    let elements = chart.element_tally();
    assert_eq!(elements.fire + elements.earth + elements.air + elements.water, 10);
    let modalities = chart.modality_tally();
    assert_eq!(modalities.cardinal + modalities.fixed + modalities.mutable, 10);
    // Sun, Mercury, Saturn and Neptune
    assert_eq!(elements.water, 4);
    assert_eq!(elements.fire, 3);
    assert_eq!(chart.dominant_element(), Element::Water);
}

#[test]
fn test_natal_aspects_between_bodies() {
    let cache = ChartCache::new();
    let chart = cache.get_or_build(&sky(), &BirthData::new(epoch(), new_york())).unwrap();

    let aspects = chart.natal_aspects(8.0);
    // Sun 100 and Mercury 95
    assert!(aspects
        .iter()
        .any(|a| a.label() == "Sun conjunction Mercury"));
    assert!(aspects.iter().all(|a| a.orb < 8.0));
}

#[test]
fn test_chart_serializes_for_the_api() {
    let cache = ChartCache::new();
    let chart = cache.get_or_build(&sky(), &BirthData::new(epoch(), new_york())).unwrap();

    let json = chart.to_json().unwrap();
    assert!(json.contains("\"houses\""));
    assert!(json.contains("\"big_three\""));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["bodies"][0]["body"], "sun");
}

#[test]
fn test_analytic_chart_for_a_summer_birth() {
    let birth = BirthData::from_local("1990-07-15", "14:30", -240, 40.7128, -74.006).unwrap();
    let cache = ChartCache::new();
    let chart = cache.get_or_build(&AnalyticEphemeris::default(), &birth).unwrap();

    assert_eq!(chart.big_three().sun, ZodiacSign::Cancer);
    for placed in chart.bodies() {
        assert!((0.0..360.0).contains(&placed.lon));
        assert!((1..=12).contains(&placed.house));
        assert_eq!(placed.house, chart.house_of(placed.lon));
    }
}

#[test]
fn test_invalid_birth_data_is_rejected_before_computation() {
    let err = BirthData::from_local("1990-07-15", "14:30", 0, 91.0, 0.0).unwrap_err();
    assert!(matches!(err, KairosError::InvalidCoordinates { .. }));
    assert!(!err.is_retryable());
}

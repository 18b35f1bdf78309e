mod common;

use chrono::Duration;
use common::{epoch, FailingAt, LinearSky};
use kairos::ephemeris::{AnalyticEphemeris, Body};
use kairos::western::ZodiacSign;
use kairos::{Engine, ErrorClass, KairosError};
use std::sync::Arc;

fn engine(provider: impl kairos::EphemerisProvider + 'static) -> Engine {
    Engine::with_defaults(Arc::new(provider)).unwrap()
}

#[test]
fn test_moon_late_in_sign_without_aspects_is_void() {
    // Moon at 29 Gemini, 0.5 deg/h; everything else 16 deg ahead
    let sky = LinearSky::new().all_at(105.0).with(Body::Moon, 89.0, 12.0);
    let result = engine(sky).detect_moon_void(epoch(), 51.5, -0.12).unwrap();

    assert!(result.is_void);
    assert_eq!(result.moon_sign, ZodiacSign::Gemini);
    assert!((result.moon_degree - 29.0).abs() < 1e-9);
    assert_eq!(result.sign_change, Some(epoch() + Duration::hours(2)));
    assert_eq!(result.void_end, result.sign_change);
    assert!(result.next_aspect_label.is_none());
}

#[test]
fn test_upcoming_aspect_means_not_void() {
    // Moon closes on a trine with Jupiter at 200 long before leaving Gemini
    let sky = LinearSky::new()
        .all_at(105.0)
        .with(Body::Jupiter, 200.0, 0.0)
        .with(Body::Moon, 70.0, 12.0);
    let result = engine(sky).detect_moon_void(epoch(), 51.5, -0.12).unwrap();

    assert!(!result.is_void);
    assert!(result.void_end.is_none());
    let aspect = result.next_aspect.unwrap();
    assert_eq!(aspect.aspect_type, kairos::aspects::AspectType::Trine);
    assert_eq!(result.next_aspect_label.as_deref(), Some("Moon trine Jupiter"));
    assert!(result.next_aspect_at.unwrap() < result.sign_change.unwrap());
}

#[test]
fn test_provider_failure_aborts_detection() {
    let sky = LinearSky::new().all_at(105.0).with(Body::Moon, 89.0, 12.0);
    let failing = FailingAt {
        inner: sky,
        instants: vec![epoch() + Duration::hours(1)],
    };
    let err = engine(failing).detect_moon_void(epoch(), 51.5, -0.12).unwrap_err();

    assert!(matches!(err, KairosError::Provider(_)));
    assert_eq!(err.class(), ErrorClass::Retryable);
}

#[test]
fn test_invalid_coordinates_are_rejected() {
    let err = engine(LinearSky::new())
        .detect_moon_void(epoch(), 12.0, 190.0)
        .unwrap_err();
    assert!(matches!(err, KairosError::InvalidCoordinates { .. }));
    assert_eq!(err.class(), ErrorClass::Client);
}

#[test]
fn test_analytic_detection_is_consistent() {
    let engine = engine(AnalyticEphemeris::default());
    for day in 0..10 {
        let at = epoch() + Duration::days(day * 3);
        let result = engine.detect_moon_void(at, 40.7128, -74.006).unwrap();

        assert!((0.0..30.0).contains(&result.moon_degree));
        let sign_change = result.sign_change.unwrap();
        assert!(sign_change > at);
        assert!(sign_change <= at + Duration::days(3));
        if result.is_void {
            assert_eq!(result.void_end, Some(sign_change));
        } else {
            assert!(result.next_aspect_at.unwrap() < sign_change);
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aspects::{Aspect, AspectCalculator, AspectTarget, AspectType};
use crate::chart::NatalChart;
use crate::ephemeris::{checked_longitude, Body, EphemerisProvider};
use crate::error::ProviderError;
use crate::timing::profile::{ActionProfile, HouseTier};
use crate::timing::void_of_course::VoidOfCourseDetector;

pub const DEFAULT_VOID_PENALTY: i32 = 5;
pub const DEFAULT_TENSE_PENALTY: i32 = 3;

/// Points per aspect type for one house tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPoints {
    pub conjunction: i32,
    pub sextile: i32,
    pub square: i32,
    pub trine: i32,
    pub opposition: i32,
}

impl TierPoints {
    pub fn points(&self, aspect: AspectType) -> i32 {
        match aspect {
            AspectType::Conjunction => self.conjunction,
            AspectType::Sextile => self.sextile,
            AspectType::Square => self.square,
            AspectType::Trine => self.trine,
            AspectType::Opposition => self.opposition,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTable {
    pub primary: TierPoints,
    pub secondary: TierPoints,
}

impl ScoringTable {
    pub fn points(&self, tier: HouseTier, aspect: AspectType) -> i32 {
        match tier {
            HouseTier::Primary => self.primary.points(aspect),
            HouseTier::Secondary => self.secondary.points(aspect),
        }
    }
}

impl Default for ScoringTable {
    fn default() -> Self {
        Self {
            primary: TierPoints {
                conjunction: 8,
                sextile: 7,
                trine: 10,
                ..TierPoints::default()
            },
            secondary: TierPoints {
                conjunction: 4,
                sextile: 3,
                trine: 5,
                ..TierPoints::default()
            },
        }
    }
}

/// A transiting aspect to a natal house cusp that earned points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedAspect {
    pub aspect: Aspect,
    pub tier: HouseTier,
    pub points: i32,
}

impl MatchedAspect {
    pub fn house(&self) -> Option<u8> {
        self.aspect.house()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    MoonVoid,
    TenseAspect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub kind: PenaltyKind,
    pub label: String,
    pub points: i32,
}

/// Score of one instant for one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedMoment {
    pub instant: DateTime<Utc>,
    pub score: i32,
    pub matched_aspects: Vec<MatchedAspect>,
    pub penalties: Vec<Penalty>,
    /// Squares and oppositions from beneficial bodies to primary houses.
    pub warnings: Vec<Aspect>,
    pub is_moon_void: bool,
}

impl TimedMoment {
    pub fn is_positive(&self) -> bool {
        self.score > 0
    }

    pub fn penalty_total(&self) -> i32 {
        self.penalties.iter().map(|p| p.points).sum()
    }
}

/// Evaluates transiting positions against natal house cusps.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    calculator: AspectCalculator,
    table: ScoringTable,
    void_penalty: i32,
    tense_penalty: i32,
    detector: VoidOfCourseDetector,
}

impl Scorer {
    pub fn new(
        orb: f64,
        table: ScoringTable,
        void_penalty: i32,
        tense_penalty: i32,
        detector: VoidOfCourseDetector,
    ) -> Self {
        Self {
            calculator: AspectCalculator::new(orb),
            table,
            void_penalty,
            tense_penalty,
            detector,
        }
    }

    pub fn detector(&self) -> &VoidOfCourseDetector {
        &self.detector
    }

    /// Score `instant`, running void-of-course detection at the natal location.
    pub fn score(
        &self,
        provider: &dyn EphemerisProvider,
        instant: DateTime<Utc>,
        chart: &NatalChart,
        profile: &ActionProfile,
    ) -> Result<TimedMoment, ProviderError> {
        let void = self.detector.detect(provider, instant, chart.location())?;
        self.score_with_void(provider, instant, chart, profile, void.is_void)
    }

    /// Score `instant` with an already known void-of-course state.
    pub fn score_with_void(
        &self,
        provider: &dyn EphemerisProvider,
        instant: DateTime<Utc>,
        chart: &NatalChart,
        profile: &ActionProfile,
        is_moon_void: bool,
    ) -> Result<TimedMoment, ProviderError> {
        let transits = profile
            .beneficial_bodies
            .iter()
            .map(|&body| checked_longitude(provider, body, instant, chart.location()).map(|lon| (body, lon)))
            .collect::<Result<Vec<(Body, f64)>, _>>()?;

        let mut matched_aspects = Vec::new();
        for &(body, lon) in &transits {
            for (house, tier) in profile.houses() {
                let Some(aspect) = self.house_aspect(chart, body, lon, house) else {
                    continue;
                };
                if !profile.prefers(aspect.aspect_type) {
                    continue;
                }
                let points = self.table.points(tier, aspect.aspect_type);
                if points > 0 {
                    matched_aspects.push(MatchedAspect { aspect, tier, points });
                }
            }
        }

        let mut penalties = Vec::new();
        let mut warnings = Vec::new();
        for &(body, lon) in &transits {
            for &house in &profile.primary_houses {
                if let Some(aspect) = self.house_aspect(chart, body, lon, house) {
                    if aspect.aspect_type.is_tense() {
                        penalties.push(Penalty {
                            kind: PenaltyKind::TenseAspect,
                            label: aspect.label(),
                            points: self.tense_penalty,
                        });
                        warnings.push(aspect);
                    }
                }
            }
        }
        if is_moon_void {
            penalties.push(Penalty {
                kind: PenaltyKind::MoonVoid,
                label: "Moon void of course".to_string(),
                points: self.void_penalty,
            });
        }

        let gained: i32 = matched_aspects.iter().map(|m| m.points).sum();
        let lost: i32 = penalties.iter().map(|p| p.points).sum();

        Ok(TimedMoment {
            instant,
            score: gained - lost,
            matched_aspects,
            penalties,
            warnings,
            is_moon_void,
        })
    }

    fn house_aspect(&self, chart: &NatalChart, body: Body, lon: f64, house: u8) -> Option<Aspect> {
        let cusp = chart.cusp(house)?;
        self.calculator
            .calculate_aspect(body, lon, AspectTarget::House(house), cusp)
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(
            crate::aspects::DEFAULT_ORB,
            ScoringTable::default(),
            DEFAULT_VOID_PENALTY,
            DEFAULT_TENSE_PENALTY,
            VoidOfCourseDetector::default(),
        )
    }
}

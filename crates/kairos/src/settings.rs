use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::aspects::DEFAULT_ORB;
use crate::chart::DEFAULT_CACHE_CAPACITY;
use crate::timing::scorer::{ScoringTable, Scorer, DEFAULT_TENSE_PENALTY, DEFAULT_VOID_PENALTY};
use crate::timing::void_of_course::{
    VoidOfCourseDetector, DEFAULT_VOID_CAP_HOURS, DEFAULT_VOID_ORB, DEFAULT_VOID_STEP_MINUTES,
};

pub const DEFAULT_SEARCH_STEP_MINUTES: i64 = 6 * 60;
pub const DEFAULT_MAX_DAYS_AHEAD: u32 = 366;

/// Upper bounds for the time tunables. Out-of-range values are clamped here
/// and rejected by config validation.
pub const MAX_VOID_STEP_MINUTES: i64 = 24 * 60;
pub const MAX_VOID_CAP_HOURS: i64 = 24 * 30;
pub const MAX_SEARCH_STEP_MINUTES: i64 = 24 * 60;
pub const MAX_DAYS_AHEAD_LIMIT: u32 = 3660;

/// Engine tunables. Every field has a default, so partial TOML tables work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // Aspects
    pub aspect_orb: f64,

    // Void of course
    pub void_orb: f64,
    pub void_step_minutes: i64,
    pub void_cap_hours: i64,

    // Scoring
    pub void_penalty: i32,
    pub tense_penalty: i32,
    pub scoring: ScoringTable,

    // Cache
    pub cache_capacity: usize,

    // Search
    pub search_step_minutes: i64,
    pub max_days_ahead: u32,
    pub search_workers: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            aspect_orb: DEFAULT_ORB,

            void_orb: DEFAULT_VOID_ORB,
            void_step_minutes: DEFAULT_VOID_STEP_MINUTES,
            void_cap_hours: DEFAULT_VOID_CAP_HOURS,

            void_penalty: DEFAULT_VOID_PENALTY,
            tense_penalty: DEFAULT_TENSE_PENALTY,
            scoring: ScoringTable::default(),

            cache_capacity: DEFAULT_CACHE_CAPACITY,

            search_step_minutes: DEFAULT_SEARCH_STEP_MINUTES,
            max_days_ahead: DEFAULT_MAX_DAYS_AHEAD,
            search_workers: 1,
        }
    }
}

impl EngineSettings {
    pub fn void_detector(&self) -> VoidOfCourseDetector {
        VoidOfCourseDetector::new(
            self.void_orb,
            Duration::minutes(self.void_step_minutes.clamp(0, MAX_VOID_STEP_MINUTES)),
            Duration::hours(self.void_cap_hours.clamp(0, MAX_VOID_CAP_HOURS)),
        )
    }

    pub fn scorer(&self) -> Scorer {
        Scorer::new(
            self.aspect_orb,
            self.scoring,
            self.void_penalty,
            self.tense_penalty,
            self.void_detector(),
        )
    }

    pub fn search_step(&self) -> Duration {
        Duration::minutes(self.search_step_minutes.clamp(0, MAX_SEARCH_STEP_MINUTES))
    }
}

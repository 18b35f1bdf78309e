//! Best-timing search over a fixed-step time grid.
//!
//! Each step is scored independently against the immutable natal chart and
//! profile, so the grid can be split into contiguous shards and scanned on
//! scoped threads. Results are always returned sorted by instant. A failed
//! provider lookup skips its step and the scan continues.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::thread;

use crate::chart::NatalChart;
use crate::ephemeris::EphemerisProvider;
use crate::error::{KairosError, Result};
use crate::settings::DEFAULT_SEARCH_STEP_MINUTES;
use crate::timing::profile::ActionProfile;
use crate::timing::scorer::{Scorer, TimedMoment};
use crate::timing::void_of_course::VoidResult;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// First instant scanned.
    pub start: DateTime<Utc>,
    pub days_ahead: u32,
    pub step: Duration,
    /// Drop moments scoring zero or less.
    pub positive_only: bool,
    /// Offset used to group moments into calendar days.
    pub utc_offset_minutes: i32,
    pub workers: usize,
}

impl SearchRequest {
    pub fn new(start: DateTime<Utc>, days_ahead: u32) -> Self {
        Self {
            start,
            days_ahead,
            step: Duration::minutes(DEFAULT_SEARCH_STEP_MINUTES),
            positive_only: false,
            utc_offset_minutes: 0,
            workers: 1,
        }
    }

    pub fn from_now(days_ahead: u32) -> Self {
        Self::new(Utc::now(), days_ahead)
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    pub fn positive_only(mut self, positive_only: bool) -> Self {
        self.positive_only = positive_only;
        self
    }

    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Exclusive end of the scanned range.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::days(i64::from(self.days_ahead))
    }

    pub fn validate(&self, max_days_ahead: u32) -> Result<()> {
        let invalid = |reason: String| Err(KairosError::InvalidSearch { reason });
        if self.days_ahead == 0 {
            return invalid("days_ahead must be at least 1".to_string());
        }
        if self.days_ahead > max_days_ahead {
            return invalid(format!("days_ahead {} exceeds the limit of {max_days_ahead}", self.days_ahead));
        }
        if self.step <= Duration::zero() {
            return invalid(format!("step must be positive, got {}", self.step));
        }
        if self.offset().is_none() {
            return invalid(format!("utc offset {} minutes is out of range", self.utc_offset_minutes));
        }
        Ok(())
    }

    /// Grid instants from `start` (inclusive) to `end()` (exclusive).
    pub fn instants(&self) -> Vec<DateTime<Utc>> {
        if self.step <= Duration::zero() {
            return Vec::new();
        }
        let end = self.end();
        let mut instants = Vec::new();
        let mut at = self.start;
        while at < end {
            instants.push(at);
            at += self.step;
        }
        instants
    }

    fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }
}

/// A grid step dropped because the provider failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedStep {
    pub instant: DateTime<Utc>,
    pub reason: String,
}

/// Best moment of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBest {
    pub date: NaiveDate,
    pub moment: TimedMoment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub profile_id: String,
    pub utc_offset_minutes: i32,
    /// Ascending by instant.
    pub moments: Vec<TimedMoment>,
    pub skipped: Vec<SkippedStep>,
}

impl SearchOutcome {
    /// Highest-scoring moment per calendar day; the earliest wins a tie.
    pub fn best_per_day(&self) -> Vec<DayBest> {
        let offset = FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        let mut days: BTreeMap<NaiveDate, &TimedMoment> = BTreeMap::new();
        for moment in &self.moments {
            let date = moment.instant.with_timezone(&offset).date_naive();
            match days.get(&date) {
                Some(best) if best.score >= moment.score => {}
                _ => {
                    days.insert(date, moment);
                }
            }
        }
        days.into_iter()
            .map(|(date, moment)| DayBest {
                date,
                moment: moment.clone(),
            })
            .collect()
    }

    /// The `n` best moments, by score then earliest instant.
    pub fn top(&self, n: usize) -> Vec<&TimedMoment> {
        let mut ranked: Vec<&TimedMoment> = self.moments.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.instant.cmp(&b.instant)));
        ranked.truncate(n);
        ranked
    }

    pub fn best(&self) -> Option<&TimedMoment> {
        self.top(1).into_iter().next()
    }
}

/// Scores every step of a [`SearchRequest`] grid for one chart and profile.
pub struct BestTimingSearch<'a> {
    provider: &'a dyn EphemerisProvider,
    scorer: &'a Scorer,
    chart: &'a NatalChart,
    profile: &'a ActionProfile,
}

impl<'a> BestTimingSearch<'a> {
    pub fn new(
        provider: &'a dyn EphemerisProvider,
        scorer: &'a Scorer,
        chart: &'a NatalChart,
        profile: &'a ActionProfile,
    ) -> Self {
        Self {
            provider,
            scorer,
            chart,
            profile,
        }
    }

    /// Run the scan. The request must already be validated.
    pub fn run(&self, request: &SearchRequest) -> SearchOutcome {
        let instants = request.instants();
        let workers = request.workers.clamp(1, instants.len().max(1));

        let shards = if workers == 1 {
            vec![self.scan(&instants, request.positive_only)]
        } else {
            let chunk = instants.len().div_ceil(workers);
            thread::scope(|scope| {
                let handles: Vec<_> = instants
                    .chunks(chunk)
                    .map(|shard| scope.spawn(move || self.scan(shard, request.positive_only)))
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                    .collect::<Vec<_>>()
            })
        };

        let mut moments = Vec::new();
        let mut skipped = Vec::new();
        for (shard_moments, shard_skipped) in shards {
            moments.extend(shard_moments);
            skipped.extend(shard_skipped);
        }
        moments.sort_by_key(|m| m.instant);
        skipped.sort_by_key(|s| s.instant);

        log::info!(
            "Scanned {} steps for {}: {} moments kept, {} skipped ({} workers)",
            instants.len(),
            self.profile.display_name(),
            moments.len(),
            skipped.len(),
            workers
        );

        SearchOutcome {
            profile_id: self.profile.id.clone(),
            utc_offset_minutes: request.utc_offset_minutes,
            moments,
            skipped,
        }
    }

    fn scan(&self, instants: &[DateTime<Utc>], positive_only: bool) -> (Vec<TimedMoment>, Vec<SkippedStep>) {
        let location = self.chart.location();
        let mut moments = Vec::with_capacity(instants.len());
        let mut skipped = Vec::new();
        // the last void interval seen; later steps inside it skip detection
        let mut void_memo: Option<VoidResult> = None;

        for &at in instants {
            let cached = void_memo.as_ref().is_some_and(|v| v.covers(at));
            let is_void = if cached {
                true
            } else {
                match self.scorer.detector().detect(self.provider, at, location) {
                    Ok(result) => {
                        let is_void = result.is_void;
                        void_memo = Some(result);
                        is_void
                    }
                    Err(e) => {
                        log::warn!("Skipping search step {at}: {e}");
                        skipped.push(SkippedStep {
                            instant: at,
                            reason: e.to_string(),
                        });
                        continue;
                    }
                }
            };

            match self
                .scorer
                .score_with_void(self.provider, at, self.chart, self.profile, is_void)
            {
                Ok(moment) => {
                    if !positive_only || moment.is_positive() {
                        moments.push(moment);
                    }
                }
                Err(e) => {
                    log::warn!("Skipping search step {at}: {e}");
                    skipped.push(SkippedStep {
                        instant: at,
                        reason: e.to_string(),
                    });
                }
            }
        }
        log::debug!(
            "Shard scanned {} steps: {} kept, {} skipped",
            instants.len(),
            moments.len(),
            skipped.len()
        );
        (moments, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn grid_excludes_the_end() {
        let request = SearchRequest::new(start(), 2);
        let instants = request.instants();
        assert_eq!(instants.len(), 8);
        assert_eq!(instants[0], start());
        assert_eq!(instants[7], start() + Duration::hours(42));
    }

    #[test]
    fn validation_rejects_degenerate_requests() {
        assert!(SearchRequest::new(start(), 0).validate(366).is_err());
        assert!(SearchRequest::new(start(), 400).validate(366).is_err());
        assert!(SearchRequest::new(start(), 3)
            .with_step(Duration::zero())
            .validate(366)
            .is_err());
        assert!(SearchRequest::new(start(), 3)
            .with_utc_offset(24 * 60)
            .validate(366)
            .is_err());
        assert!(SearchRequest::new(start(), 3).validate(366).is_ok());
    }

    fn moment(hours: i64, score: i32) -> TimedMoment {
        TimedMoment {
            instant: start() + Duration::hours(hours),
            score,
            matched_aspects: Vec::new(),
            penalties: Vec::new(),
            warnings: Vec::new(),
            is_moon_void: false,
        }
    }

    #[test]
    fn best_per_day_prefers_earliest_on_ties() {
        let outcome = SearchOutcome {
            profile_id: "x".to_string(),
            utc_offset_minutes: 0,
            moments: vec![moment(0, 3), moment(6, 7), moment(12, 7), moment(30, -2), moment(36, -1)],
            skipped: Vec::new(),
        };
        let days = outcome.best_per_day();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].moment.instant, start() + Duration::hours(6));
        assert_eq!(days[1].moment.score, -1);
    }

    #[test]
    fn best_per_day_uses_the_request_offset() {
        // 22:00 UTC on Jan 1 is Jan 2 at +03:00
        let outcome = SearchOutcome {
            profile_id: "x".to_string(),
            utc_offset_minutes: 180,
            moments: vec![moment(12, 1), moment(22, 2)],
            skipped: Vec::new(),
        };
        let days = outcome.best_per_day();
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn top_ranks_by_score_then_instant() {
        let outcome = SearchOutcome {
            profile_id: "x".to_string(),
            utc_offset_minutes: 0,
            moments: vec![moment(0, 5), moment(6, 9), moment(12, 9), moment(18, 1)],
            skipped: Vec::new(),
        };
        let top: Vec<i64> = outcome
            .top(3)
            .iter()
            .map(|m| (m.instant - start()).num_hours())
            .collect();
        assert_eq!(top, vec![6, 12, 0]);
        assert_eq!(outcome.best().map(|m| m.score), Some(9));
    }
}

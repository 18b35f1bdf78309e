use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::chart::{BirthData, ChartCache, NatalChart};
use crate::ephemeris::{EphemerisProvider, GeoLocation};
use crate::error::Result;
use crate::settings::EngineSettings;
use crate::timing::{BestTimingSearch, ProfileRegistry, Scorer, SearchOutcome, SearchRequest, TimedMoment, VoidResult};

/// Composes a provider, chart cache, profile table and tunables.
///
/// The engine owns its cache; share one engine (behind an `Arc`) to share
/// charts between callers.
pub struct Engine {
    provider: Arc<dyn EphemerisProvider>,
    cache: ChartCache,
    profiles: ProfileRegistry,
    settings: EngineSettings,
    scorer: Scorer,
}

impl Engine {
    pub fn new(provider: Arc<dyn EphemerisProvider>, profiles: ProfileRegistry, settings: EngineSettings) -> Self {
        log::info!(
            "Kairos engine using {} provider, {} profiles, cache capacity {}",
            provider.name(),
            profiles.len(),
            settings.cache_capacity
        );
        Self {
            cache: ChartCache::with_capacity(settings.cache_capacity),
            scorer: settings.scorer(),
            provider,
            profiles,
            settings,
        }
    }

    /// Built-in profiles and default settings.
    pub fn with_defaults(provider: Arc<dyn EphemerisProvider>) -> Result<Self> {
        Ok(Self::new(provider, ProfileRegistry::builtin()?, EngineSettings::default()))
    }

    pub fn provider(&self) -> &dyn EphemerisProvider {
        self.provider.as_ref()
    }

    pub fn cache(&self) -> &ChartCache {
        &self.cache
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Natal chart for `birth`, served from the cache when present.
    pub fn build_natal_chart(&self, birth: &BirthData) -> Result<Arc<NatalChart>> {
        let location = GeoLocation::new(birth.location.lat, birth.location.lon)?;
        let birth = BirthData::new(birth.instant, location);
        Ok(self.cache.get_or_build(self.provider.as_ref(), &birth)?)
    }

    pub fn detect_moon_void(&self, instant: DateTime<Utc>, lat: f64, lon: f64) -> Result<VoidResult> {
        let location = GeoLocation::new(lat, lon)?;
        Ok(self
            .settings
            .void_detector()
            .detect(self.provider.as_ref(), instant, location)?)
    }

    /// Score one instant for the named profile.
    pub fn score_moment(&self, instant: DateTime<Utc>, chart: &NatalChart, profile_name: &str) -> Result<TimedMoment> {
        let profile = self.profiles.get(profile_name)?;
        Ok(self.scorer.score(self.provider.as_ref(), instant, chart, profile)?)
    }

    /// A request starting now with the configured step and worker count.
    pub fn search_request(&self, days_ahead: u32) -> SearchRequest {
        SearchRequest::from_now(days_ahead)
            .with_step(self.settings.search_step())
            .with_workers(self.settings.search_workers)
    }

    pub fn search_best_timing(
        &self,
        chart: &NatalChart,
        profile_name: &str,
        request: &SearchRequest,
    ) -> Result<SearchOutcome> {
        let profile = self.profiles.get(profile_name)?;
        request.validate(self.settings.max_days_ahead)?;
        Ok(BestTimingSearch::new(self.provider.as_ref(), &self.scorer, chart, profile).run(request))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("provider", &self.provider.name())
            .field("profiles", &self.profiles.len())
            .field("settings", &self.settings)
            .finish()
    }
}

use anyhow::Context;
use kairos::settings::{MAX_DAYS_AHEAD_LIMIT, MAX_SEARCH_STEP_MINUTES, MAX_VOID_CAP_HOURS, MAX_VOID_STEP_MINUTES};
use kairos::{AnalyticEphemeris, Engine, EngineSettings, EphemerisProvider, ProfileRegistry};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Root of `configs/kairos.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KairosConfig {
    pub engine: EngineSettings,
    pub provider: ProviderConfig,
    pub profiles: ProfilesConfig,
    /// Directory relative profile paths resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Ephemeris backend, chosen explicitly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    #[default]
    Analytic,
    Swiss {
        #[serde(default)]
        ephemeris_path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    pub include_builtin: bool,
    /// Extra `[[profile]]` tables; entries replace built-ins with the same id.
    pub path: Option<PathBuf>,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            path: None,
        }
    }
}

/// Try common relative paths for `configs/kairos.toml`.
pub fn read_config_text() -> anyhow::Result<String> {
    let paths = ["configs/kairos.toml", "../../configs/kairos.toml"];
    for p in &paths {
        if let Ok(c) = fs::read_to_string(p) {
            return Ok(c);
        }
    }
    anyhow::bail!("Could not load kairos.toml from {:?}", paths);
}

pub fn parse_config(text: &str) -> anyhow::Result<KairosConfig> {
    let config: KairosConfig =
        toml::from_str(text).map_err(|e| anyhow::anyhow!("Failed to parse kairos config: {e}"))?;
    validate_settings(&config.engine)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> anyhow::Result<KairosConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut config = parse_config(&text).with_context(|| format!("Invalid config {}", path.display()))?;
    config.base_dir = path.parent().map(Path::to_path_buf);
    Ok(config)
}

/// Load from the default relative locations.
pub fn load_default_config() -> anyhow::Result<KairosConfig> {
    parse_config(&read_config_text()?)
}

pub fn validate_settings(settings: &EngineSettings) -> anyhow::Result<()> {
    if !(settings.aspect_orb > 0.0 && settings.aspect_orb < 30.0) {
        anyhow::bail!("engine.aspect_orb must be in (0, 30), got {}", settings.aspect_orb);
    }
    if !(settings.void_orb > 0.0 && settings.void_orb < 30.0) {
        anyhow::bail!("engine.void_orb must be in (0, 30), got {}", settings.void_orb);
    }
    if !(1..=MAX_VOID_STEP_MINUTES).contains(&settings.void_step_minutes) {
        anyhow::bail!(
            "engine.void_step_minutes must be in 1..={MAX_VOID_STEP_MINUTES}, got {}",
            settings.void_step_minutes
        );
    }
    if !(1..=MAX_VOID_CAP_HOURS).contains(&settings.void_cap_hours) {
        anyhow::bail!(
            "engine.void_cap_hours must be in 1..={MAX_VOID_CAP_HOURS}, got {}",
            settings.void_cap_hours
        );
    }
    if !(1..=MAX_SEARCH_STEP_MINUTES).contains(&settings.search_step_minutes) {
        anyhow::bail!(
            "engine.search_step_minutes must be in 1..={MAX_SEARCH_STEP_MINUTES}, got {}",
            settings.search_step_minutes
        );
    }
    if !(1..=MAX_DAYS_AHEAD_LIMIT).contains(&settings.max_days_ahead) {
        anyhow::bail!(
            "engine.max_days_ahead must be in 1..={MAX_DAYS_AHEAD_LIMIT}, got {}",
            settings.max_days_ahead
        );
    }
    if settings.void_penalty < 0 || settings.tense_penalty < 0 {
        anyhow::bail!("engine penalties are deducted and must not be negative");
    }
    Ok(())
}

pub fn build_provider(config: &ProviderConfig) -> anyhow::Result<Arc<dyn EphemerisProvider>> {
    match config {
        ProviderConfig::Analytic => Ok(Arc::new(AnalyticEphemeris::default())),
        #[cfg(feature = "swisseph")]
        ProviderConfig::Swiss { ephemeris_path } => {
            let swiss = kairos::SwissEphemeris::new(ephemeris_path.clone())
                .context("Failed to initialize Swiss Ephemeris provider")?;
            Ok(Arc::new(swiss))
        }
        #[cfg(not(feature = "swisseph"))]
        ProviderConfig::Swiss { .. } => {
            anyhow::bail!("provider.kind = \"swiss\" requires building with the swisseph feature")
        }
    }
}

pub fn load_profiles(config: &ProfilesConfig, base_dir: Option<&Path>) -> anyhow::Result<ProfileRegistry> {
    let mut registry = if config.include_builtin {
        ProfileRegistry::builtin().context("Built-in profile table is invalid")?
    } else {
        ProfileRegistry::default()
    };

    if let Some(path) = &config.path {
        let path = match base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.clone(),
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read profiles from {}", path.display()))?;
        let extra = ProfileRegistry::from_toml_str(&text)
            .with_context(|| format!("Invalid profiles in {}", path.display()))?;
        registry = registry.merge(extra);
    }

    if registry.is_empty() {
        anyhow::bail!("No action profiles configured (include_builtin = false and no profiles.path)");
    }
    Ok(registry)
}

/// Compose an engine from configuration.
pub fn build_engine(config: &KairosConfig) -> anyhow::Result<Engine> {
    let provider = build_provider(&config.provider)?;
    let profiles = load_profiles(&config.profiles, config.base_dir.as_deref())?;
    log::info!(
        "Building kairos engine: provider {}, {} profiles",
        provider.name(),
        profiles.len()
    );
    Ok(Engine::new(provider, profiles, config.engine.clone()))
}

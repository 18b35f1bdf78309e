use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::aspects::AspectType;
use crate::chart::HOUSE_COUNT;
use crate::ephemeris::Body;
use crate::error::{KairosError, Result};

lazy_static::lazy_static! {
    static ref BUILTIN: Result<ProfileRegistry> =
        ProfileRegistry::from_toml_str(include_str!("../../data/action_profiles.toml"));
}

/// Which of a profile's house sets a house belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseTier {
    Primary,
    Secondary,
}

/// Houses, bodies and aspects that favour one life action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionProfile {
    /// Lookup key, e.g. `ask-for-raise`
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub primary_houses: BTreeSet<u8>,
    #[serde(default)]
    pub secondary_houses: BTreeSet<u8>,
    pub beneficial_bodies: Vec<Body>,
    pub preferred_aspects: Vec<AspectType>,
}

impl ActionProfile {
    pub fn tier_of(&self, house: u8) -> Option<HouseTier> {
        if self.primary_houses.contains(&house) {
            Some(HouseTier::Primary)
        } else if self.secondary_houses.contains(&house) {
            Some(HouseTier::Secondary)
        } else {
            None
        }
    }

    /// Primary houses first, then secondary, each ascending.
    pub fn houses(&self) -> impl Iterator<Item = (u8, HouseTier)> + '_ {
        self.primary_houses
            .iter()
            .map(|&h| (h, HouseTier::Primary))
            .chain(self.secondary_houses.iter().map(|&h| (h, HouseTier::Secondary)))
    }

    pub fn prefers(&self, aspect: AspectType) -> bool {
        self.preferred_aspects.contains(&aspect)
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| KairosError::InvalidProfile {
            name: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty".to_string()));
        }
        if self.primary_houses.is_empty() {
            return Err(invalid("at least one primary house is required".to_string()));
        }
        if let Some(h) = self
            .primary_houses
            .iter()
            .chain(&self.secondary_houses)
            .find(|h| !(1..=HOUSE_COUNT).contains(*h))
        {
            return Err(invalid(format!("house {h} is outside 1-{HOUSE_COUNT}")));
        }
        if let Some(h) = self.primary_houses.intersection(&self.secondary_houses).next() {
            return Err(invalid(format!("house {h} is both primary and secondary")));
        }
        if self.beneficial_bodies.is_empty() {
            return Err(invalid("beneficial_bodies must not be empty".to_string()));
        }
        if self.preferred_aspects.is_empty() {
            return Err(invalid("preferred_aspects must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profile: Vec<ActionProfile>,
}

/// Read-only table of action profiles, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, ActionProfile>,
}

impl ProfileRegistry {
    /// The profile table shipped with the crate, parsed once.
    pub fn builtin() -> Result<Self> {
        BUILTIN.clone()
    }

    /// Parse `[[profile]]` tables and validate every entry.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ProfileFile = toml::from_str(text).map_err(|e| KairosError::InvalidProfile {
            name: "<table>".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_profiles(file.profile)
    }

    pub fn from_profiles(profiles: Vec<ActionProfile>) -> Result<Self> {
        let mut registry = Self::default();
        for profile in profiles {
            profile.validate()?;
            let key = normalize_id(&profile.id);
            if registry.profiles.contains_key(&key) {
                return Err(KairosError::InvalidProfile {
                    name: profile.id,
                    reason: "duplicate id".to_string(),
                });
            }
            registry.profiles.insert(key, profile);
        }
        log::debug!("Loaded {} action profiles", registry.profiles.len());
        Ok(registry)
    }

    /// Overlay `other` on this table; profiles with the same id are replaced.
    pub fn merge(mut self, other: ProfileRegistry) -> Self {
        self.profiles.extend(other.profiles);
        self
    }

    pub fn get(&self, id: &str) -> Result<&ActionProfile> {
        self.profiles
            .get(&normalize_id(id))
            .ok_or_else(|| KairosError::ProfileNotFound { name: id.to_string() })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.values().map(|p| p.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase().replace('_', "-")
}

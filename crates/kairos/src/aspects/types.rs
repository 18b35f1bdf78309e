use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ephemeris::Body;

/// Major aspects, ordered by target angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectType {
    Conjunction,
    #[serde(alias = "sextil")]
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl AspectType {
    pub const ALL: [AspectType; 5] = [
        AspectType::Conjunction,
        AspectType::Sextile,
        AspectType::Square,
        AspectType::Trine,
        AspectType::Opposition,
    ];

    /// Exact angle for this aspect (0, 60, 90, 120, 180)
    pub fn angle(&self) -> f64 {
        match self {
            AspectType::Conjunction => 0.0,
            AspectType::Sextile => 60.0,
            AspectType::Square => 90.0,
            AspectType::Trine => 120.0,
            AspectType::Opposition => 180.0,
        }
    }

    /// Square and opposition.
    pub fn is_tense(&self) -> bool {
        matches!(self, AspectType::Square | AspectType::Opposition)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectType::Conjunction => "conjunction",
            AspectType::Sextile => "sextile",
            AspectType::Square => "square",
            AspectType::Trine => "trine",
            AspectType::Opposition => "opposition",
        }
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conjunction" => Ok(AspectType::Conjunction),
            // older profile tables spell it the Spanish way
            "sextile" | "sextil" => Ok(AspectType::Sextile),
            "square" => Ok(AspectType::Square),
            "trine" => Ok(AspectType::Trine),
            "opposition" => Ok(AspectType::Opposition),
            other => Err(format!("Unknown aspect type: {other}")),
        }
    }
}

/// The second party of an aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum AspectTarget {
    Body(Body),
    /// House cusp, 1-12
    House(u8),
}

impl fmt::Display for AspectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectTarget::Body(body) => f.write_str(body.label()),
            AspectTarget::House(n) => write!(f, "house {n}"),
        }
    }
}

/// One matched aspect. Computed on demand, never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub body: Body,
    pub target: AspectTarget,
    pub aspect_type: AspectType,
    /// Shortest angular distance between the two longitudes, [0, 180]
    pub separation: f64,
    /// Deviation from the exact aspect angle
    pub orb: f64,
}

impl Aspect {
    pub fn label(&self) -> String {
        format!("{} {} {}", self.body.label(), self.aspect_type, self.target)
    }

    pub fn house(&self) -> Option<u8> {
        match self.target {
            AspectTarget::House(n) => Some(n),
            AspectTarget::Body(_) => None,
        }
    }
}

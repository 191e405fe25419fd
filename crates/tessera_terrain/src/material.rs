//! # Materials
//!
//! Material identifiers and the rule tables that map noise to them.
//!
//! The engine only *classifies*: a tile carries a [`MaterialId`] and the
//! renderer decides what that looks like.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};

/// Terrain material of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MaterialId {
    /// Open grassland.
    #[default]
    Grass = 0,
    /// Bare soil, diggable.
    Dirt = 1,
    /// Rock outcrop, impassable.
    Stone = 2,
    /// Sand near water.
    Sand = 3,
    /// Standing water.
    Water = 4,
    /// Moss-covered ground.
    Moss = 5,
    /// Cave floor.
    Cave = 6,
}

impl MaterialId {
    /// Every material, in id order.
    pub const ALL: [Self; 7] = [
        Self::Grass,
        Self::Dirt,
        Self::Stone,
        Self::Sand,
        Self::Water,
        Self::Moss,
        Self::Cave,
    ];

    /// Lowercase name used in snapshots and configs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Dirt => "dirt",
            Self::Stone => "stone",
            Self::Sand => "sand",
            Self::Water => "water",
            Self::Moss => "moss",
            Self::Cave => "cave",
        }
    }

    /// Looks a material up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaterialId {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| TerrainError::InvalidConfig(format!("unknown material {s:?}")))
    }
}

/// How a material claims a tile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialRule {
    /// Claims the tile when the next per-tile random draw is below `p`.
    Threshold(f64),
    /// Claims the tile when the noise sample lies in `[lo, hi)`.
    Range(f64, f64),
}

impl MaterialRule {
    /// Checks the rule against a noise sample and a random draw.
    ///
    /// Lower bound inclusive, upper bound exclusive.
    #[inline]
    #[must_use]
    pub fn matches(self, noise: f64, roll: f64) -> bool {
        match self {
            Self::Threshold(p) => roll < p,
            Self::Range(lo, hi) => noise >= lo && noise < hi,
        }
    }

    fn validate(self) -> TerrainResult<()> {
        match self {
            Self::Threshold(p) if !(0.0..=1.0).contains(&p) => Err(TerrainError::InvalidConfig(
                format!("threshold {p} outside [0, 1]"),
            )),
            Self::Range(lo, hi) if !(0.0 <= lo && lo < hi && hi <= 1.0) => Err(
                TerrainError::InvalidConfig(format!("range [{lo}, {hi}) must satisfy 0 <= lo < hi <= 1")),
            ),
            _ => Ok(()),
        }
    }
}

/// One row of a [`MaterialTable`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    /// Material assigned when the rule matches.
    pub material: MaterialId,
    /// The rule.
    pub rule: MaterialRule,
}

/// Ordered material rules plus a fallback.
///
/// Rules are checked in declaration order; the first match wins, so
/// overlapping ranges resolve to whichever was declared first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialTable {
    /// Rules in priority order.
    pub entries: Vec<MaterialEntry>,
    /// Material used when no rule matches.
    #[serde(default)]
    pub fallback: MaterialId,
}

impl MaterialTable {
    /// Creates a table.
    #[must_use]
    pub fn new(entries: Vec<MaterialEntry>, fallback: MaterialId) -> Self {
        Self { entries, fallback }
    }

    /// Number of threshold rules, i.e. random draws per classification.
    #[must_use]
    pub fn threshold_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.rule, MaterialRule::Threshold(_)))
            .count()
    }

    /// Validates every rule.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] for thresholds outside `[0, 1]`
    /// or empty/out-of-range bands.
    pub fn validate(&self) -> TerrainResult<()> {
        self.entries.iter().try_for_each(|e| e.rule.validate())
    }

    /// Resolves a material.
    ///
    /// `rolls` yields one uniform `[0, 1)` draw per threshold rule.
    pub fn resolve(&self, noise: f64, mut rolls: impl FnMut() -> f64) -> MaterialId {
        for entry in &self.entries {
            let roll = match entry.rule {
                MaterialRule::Threshold(_) => rolls(),
                MaterialRule::Range(..) => 0.0,
            };
            if entry.rule.matches(noise, roll) {
                return entry.material;
            }
        }
        self.fallback
    }
}

impl Default for MaterialTable {
    /// Scattered rocks, then water -> sand -> grass -> moss -> dirt bands.
    fn default() -> Self {
        let entry = |material, rule| MaterialEntry { material, rule };
        Self {
            entries: vec![
                entry(MaterialId::Stone, MaterialRule::Threshold(0.015)),
                entry(MaterialId::Water, MaterialRule::Range(0.0, 0.22)),
                entry(MaterialId::Sand, MaterialRule::Range(0.22, 0.28)),
                entry(MaterialId::Grass, MaterialRule::Range(0.28, 0.62)),
                entry(MaterialId::Moss, MaterialRule::Range(0.62, 0.78)),
                entry(MaterialId::Dirt, MaterialRule::Range(0.78, 1.0)),
            ],
            fallback: MaterialId::Grass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for material in MaterialId::ALL {
            assert_eq!(MaterialId::from_name(material.name()), Some(material));
            assert_eq!(material.name().parse::<MaterialId>().unwrap(), material);
        }
        assert!(MaterialId::from_name("lava").is_none());
        assert!("lava".parse::<MaterialId>().is_err());
    }

    #[test]
    fn test_range_bounds_are_half_open() {
        let rule = MaterialRule::Range(0.2, 0.5);
        assert!(rule.matches(0.2, 0.0));
        assert!(rule.matches(0.4999, 0.0));
        assert!(!rule.matches(0.5, 0.0));
        assert!(!rule.matches(0.1999, 0.0));
    }

    #[test]
    fn test_adjacent_ranges_cover_boundary_exactly_once() {
        let table = MaterialTable::default();
        let bands: Vec<_> = table
            .entries
            .iter()
            .filter(|e| matches!(e.rule, MaterialRule::Range(..)))
            .collect();
        for boundary in [0.0, 0.22, 0.28, 0.62, 0.78] {
            let hits = bands.iter().filter(|e| e.rule.matches(boundary, 1.0)).count();
            assert_eq!(hits, 1, "boundary {boundary} should belong to exactly one band");
        }
    }

    #[test]
    fn test_declaration_order_resolves_overlap() {
        let table = MaterialTable::new(
            vec![
                MaterialEntry { material: MaterialId::Sand, rule: MaterialRule::Range(0.0, 0.6) },
                MaterialEntry { material: MaterialId::Dirt, rule: MaterialRule::Range(0.4, 1.0) },
            ],
            MaterialId::Grass,
        );
        assert_eq!(table.resolve(0.5, || 1.0), MaterialId::Sand);
        assert_eq!(table.resolve(0.7, || 1.0), MaterialId::Dirt);
    }

    #[test]
    fn test_threshold_uses_roll_and_fallback() {
        let table = MaterialTable::new(
            vec![MaterialEntry { material: MaterialId::Stone, rule: MaterialRule::Threshold(0.1) }],
            MaterialId::Moss,
        );
        assert_eq!(table.resolve(0.5, || 0.05), MaterialId::Stone);
        assert_eq!(table.resolve(0.5, || 0.5), MaterialId::Moss);
    }

    #[test]
    fn test_validate_rejects_bad_rules() {
        let mut table = MaterialTable::default();
        assert!(table.validate().is_ok());

        table.entries.push(MaterialEntry { material: MaterialId::Cave, rule: MaterialRule::Range(0.6, 0.3) });
        assert!(table.validate().is_err());

        table.entries.pop();
        table.entries.push(MaterialEntry { material: MaterialId::Cave, rule: MaterialRule::Threshold(1.5) });
        assert!(table.validate().is_err());
    }
}

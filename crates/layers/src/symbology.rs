use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Place rarity, ordered from most common to rarest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// Marker pulse: scale up to `peak_scale` and back over `duration_ms`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerAnimation {
    pub peak_scale: f32,
    pub duration_ms: u32,
    pub glow: bool,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Common,
        Tier::Uncommon,
        Tier::Rare,
        Tier::Epic,
        Tier::Legendary,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Tier::Legendary => "🌟 Legendary",
            Tier::Epic => "✨ Epic",
            Tier::Rare => "💫 Rare",
            Tier::Uncommon => "⭐ Uncommon",
            Tier::Common => "🔮 Common",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Tier::Legendary => "#FFD700",
            Tier::Epic => "#9B30FF",
            Tier::Rare => "#4169E1",
            Tier::Uncommon => "#32CD32",
            Tier::Common => "#808080",
        }
    }

    pub fn animation(self) -> Option<MarkerAnimation> {
        let (peak_scale, duration_ms, glow) = match self {
            Tier::Legendary => (1.2, 2000, true),
            Tier::Epic => (1.15, 1800, false),
            Tier::Rare => (1.1, 1600, false),
            Tier::Uncommon | Tier::Common => return None,
        };
        Some(MarkerAnimation {
            peak_scale,
            duration_ms,
            glow,
        })
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Common => "COMMON",
            Tier::Uncommon => "UNCOMMON",
            Tier::Rare => "RARE",
            Tier::Epic => "EPIC",
            Tier::Legendary => "LEGENDARY",
        };
        f.write_str(name)
    }
}

/// One row of the tier table.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRule {
    pub tier: Tier,
    pub min_popularity: f64,
    /// Zoom the map must reach before places of this tier are revealed.
    pub min_zoom: f64,
}

impl TierRule {
    pub const fn new(tier: Tier, min_popularity: f64, min_zoom: f64) -> Self {
        Self {
            tier,
            min_popularity,
            min_zoom,
        }
    }
}

pub const DEFAULT_TIER_RULES: [TierRule; 5] = [
    TierRule::new(Tier::Legendary, 100_000.0, 3.0),
    TierRule::new(Tier::Epic, 50_000.0, 5.0),
    TierRule::new(Tier::Rare, 10_000.0, 8.0),
    TierRule::new(Tier::Uncommon, 1_000.0, 10.0),
    TierRule::new(Tier::Common, 0.0, 12.0),
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TierTableError {
    #[error("tier table is empty")]
    Empty,
    #[error("tier {0} appears more than once")]
    DuplicateTier(Tier),
    #[error("tier {tier} has invalid {field}: {value}")]
    InvalidValue {
        tier: Tier,
        field: &'static str,
        value: f64,
    },
}

/// Tier rules sorted by descending `min_popularity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TierRule>", into = "Vec<TierRule>")]
pub struct TierTable {
    rules: Vec<TierRule>,
}

impl TierTable {
    pub fn new(mut rules: Vec<TierRule>) -> Result<Self, TierTableError> {
        if rules.is_empty() {
            return Err(TierTableError::Empty);
        }
        for rule in &rules {
            for (field, value) in [
                ("min popularity", rule.min_popularity),
                ("min zoom", rule.min_zoom),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(TierTableError::InvalidValue {
                        tier: rule.tier,
                        field,
                        value,
                    });
                }
            }
        }
        rules.sort_by(|a, b| b.min_popularity.total_cmp(&a.min_popularity));
        let mut seen = Vec::with_capacity(rules.len());
        for rule in &rules {
            if seen.contains(&rule.tier) {
                return Err(TierTableError::DuplicateTier(rule.tier));
            }
            seen.push(rule.tier);
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[TierRule] {
        &self.rules
    }

    /// Highest tier whose popularity threshold the score reaches, regardless
    /// of zoom.
    pub fn tier_for(&self, popularity: f64) -> Option<&TierRule> {
        self.rules.iter().find(|r| r.min_popularity <= popularity)
    }

    /// Tier to display for `popularity` at `zoom`, or `None` while the map is
    /// zoomed out past the tier's gate (or no threshold is met).
    ///
    /// Both inputs must be finite and non-negative.
    pub fn classify(&self, popularity: f64, zoom: f64) -> Option<Tier> {
        debug_assert!(
            popularity.is_finite() && popularity >= 0.0,
            "popularity must be finite and non-negative, got {popularity}"
        );
        debug_assert!(
            zoom.is_finite() && zoom >= 0.0,
            "zoom must be finite and non-negative, got {zoom}"
        );
        let rule = self.tier_for(popularity)?;
        (zoom >= rule.min_zoom).then_some(rule.tier)
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            rules: DEFAULT_TIER_RULES.to_vec(),
        }
    }
}

impl TryFrom<Vec<TierRule>> for TierTable {
    type Error = TierTableError;

    fn try_from(rules: Vec<TierRule>) -> Result<Self, Self::Error> {
        TierTable::new(rules)
    }
}

impl From<TierTable> for Vec<TierRule> {
    fn from(table: TierTable) -> Self {
        table.rules
    }
}

/// Classify with the default tier table.
pub fn classify(popularity: f64, zoom: f64) -> Option<Tier> {
    TierTable::default().classify(popularity, zoom)
}

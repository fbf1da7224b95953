use std::collections::BTreeSet;

use serde::Serialize;

/// Thematic zone of a place, derived from its category tags.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    Nature,
    Cultural,
    Social,
    Discovery,
}

/// First matching row wins; `Discovery` is the fallback.
const ZONE_RULES: &[(Zone, &[&str])] = &[
    (Zone::Nature, &["park"]),
    (Zone::Cultural, &["museum", "art_gallery"]),
    (Zone::Social, &["restaurant", "cafe"]),
];

impl Zone {
    pub fn label(self) -> &'static str {
        match self {
            Zone::Nature => "Nature Zone",
            Zone::Cultural => "Cultural Zone",
            Zone::Social => "Social Zone",
            Zone::Discovery => "Discovery Zone",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Zone::Nature => "🌳",
            Zone::Cultural => "🏛️",
            Zone::Social => "🍽️",
            Zone::Discovery => "🌟",
        }
    }

    pub fn bonus(self) -> &'static str {
        match self {
            Zone::Nature => "Environmental Harmony",
            Zone::Cultural => "Cultural Heritage",
            Zone::Social => "Social Harmony",
            Zone::Discovery => "Explorer's Luck",
        }
    }

    pub fn quests(self) -> &'static [&'static str] {
        match self {
            Zone::Nature => &["Trail Blazer", "Wildlife Observer"],
            Zone::Cultural => &["Art Explorer", "Culture Seeker"],
            Zone::Social => &["Food Critic", "Social Butterfly"],
            Zone::Discovery => &["Pioneer", "Trailblazer"],
        }
    }
}

/// Case-sensitive, exact tag membership.
pub fn determine_zone(tags: &BTreeSet<String>) -> Zone {
    ZONE_RULES
        .iter()
        .find(|(_, wanted)| wanted.iter().any(|t| tags.contains(*t)))
        .map(|(zone, _)| *zone)
        .unwrap_or(Zone::Discovery)
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::item::Item;

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionEntry {
    pub item: Item,
    pub quantity: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    Beginner,
    #[default]
    Advanced,
    Expert,
}

impl InteractionMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "advanced" => Some(Self::Advanced),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "spring" => Some(Self::Spring),
            "summer" => Some(Self::Summer),
            "autumn" | "fall" => Some(Self::Autumn),
            "winter" => Some(Self::Winter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
            Self::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Player-facing date such as "Spring, Day 10". Free-form text is kept even when
/// the season cannot be recognized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InGameDate {
    pub raw: String,
    pub season: Option<Season>,
    pub day: Option<u32>,
}

impl InGameDate {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let mut parts = raw.splitn(2, ',');
        let season = parts.next().and_then(Season::parse);
        let day = parts.next().and_then(|rest| {
            let rest = rest.trim();
            let digits = match rest.get(..3) {
                Some(prefix) if prefix.eq_ignore_ascii_case("day") => rest[3..].trim(),
                _ => rest,
            };
            digits.parse::<u32>().ok()
        });

        Self { raw, season, day }
    }

    pub fn is_recognized(&self) -> bool {
        self.season.is_some() && self.day.is_some()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    Profit,
    #[default]
    Balanced,
    Safety,
    Speed,
    Xp,
}

impl OptimizationGoal {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "profit" => Some(Self::Profit),
            "balanced" => Some(Self::Balanced),
            "safety" => Some(Self::Safety),
            "speed" => Some(Self::Speed),
            "xp" => Some(Self::Xp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profit => "profit",
            Self::Balanced => "balanced",
            Self::Safety => "safety",
            Self::Speed => "speed",
            Self::Xp => "xp",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "conservative" => Some(Self::Conservative),
            "moderate" => Some(Self::Moderate),
            "aggressive" => Some(Self::Aggressive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeHorizon {
    Short,
    #[default]
    Medium,
    Long,
}

impl TimeHorizon {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "short" => Some(Self::Short),
            "medium" => Some(Self::Medium),
            "long" => Some(Self::Long),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertOptions {
    pub optimization_goal: OptimizationGoal,
    pub risk_tolerance: RiskTolerance,
    pub time_horizon: TimeHorizon,
}

/// Canonical request produced by the normalizer; never built from unchecked input.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisRequest {
    pub selections: Vec<SelectionEntry>,
    pub gold: u64,
    pub in_game_date: InGameDate,
    pub current_date: DateTime<Utc>,
    pub interaction_mode: InteractionMode,
    pub expert_options: Option<ExpertOptions>,
}

impl AnalysisRequest {
    pub fn selected_names(&self) -> Vec<&str> {
        self.selections.iter().map(|entry| entry.item.name.as_str()).collect()
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selections.iter().any(|entry| entry.item.name == name)
    }

    pub fn total_quantity(&self) -> u64 {
        self.selections.iter().map(|entry| u64::from(entry.quantity)).sum()
    }

    /// Expert options only shape expert reports.
    pub fn effective_expert_options(&self) -> Option<ExpertOptions> {
        match self.interaction_mode {
            InteractionMode::Expert => Some(self.expert_options.unwrap_or_default()),
            InteractionMode::Beginner | InteractionMode::Advanced => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InGameDate, InteractionMode, Season};

    #[test]
    fn in_game_date_parses_season_and_day() {
        let date = InGameDate::parse("Spring, Day 10");
        assert_eq!(date.season, Some(Season::Spring));
        assert_eq!(date.day, Some(10));
        assert!(date.is_recognized());
    }

    #[test]
    fn day_prefix_is_case_insensitive() {
        let date = InGameDate::parse("SPRING, DAY 10");
        assert_eq!(date.season, Some(Season::Spring));
        assert_eq!(date.day, Some(10));
        assert_eq!(InGameDate::parse("Winter, dAy 4").day, Some(4));
        assert_eq!(InGameDate::parse("Summer, 7").day, Some(7));
    }

    #[test]
    fn in_game_date_keeps_unrecognized_text() {
        let date = InGameDate::parse("Harvest Moon festival");
        assert_eq!(date.raw, "Harvest Moon festival");
        assert_eq!(date.season, None);
        assert!(!date.is_recognized());
    }

    #[test]
    fn fall_is_an_alias_for_autumn() {
        assert_eq!(InGameDate::parse("Fall, Day 3").season, Some(Season::Autumn));
    }

    #[test]
    fn interaction_modes_parse_case_insensitively() {
        assert_eq!(InteractionMode::parse("Expert"), Some(InteractionMode::Expert));
        assert_eq!(InteractionMode::parse("balanced"), None);
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPoint {
    pub action: String,
    pub reasoning: String,
    pub tags: Vec<String>,
}

impl ActionPoint {
    pub fn new(action: impl Into<String>, reasoning: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            action: action.into(),
            reasoning: reasoning.into(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub id: String,
    pub title: String,
    pub points: Vec<ActionPoint>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub title: String,
    pub archetype: String,
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterAnalysis {
    pub title: String,
    pub conclusion: String,
    pub call_to_action: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: String,
    pub publication_date: String,
    pub main_title: String,
    pub sub_title: String,
    pub visual_anchor: String,
    pub player_profile: PlayerProfile,
    pub mid_breaker_quote: String,
    pub sections: Vec<ReportSection>,
    pub footer_analysis: FooterAnalysis,
}

impl Report {
    pub fn points(&self) -> impl Iterator<Item = &ActionPoint> {
        self.sections.iter().flat_map(|section| section.points.iter())
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.points().map(|point| point.action.as_str())
    }

    /// Every prose field a reader sees, in render order.
    pub fn texts(&self) -> Vec<&str> {
        let mut texts = vec![
            self.main_title.as_str(),
            self.sub_title.as_str(),
            self.player_profile.archetype.as_str(),
            self.player_profile.summary.as_str(),
            self.mid_breaker_quote.as_str(),
            self.footer_analysis.conclusion.as_str(),
            self.footer_analysis.call_to_action.as_str(),
        ];
        for section in &self.sections {
            texts.push(section.title.as_str());
            for point in &section.points {
                texts.push(point.action.as_str());
                texts.push(point.reasoning.as_str());
            }
        }
        texts
    }

    /// Same content ignoring the identity stamps applied at assembly.
    pub fn same_content_as(&self, other: &Report) -> bool {
        self.main_title == other.main_title
            && self.sub_title == other.sub_title
            && self.visual_anchor == other.visual_anchor
            && self.player_profile == other.player_profile
            && self.mid_breaker_quote == other.mid_breaker_quote
            && self.sections == other.sections
            && self.footer_analysis == other.footer_analysis
    }
}

use garden_core::domain::report::Report;
use garden_core::domain::request::{AnalysisRequest, ExpertOptions};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

const PROMPT_TEMPLATE: &str = "personalize_prompt.txt";

#[derive(Debug, thiserror::Error)]
#[error("prompt template error: {0}")]
pub struct PromptError(String);

#[derive(Serialize)]
struct PromptItem<'a> {
    display_name: &'a str,
    quantity: u32,
    tier: &'a str,
    source: &'a str,
    multi_harvest: bool,
}

/// Renders the personalization prompt from a request and its rule report.
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    tera: Tera,
}

impl PromptBuilder {
    pub fn new() -> Result<Self, PromptError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            PROMPT_TEMPLATE,
            include_str!("../templates/personalize_prompt.txt.tera"),
        )
        .map_err(|error| PromptError(error.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render(&self, request: &AnalysisRequest, report: &Report) -> Result<String, PromptError> {
        let items = request
            .selections
            .iter()
            .map(|entry| PromptItem {
                display_name: &entry.item.display_name,
                quantity: entry.quantity,
                tier: entry.item.tier.as_str(),
                source: entry.item.source.as_str(),
                multi_harvest: entry.item.multi_harvest,
            })
            .collect::<Vec<_>>();

        let mut context = Context::new();
        context.insert("mode", request.interaction_mode.as_str());
        context.insert("gold", &request.gold);
        context.insert("in_game_date", &request.in_game_date.raw);
        context.insert("archetype", &report.player_profile.archetype);
        context.insert("expert", &request.effective_expert_options().map(ExpertView::from));
        context.insert("items", &items);
        context.insert("summary", &report.player_profile.summary);
        context.insert("quote", &report.mid_breaker_quote);
        context.insert("sections", &report.sections);

        self.tera.render(PROMPT_TEMPLATE, &context).map_err(|error| PromptError(error.to_string()))
    }
}

#[derive(Serialize)]
struct ExpertView {
    optimization_goal: &'static str,
    risk_tolerance: &'static str,
    time_horizon: &'static str,
}

impl From<ExpertOptions> for ExpertView {
    fn from(options: ExpertOptions) -> Self {
        Self {
            optimization_goal: options.optimization_goal.as_str(),
            risk_tolerance: options.risk_tolerance.as_str(),
            time_horizon: options.time_horizon.as_str(),
        }
    }
}

/// Prose returned by the provider. Only these fields can change a report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProsePatch {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub mid_breaker_quote: Option<String>,
    #[serde(default)]
    pub points: Vec<PointProse>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointProse {
    pub section_id: String,
    pub action: String,
    pub reasoning: String,
}

impl ProsePatch {
    /// Parses provider text, tolerating a surrounding markdown code fence.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(strip_code_fence(raw))
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

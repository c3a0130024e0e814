use std::sync::Arc;
use std::time::Duration;

use garden_core::advisor::catalog::Catalog;
use garden_core::domain::report::Report;
use garden_core::domain::request::AnalysisRequest;
use serde::Serialize;
use tracing::{info, warn};

use crate::guardrails::{GuardrailDecision, ProseField, ProseGuard};
use crate::llm::{PersonalizationProvider, ProviderStatus};
use crate::prompt::{PromptBuilder, ProsePatch};

/// Lifecycle of one enhancement call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalizationState {
    Idle,
    Calling,
    Merged,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersonalizationOutcome {
    pub state: PersonalizationState,
    pub provider: &'static str,
    /// Prose fields taken from the provider.
    pub merged_fields: usize,
    /// Prose fields the guard threw away.
    pub rejected_fields: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl PersonalizationOutcome {
    fn fallback(provider: &'static str, reason: impl Into<String>) -> Self {
        Self {
            state: PersonalizationState::Fallback,
            provider,
            merged_fields: 0,
            rejected_fields: 0,
            fallback_reason: Some(reason.into()),
        }
    }
}

/// Best-effort prose enrichment. A single provider call bounded by `timeout`; any
/// failure hands back the rule report untouched.
pub struct PersonalizationAdapter {
    provider: Arc<dyn PersonalizationProvider>,
    catalog: Arc<Catalog>,
    prompts: Option<PromptBuilder>,
    timeout: Duration,
}

impl PersonalizationAdapter {
    pub fn new(
        provider: Arc<dyn PersonalizationProvider>,
        catalog: Arc<Catalog>,
        timeout: Duration,
    ) -> Self {
        let prompts = match PromptBuilder::new() {
            Ok(prompts) => Some(prompts),
            Err(error) => {
                warn!(
                    event_name = "personalization.prompt.unavailable",
                    error = %error,
                    "prompt template failed to load; personalization will fall back"
                );
                None
            }
        };
        Self { provider, catalog, prompts, timeout }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn provider_status(&self) -> ProviderStatus {
        self.provider.status()
    }

    pub async fn enhance(&self, request: &AnalysisRequest, rule_report: Report) -> Report {
        self.enhance_with_outcome(request, rule_report).await.0
    }

    pub async fn enhance_with_outcome(
        &self,
        request: &AnalysisRequest,
        rule_report: Report,
    ) -> (Report, PersonalizationOutcome) {
        let provider = self.provider.name();
        let mut state = PersonalizationState::Idle;

        if self.provider.status() == ProviderStatus::Disabled {
            return (rule_report, PersonalizationOutcome::fallback(provider, "disabled"));
        }
        let Some(prompts) = &self.prompts else {
            return (rule_report, PersonalizationOutcome::fallback(provider, "prompt_unavailable"));
        };
        let prompt = match prompts.render(request, &rule_report) {
            Ok(prompt) => prompt,
            Err(error) => {
                warn!(event_name = "personalization.prompt.failed", error = %error, "prompt rendering failed");
                return (rule_report, PersonalizationOutcome::fallback(provider, "prompt_render"));
            }
        };

        transition(&mut state, PersonalizationState::Calling);
        let raw = match tokio::time::timeout(self.timeout, self.provider.complete(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(error)) => {
                transition(&mut state, PersonalizationState::Fallback);
                warn!(
                    event_name = "personalization.call.failed",
                    provider,
                    reason = error.reason_code(),
                    error = %error,
                    "personalization failed; using rule report"
                );
                return (rule_report, PersonalizationOutcome::fallback(provider, error.reason_code()));
            }
            Err(_) => {
                transition(&mut state, PersonalizationState::Fallback);
                warn!(
                    event_name = "personalization.call.timeout",
                    provider,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "personalization timed out; using rule report"
                );
                return (rule_report, PersonalizationOutcome::fallback(provider, "timeout"));
            }
        };

        let patch = match ProsePatch::parse(&raw) {
            Ok(patch) => patch,
            Err(error) => {
                transition(&mut state, PersonalizationState::Fallback);
                warn!(
                    event_name = "personalization.response.malformed",
                    provider,
                    error = %error,
                    "provider response did not match the prose schema"
                );
                return (rule_report, PersonalizationOutcome::fallback(provider, "malformed_response"));
            }
        };

        let guard = ProseGuard::new(&self.catalog, request);
        let (report, merged_fields, rejected_fields) = merge(rule_report, patch, &guard);
        transition(&mut state, PersonalizationState::Merged);
        info!(
            event_name = "personalization.merged",
            provider,
            merged_fields,
            rejected_fields,
            "personalized prose merged into report"
        );

        (
            report,
            PersonalizationOutcome { state, provider, merged_fields, rejected_fields, fallback_reason: None },
        )
    }
}

fn transition(state: &mut PersonalizationState, next: PersonalizationState) {
    tracing::debug!(event_name = "personalization.state", from = ?*state, to = ?next);
    *state = next;
}

#[derive(Default)]
struct MergeTally {
    merged: usize,
    rejected: usize,
}

impl MergeTally {
    fn accept(&mut self, guard: &ProseGuard, field: &ProseField, text: &str) -> bool {
        match guard.evaluate(field, text) {
            GuardrailDecision::Allow => {
                self.merged += 1;
                true
            }
            GuardrailDecision::Deny { reason_code, detail } => {
                self.rejected += 1;
                warn!(event_name = "personalization.prose.rejected", reason_code, detail = %detail);
                false
            }
        }
    }
}

/// Copies accepted prose into the report. Actions, sections, and tags are never touched.
fn merge(mut report: Report, patch: ProsePatch, guard: &ProseGuard) -> (Report, usize, usize) {
    let mut tally = MergeTally::default();

    if let Some(summary) = patch.summary {
        if tally.accept(guard, &ProseField::Summary, &summary) {
            report.player_profile.summary = summary.trim().to_string();
        }
    }
    if let Some(quote) = patch.mid_breaker_quote {
        if tally.accept(guard, &ProseField::MidBreakerQuote, &quote) {
            report.mid_breaker_quote = quote.trim().to_string();
        }
    }

    for prose in patch.points {
        let action = prose.action.trim();
        let target = report
            .sections
            .iter_mut()
            .filter(|section| section.id == prose.section_id)
            .flat_map(|section| section.points.iter_mut())
            .find(|point| point.action == action);
        let Some(point) = target else {
            tally.rejected += 1;
            continue;
        };
        let field =
            ProseField::Reasoning { section_id: prose.section_id.clone(), action: action.to_string() };
        if tally.accept(guard, &field, &prose.reasoning) {
            point.reasoning = prose.reasoning.trim().to_string();
        }
    }

    (report, tally.merged, tally.rejected)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use garden_core::advisor::catalog::Catalog;
    use garden_core::advisor::{RuleAdvisor, RuleAnalysis};
    use serde_json::json;

    use super::{PersonalizationAdapter, PersonalizationState};
    use crate::llm::{DisabledProvider, ExternalServiceError, PersonalizationProvider};

    struct ScriptedProvider {
        reply: Result<String, ExternalServiceError>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn replying(reply: Result<String, ExternalServiceError>) -> Self {
            Self { reply, delay: Duration::ZERO, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl PersonalizationProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ExternalServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.reply.clone()
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::builtin().expect("catalog"))
    }

    fn analysis(catalog: &Arc<Catalog>) -> RuleAnalysis {
        RuleAdvisor::new(Arc::clone(catalog))
            .analyze(&json!({
                "selectedItems": {"carrot": 5},
                "gold": 100,
                "inGameDate": "Spring, Day 1",
                "currentDate": "2024-01-01T00:00:00Z",
                "interactionMode": "beginner"
            }))
            .expect("analysis")
    }

    fn adapter(provider: Arc<dyn PersonalizationProvider>, catalog: &Arc<Catalog>) -> PersonalizationAdapter {
        PersonalizationAdapter::new(provider, Arc::clone(catalog), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn provider_failures_return_the_rule_report_unchanged() {
        let catalog = catalog();
        let analysis = analysis(&catalog);

        for error in [
            ExternalServiceError::Transport("connection reset".to_string()),
            ExternalServiceError::Http { status: 500, body: "boom".to_string() },
            ExternalServiceError::MissingApiKey,
        ] {
            let adapter = adapter(Arc::new(ScriptedProvider::replying(Err(error))), &catalog);
            let (report, outcome) =
                adapter.enhance_with_outcome(&analysis.request, analysis.report.clone()).await;

            assert_eq!(report, analysis.report);
            assert_eq!(outcome.state, PersonalizationState::Fallback);
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out_into_fallback() {
        let catalog = catalog();
        let analysis = analysis(&catalog);
        let provider = ScriptedProvider {
            reply: Ok("{}".to_string()),
            delay: Duration::from_secs(5),
            calls: AtomicUsize::new(0),
        };

        let (report, outcome) = adapter(Arc::new(provider), &catalog)
            .enhance_with_outcome(&analysis.request, analysis.report.clone())
            .await;

        assert_eq!(report, analysis.report);
        assert_eq!(outcome.fallback_reason.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn malformed_json_falls_back() {
        let catalog = catalog();
        let analysis = analysis(&catalog);
        let provider = ScriptedProvider::replying(Ok("Here is a great plan!".to_string()));

        let report = adapter(Arc::new(provider), &catalog).enhance(&analysis.request, analysis.report.clone()).await;
        assert_eq!(report, analysis.report);
    }

    #[tokio::test]
    async fn disabled_provider_is_never_called() {
        let catalog = catalog();
        let analysis = analysis(&catalog);

        let (report, outcome) = adapter(Arc::new(DisabledProvider), &catalog)
            .enhance_with_outcome(&analysis.request, analysis.report.clone())
            .await;

        assert_eq!(report, analysis.report);
        assert_eq!(outcome.fallback_reason.as_deref(), Some("disabled"));
    }

    #[tokio::test]
    async fn accepted_prose_is_merged_and_actions_stay_fixed() {
        let catalog = catalog();
        let analysis = analysis(&catalog);
        let section = &analysis.report.sections[0];
        let action = section.points[0].action.clone();
        let reply = json!({
            "summary": "A tidy Carrot patch is the perfect start.",
            "midBreakerQuote": "Small seeds, big dreams.",
            "points": [
                {"sectionId": section.id, "action": action, "reasoning": "Carrot grows fast and sells reliably."},
                {"sectionId": "next_goal", "action": "Plant a Strawberry field", "reasoning": "Berries!"}
            ]
        });
        let provider = Arc::new(ScriptedProvider::replying(Ok(reply.to_string())));

        let (report, outcome) = adapter(provider.clone(), &catalog)
            .enhance_with_outcome(&analysis.request, analysis.report.clone())
            .await;

        assert_eq!(outcome.state, PersonalizationState::Merged);
        assert_eq!(outcome.merged_fields, 3);
        assert_eq!(outcome.rejected_fields, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.player_profile.summary, "A tidy Carrot patch is the perfect start.");
        assert_eq!(report.sections[0].points[0].reasoning, "Carrot grows fast and sells reliably.");
        assert_eq!(
            report.actions().collect::<Vec<_>>(),
            analysis.report.actions().collect::<Vec<_>>()
        );
        assert_eq!(report.main_title, analysis.report.main_title);
    }

    #[tokio::test]
    async fn prose_naming_unselected_items_is_rejected_field_by_field() {
        let catalog = catalog();
        let analysis = analysis(&catalog);
        let reply = json!({
            "summary": "Trade your Carrot for a Mango tree soon.",
            "midBreakerQuote": "Patience pays."
        });
        let provider = Arc::new(ScriptedProvider::replying(Ok(format!("```json\n{reply}\n```"))));

        let (report, outcome) = adapter(provider, &catalog)
            .enhance_with_outcome(&analysis.request, analysis.report.clone())
            .await;

        assert_eq!(report.player_profile.summary, analysis.report.player_profile.summary);
        assert_eq!(report.mid_breaker_quote, "Patience pays.");
        assert_eq!(outcome.rejected_fields, 1);
        assert_eq!(outcome.merged_fields, 1);
    }
}

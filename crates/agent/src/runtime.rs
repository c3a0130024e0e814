use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use garden_core::advisor::assembler::ReportAssembler;
use garden_core::advisor::catalog::Catalog;
use garden_core::advisor::normalizer::NormalizationWarning;
use garden_core::advisor::RuleAdvisor;
use garden_core::config::AppConfig;
use garden_core::domain::report::Report;
use garden_core::errors::ApplicationError;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm::{provider_from_config, DisabledProvider, PersonalizationProvider, ProviderStatus};
use crate::personalize::{PersonalizationAdapter, PersonalizationOutcome};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub report: Report,
    pub warnings: Vec<NormalizationWarning>,
    pub personalization: PersonalizationOutcome,
}

/// Normalizer, engine, personalization, and assembly for one request at a time.
/// Everything shared between requests is read-only.
pub struct AdvisorRuntime {
    advisor: RuleAdvisor,
    personalization: PersonalizationAdapter,
    assembler: ReportAssembler,
}

impl AdvisorRuntime {
    pub fn new(
        catalog: Arc<Catalog>,
        provider: Arc<dyn PersonalizationProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            advisor: RuleAdvisor::new(Arc::clone(&catalog)),
            personalization: PersonalizationAdapter::new(provider, catalog, timeout),
            assembler: ReportAssembler,
        }
    }

    /// Rule reports only; the provider is never consulted.
    pub fn offline(catalog: Arc<Catalog>) -> Self {
        Self::new(catalog, Arc::new(DisabledProvider), Duration::ZERO)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        let catalog = Catalog::load_or_builtin(config.catalog.path.as_deref())
            .map_err(|error| ApplicationError::Catalog(error.to_string()))?;
        let provider = provider_from_config(&config.llm)
            .map_err(|error| ApplicationError::Configuration(error.to_string()))?;

        Ok(Self::new(Arc::new(catalog), provider, Duration::from_secs(config.llm.timeout_secs)))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.advisor.catalog()
    }

    pub fn provider_name(&self) -> &'static str {
        self.personalization.provider_name()
    }

    pub fn provider_status(&self) -> ProviderStatus {
        self.personalization.provider_status()
    }

    pub async fn analyze(&self, raw: &Value) -> Result<AnalysisOutcome, ApplicationError> {
        self.analyze_traced(raw, "local").await
    }

    pub async fn analyze_traced(
        &self,
        raw: &Value,
        correlation_id: &str,
    ) -> Result<AnalysisOutcome, ApplicationError> {
        let analysis = self.advisor.analyze(raw).map_err(|error| {
            warn!(
                event_name = "analysis.rejected",
                correlation_id,
                error = %error,
                "request rejected before report generation"
            );
            ApplicationError::from(error)
        })?;

        for warning in &analysis.warnings {
            warn!(
                event_name = "analysis.normalized",
                correlation_id,
                field = %warning.field,
                message = %warning.message,
                "request field normalized"
            );
        }

        let (report, personalization) =
            self.personalization.enhance_with_outcome(&analysis.request, analysis.report).await;
        let report = self.assembler.assemble(report, Utc::now())?;

        info!(
            event_name = "analysis.completed",
            correlation_id,
            report_id = %report.report_id,
            mode = analysis.request.interaction_mode.as_str(),
            items = analysis.request.selections.len(),
            personalization = ?personalization.state,
            "report generated"
        );

        Ok(AnalysisOutcome { report, warnings: analysis.warnings, personalization })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use garden_core::advisor::catalog::Catalog;
    use garden_core::errors::{ApplicationError, DomainError};
    use serde_json::json;

    use super::AdvisorRuntime;
    use crate::personalize::PersonalizationState;

    fn runtime() -> AdvisorRuntime {
        AdvisorRuntime::offline(Arc::new(Catalog::builtin().expect("catalog")))
    }

    #[tokio::test]
    async fn offline_analysis_returns_an_assembled_report() {
        let outcome = runtime()
            .analyze(&json!({
                "selectedItems": {"carrot": 5},
                "gold": 100,
                "inGameDate": "Spring, Day 1",
                "currentDate": "2024-01-01T00:00:00Z",
                "interactionMode": "beginner"
            }))
            .await
            .expect("analysis");

        assert!(outcome.report.report_id.starts_with("GGSB-"));
        assert!(!outcome.report.publication_date.is_empty());
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.personalization.state, PersonalizationState::Fallback);
        assert!(outcome.report.actions().any(|action| action.contains("Carrot")));
    }

    #[tokio::test]
    async fn normalization_warnings_are_returned() {
        let outcome = runtime()
            .analyze(&json!({
                "selectedItems": {"carrot": 2, "moon_melon": 1},
                "gold": 50,
                "inGameDate": "Spring, Day 2",
                "currentDate": "2024-01-01",
                "interactionMode": "wizard"
            }))
            .await
            .expect("analysis");

        let fields = outcome.warnings.iter().map(|warning| warning.field.as_str()).collect::<Vec<_>>();
        assert!(fields.contains(&"interactionMode"));
        assert!(fields.iter().any(|field| field.contains("moon_melon")));
    }

    #[tokio::test]
    async fn missing_fields_are_validation_errors() {
        let error = runtime()
            .analyze(&json!({"selectedItems": {"carrot": 1}, "gold": 10}))
            .await
            .expect_err("missing inGameDate");

        let ApplicationError::Domain(DomainError::Validation(validation)) = error else {
            panic!("expected validation error, got {error:?}");
        };
        assert!(validation.mentions("inGameDate"));
    }

    #[tokio::test]
    async fn repeated_requests_share_content_but_not_identity() {
        let runtime = runtime();
        let request = json!({
            "selectedItems": {"mango": 1, "dragonfly": 1},
            "gold": 5000,
            "inGameDate": "Summer, Day 9",
            "currentDate": "2024-06-01",
            "interactionMode": "expert",
            "expertOptions": {"optimizationGoal": "profit", "riskTolerance": "aggressive", "timeHorizon": "long"}
        });

        let first = runtime.analyze(&request).await.expect("first");
        let second = runtime.analyze(&request).await.expect("second");

        assert!(first.report.same_content_as(&second.report));
        assert_ne!(first.report.report_id, second.report.report_id);
    }
}

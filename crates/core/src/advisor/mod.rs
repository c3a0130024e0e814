pub mod assembler;
pub mod catalog;
pub mod engine;
pub mod normalizer;
pub mod rules;

use std::sync::Arc;

use serde_json::Value;

use crate::domain::report::Report;
use crate::domain::request::AnalysisRequest;
use crate::errors::DomainError;

use self::{
    catalog::Catalog,
    engine::{RecommendationEngine, RuleBasedEngine},
    normalizer::{NormalizationWarning, RequestNormalizer},
};

/// Output of the deterministic half of an analysis, before any prose enrichment.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleAnalysis {
    pub request: AnalysisRequest,
    pub report: Report,
    pub warnings: Vec<NormalizationWarning>,
}

/// Normalizer plus engine over a shared catalog.
pub struct RuleAdvisor<E = RuleBasedEngine> {
    catalog: Arc<Catalog>,
    engine: E,
}

impl RuleAdvisor<RuleBasedEngine> {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_engine(catalog, RuleBasedEngine)
    }
}

impl<E> RuleAdvisor<E>
where
    E: RecommendationEngine,
{
    pub fn with_engine(catalog: Arc<Catalog>, engine: E) -> Self {
        Self { catalog, engine }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Validation happens before the engine is consulted; an invalid request never
    /// reaches it.
    pub fn analyze(&self, raw: &Value) -> Result<RuleAnalysis, DomainError> {
        let normalized = RequestNormalizer::new(&self.catalog).normalize(raw)?;
        let report = self.engine.generate(&normalized.request)?;

        Ok(RuleAnalysis { request: normalized.request, report, warnings: normalized.warnings })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::{RuleAdvisor, RuleAnalysis};
    use crate::advisor::catalog::Catalog;
    use crate::advisor::engine::{RecommendationEngine, RuleBasedEngine};
    use crate::domain::report::Report;
    use crate::domain::request::AnalysisRequest;
    use crate::errors::DomainError;

    #[derive(Default)]
    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl RecommendationEngine for CountingEngine {
        fn generate(&self, request: &AnalysisRequest) -> Result<Report, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RuleBasedEngine.generate(request)
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::builtin().expect("builtin catalog"))
    }

    #[test]
    fn analyze_runs_normalizer_then_engine() {
        let advisor = RuleAdvisor::new(catalog());
        let RuleAnalysis { request, report, warnings } = advisor
            .analyze(&json!({
                "selectedItems": {"carrot": 5},
                "gold": 100,
                "inGameDate": "Spring, Day 1",
                "currentDate": "2024-01-01T00:00:00Z",
                "interactionMode": "beginner"
            }))
            .expect("analysis succeeds");

        assert_eq!(request.selected_names(), vec!["carrot"]);
        assert!(warnings.is_empty());
        assert_eq!(report.main_title, "Your Garden Guide: Growing Carrot");
    }

    #[test]
    fn invalid_requests_never_reach_the_engine() {
        let advisor = RuleAdvisor::with_engine(catalog(), CountingEngine::default());
        let error = advisor
            .analyze(&json!({
                "selectedItems": {"carrot": 5},
                "gold": 100,
                "currentDate": "2024-01-01T00:00:00Z"
            }))
            .expect_err("missing inGameDate");

        assert!(matches!(error, DomainError::Validation(validation) if validation.mentions("inGameDate")));
        assert_eq!(advisor.engine.calls.load(Ordering::SeqCst), 0);
    }
}

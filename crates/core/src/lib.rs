pub mod advisor;
pub mod config;
pub mod domain;
pub mod errors;

pub use advisor::assembler::ReportAssembler;
pub use advisor::catalog::{Catalog, CatalogError};
pub use advisor::engine::{RecommendationEngine, RuleBasedEngine};
pub use advisor::normalizer::{NormalizationWarning, NormalizedRequest, RequestNormalizer};
pub use advisor::{RuleAdvisor, RuleAnalysis};
pub use domain::item::{BonusType, Item, ItemId, ItemSource, Tier};
pub use domain::report::{ActionPoint, FooterAnalysis, PlayerProfile, Report, ReportSection};
pub use domain::request::{AnalysisRequest, ExpertOptions, InteractionMode, SelectionEntry};
pub use errors::{ApplicationError, DomainError, ErrorKind, InterfaceError};

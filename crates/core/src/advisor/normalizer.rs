use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::advisor::catalog::Catalog;
use crate::domain::request::{
    AnalysisRequest, ExpertOptions, InGameDate, InteractionMode, OptimizationGoal, RiskTolerance,
    SelectionEntry, TimeHorizon,
};
use crate::errors::{DomainError, FieldIssue, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NormalizationWarning {
    pub field: String,
    pub message: String,
}

impl NormalizationWarning {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRequest {
    pub request: AnalysisRequest,
    pub warnings: Vec<NormalizationWarning>,
}

/// Turns raw client JSON into an [`AnalysisRequest`]. Field problems are collected
/// rather than reported one at a time; unknown items are dropped with a warning.
pub struct RequestNormalizer<'a> {
    catalog: &'a Catalog,
}

impl<'a> RequestNormalizer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn normalize(&self, raw: &Value) -> Result<NormalizedRequest, DomainError> {
        let Some(object) = raw.as_object() else {
            return Err(ValidationError::new(vec![FieldIssue::invalid_type(
                "request",
                "a JSON object",
            )])
            .into());
        };

        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        let quantities = read_selected_items(object, &mut issues);
        let gold = read_gold(object, &mut issues);
        let in_game_date = read_in_game_date(object, &mut issues, &mut warnings);
        let current_date = read_current_date(object, &mut issues);
        let interaction_mode = read_interaction_mode(object, &mut warnings);
        let expert_options = read_expert_options(object, &mut issues, &mut warnings);

        if !issues.is_empty() {
            return Err(ValidationError::new(issues).into());
        }

        let (Some(quantities), Some(gold), Some(in_game_date), Some(current_date)) =
            (quantities, gold, in_game_date, current_date)
        else {
            return Err(ValidationError::new(vec![FieldIssue::invalid_type(
                "request",
                "a complete analysis request",
            )])
            .into());
        };

        let selections = self.resolve(quantities, &mut warnings)?;

        Ok(NormalizedRequest {
            request: AnalysisRequest {
                selections,
                gold,
                in_game_date,
                current_date,
                interaction_mode,
                expert_options,
            },
            warnings,
        })
    }

    fn resolve(
        &self,
        quantities: Vec<(String, u32)>,
        warnings: &mut Vec<NormalizationWarning>,
    ) -> Result<Vec<SelectionEntry>, DomainError> {
        let mut selections: Vec<SelectionEntry> = Vec::new();
        let mut dropped = Vec::new();

        for (key, quantity) in quantities {
            let Some(item) = self.catalog.resolve(&key) else {
                warnings.push(NormalizationWarning::new(
                    format!("selectedItems.{key}"),
                    "unknown item dropped from the selection",
                ));
                dropped.push(key);
                continue;
            };

            if let Some(existing) = selections.iter_mut().find(|entry| entry.item.id == item.id) {
                existing.quantity = existing.quantity.saturating_add(quantity);
                warnings.push(NormalizationWarning::new(
                    format!("selectedItems.{key}"),
                    format!("merged with an earlier entry for `{}`", item.name),
                ));
                continue;
            }

            selections.push(SelectionEntry { item: item.clone(), quantity });
        }

        if selections.is_empty() {
            return Err(DomainError::EmptySelection { dropped });
        }

        Ok(selections)
    }
}

fn read_selected_items(
    object: &Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
) -> Option<Vec<(String, u32)>> {
    let entries = match object.get("selectedItems") {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::missing("selectedItems"));
            return None;
        }
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            issues.push(FieldIssue::invalid_type(
                "selectedItems",
                "an object mapping item keys to quantities",
            ));
            return None;
        }
    };

    if entries.is_empty() {
        issues.push(FieldIssue::invalid_value("selectedItems", "must select at least one item"));
        return None;
    }

    let before = issues.len();
    let mut quantities = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match positive_quantity(value) {
            Some(quantity) => quantities.push((key.clone(), quantity)),
            None => issues.push(FieldIssue::invalid_type(
                format!("selectedItems.{key}"),
                "a positive integer quantity",
            )),
        }
    }

    (issues.len() == before).then_some(quantities)
}

fn positive_quantity(value: &Value) -> Option<u32> {
    if let Some(quantity) = value.as_u64() {
        return u32::try_from(quantity).ok().filter(|quantity| *quantity > 0);
    }
    let float = value.as_f64()?;
    if float.fract() != 0.0 || float < 1.0 || float > f64::from(u32::MAX) {
        return None;
    }
    Some(float as u32)
}

fn read_gold(object: &Map<String, Value>, issues: &mut Vec<FieldIssue>) -> Option<u64> {
    match object.get("gold") {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::missing("gold"));
            None
        }
        Some(Value::Number(number)) => {
            if let Some(gold) = number.as_u64() {
                return Some(gold);
            }
            match number.as_f64() {
                Some(gold) if gold.is_finite() && gold >= 0.0 => Some(gold.floor() as u64),
                _ => {
                    issues.push(FieldIssue::invalid_value("gold", "must not be negative"));
                    None
                }
            }
        }
        Some(_) => {
            issues.push(FieldIssue::invalid_type("gold", "a number"));
            None
        }
    }
}

fn read_in_game_date(
    object: &Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
    warnings: &mut Vec<NormalizationWarning>,
) -> Option<InGameDate> {
    match object.get("inGameDate") {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::missing("inGameDate"));
            None
        }
        Some(Value::String(raw)) if raw.trim().is_empty() => {
            issues.push(FieldIssue::invalid_value("inGameDate", "must not be empty"));
            None
        }
        Some(Value::String(raw)) => {
            let date = InGameDate::parse(raw);
            if date.season.is_none() {
                warnings.push(NormalizationWarning::new(
                    "inGameDate",
                    "expected `<Season>, Day <n>`; seasonal bonuses are not applied",
                ));
            } else if date.day.is_none() {
                warnings.push(NormalizationWarning::new(
                    "inGameDate",
                    "expected `<Season>, Day <n>`; the day number was not recognized",
                ));
            }
            Some(date)
        }
        Some(_) => {
            issues.push(FieldIssue::invalid_type("inGameDate", "a string"));
            None
        }
    }
}

fn read_current_date(
    object: &Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
) -> Option<DateTime<Utc>> {
    match object.get("currentDate") {
        None | Some(Value::Null) => {
            issues.push(FieldIssue::missing("currentDate"));
            None
        }
        Some(Value::String(raw)) => {
            let parsed = parse_current_date(raw.trim());
            if parsed.is_none() {
                issues.push(FieldIssue::invalid_value(
                    "currentDate",
                    "must be an ISO-8601 date or date-time",
                ));
            }
            parsed
        }
        Some(_) => {
            issues.push(FieldIssue::invalid_type("currentDate", "a string"));
            None
        }
    }
}

fn parse_current_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn read_interaction_mode(
    object: &Map<String, Value>,
    warnings: &mut Vec<NormalizationWarning>,
) -> InteractionMode {
    let mode = object.get("interactionMode").and_then(Value::as_str).and_then(InteractionMode::parse);
    mode.unwrap_or_else(|| {
        warnings.push(NormalizationWarning::new(
            "interactionMode",
            "missing or unknown mode; using `advanced`",
        ));
        InteractionMode::Advanced
    })
}

fn read_expert_options(
    object: &Map<String, Value>,
    issues: &mut Vec<FieldIssue>,
    warnings: &mut Vec<NormalizationWarning>,
) -> Option<ExpertOptions> {
    let options = match object.get("expertOptions") {
        None | Some(Value::Null) => return None,
        Some(Value::Object(options)) => options,
        Some(_) => {
            issues.push(FieldIssue::invalid_type("expertOptions", "an object"));
            return None;
        }
    };

    Some(ExpertOptions {
        optimization_goal: read_option(options, "optimizationGoal", OptimizationGoal::parse, warnings),
        risk_tolerance: read_option(options, "riskTolerance", RiskTolerance::parse, warnings),
        time_horizon: read_option(options, "timeHorizon", TimeHorizon::parse, warnings),
    })
}

fn read_option<T: Default>(
    options: &Map<String, Value>,
    key: &str,
    parse: fn(&str) -> Option<T>,
    warnings: &mut Vec<NormalizationWarning>,
) -> T {
    match options.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => value.as_str().and_then(parse).unwrap_or_else(|| {
            warnings.push(NormalizationWarning::new(
                format!("expertOptions.{key}"),
                "unknown value replaced by the default",
            ));
            T::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::RequestNormalizer;
    use crate::advisor::catalog::Catalog;
    use crate::domain::request::{InteractionMode, OptimizationGoal, RiskTolerance, TimeHorizon};
    use crate::errors::DomainError;

    fn catalog() -> Catalog {
        Catalog::builtin().expect("builtin catalog")
    }

    fn valid() -> serde_json::Value {
        json!({
            "selectedItems": {"carrot": 5},
            "gold": 100,
            "inGameDate": "Spring, Day 1",
            "currentDate": "2024-01-01T00:00:00Z",
            "interactionMode": "beginner"
        })
    }

    #[test]
    fn valid_request_normalizes_without_warnings() {
        let catalog = catalog();
        let normalized = RequestNormalizer::new(&catalog).normalize(&valid()).expect("valid request");

        assert!(normalized.warnings.is_empty());
        let request = normalized.request;
        assert_eq!(request.selected_names(), vec!["carrot"]);
        assert_eq!(request.selections[0].quantity, 5);
        assert_eq!(request.gold, 100);
        assert_eq!(request.interaction_mode, InteractionMode::Beginner);
        assert_eq!(
            request.current_date,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("date")
        );
    }

    #[test]
    fn missing_in_game_date_is_a_validation_error() {
        let catalog = catalog();
        let mut raw = valid();
        raw.as_object_mut().expect("object").remove("inGameDate");

        let error = RequestNormalizer::new(&catalog).normalize(&raw).expect_err("should fail");
        let DomainError::Validation(validation) = error else {
            panic!("expected validation error, got {error:?}");
        };
        assert_eq!(validation.fields(), vec!["inGameDate"]);
    }

    #[test]
    fn every_invalid_field_is_reported_at_once() {
        let catalog = catalog();
        let raw = json!({
            "selectedItems": {"carrot": 0, "tomato": "lots"},
            "gold": -5,
            "inGameDate": "",
            "currentDate": "yesterday",
            "expertOptions": "fast"
        });

        let error = RequestNormalizer::new(&catalog).normalize(&raw).expect_err("should fail");
        let DomainError::Validation(validation) = error else {
            panic!("expected validation error, got {error:?}");
        };
        for field in [
            "selectedItems.carrot",
            "selectedItems.tomato",
            "gold",
            "inGameDate",
            "currentDate",
            "expertOptions",
        ] {
            assert!(validation.mentions(field), "missing issue for {field}: {validation}");
        }
    }

    #[test]
    fn unknown_items_are_dropped_with_a_warning() {
        let catalog = catalog();
        let mut raw = valid();
        raw["selectedItems"] = json!({"carrot": 2, "moon_melon": 1});

        let normalized = RequestNormalizer::new(&catalog).normalize(&raw).expect("valid request");
        assert_eq!(normalized.request.selected_names(), vec!["carrot"]);
        assert!(normalized.warnings.iter().any(|warning| warning.field == "selectedItems.moon_melon"));
    }

    #[test]
    fn only_unknown_items_is_an_empty_selection() {
        let catalog = catalog();
        let mut raw = valid();
        raw["selectedItems"] = json!({"moon_melon": 1});

        let error = RequestNormalizer::new(&catalog).normalize(&raw).expect_err("should fail");
        assert_eq!(error, DomainError::EmptySelection { dropped: vec!["moon_melon".to_owned()] });
    }

    #[test]
    fn keys_for_the_same_item_are_merged() {
        let catalog = catalog();
        let mut raw = valid();
        raw["selectedItems"] = json!({"Orange Tulip": 2, "orange_tulip": 3});

        let normalized = RequestNormalizer::new(&catalog).normalize(&raw).expect("valid request");
        assert_eq!(normalized.request.selections.len(), 1);
        assert_eq!(normalized.request.selections[0].quantity, 5);
        assert_eq!(normalized.warnings.len(), 1);
    }

    #[test]
    fn lenient_fields_fall_back_with_warnings() {
        let catalog = catalog();
        let raw = json!({
            "selectedItems": {"1": 1},
            "gold": 99.9,
            "inGameDate": "Harvest festival",
            "currentDate": "2024-06-01",
            "interactionMode": "wizard",
            "expertOptions": {"optimizationGoal": "fame", "riskTolerance": "aggressive"}
        });

        let normalized = RequestNormalizer::new(&catalog).normalize(&raw).expect("valid request");
        let request = &normalized.request;
        assert_eq!(request.selected_names(), vec!["carrot"]);
        assert_eq!(request.gold, 99);
        assert_eq!(request.interaction_mode, InteractionMode::Advanced);
        let options = request.expert_options.expect("expert options kept");
        assert_eq!(options.optimization_goal, OptimizationGoal::Balanced);
        assert_eq!(options.risk_tolerance, RiskTolerance::Aggressive);
        assert_eq!(options.time_horizon, TimeHorizon::Medium);

        let fields =
            normalized.warnings.iter().map(|warning| warning.field.as_str()).collect::<Vec<_>>();
        assert!(fields.contains(&"inGameDate"));
        assert!(fields.contains(&"interactionMode"));
        assert!(fields.contains(&"expertOptions.optimizationGoal"));
    }

    #[test]
    fn seasonal_warning_only_when_the_season_is_unknown() {
        let catalog = catalog();
        let normalizer = RequestNormalizer::new(&catalog);
        let warning_for = |date: &str| {
            let mut raw = valid();
            raw["inGameDate"] = json!(date);
            let normalized = normalizer.normalize(&raw).expect("valid request");
            normalized
                .warnings
                .into_iter()
                .find(|warning| warning.field == "inGameDate")
                .map(|warning| warning.message)
        };

        assert_eq!(warning_for("SPRING, DAY 10"), None);
        let day_only = warning_for("Summer, sometime").expect("day warning");
        assert!(!day_only.contains("seasonal bonuses"));
        let unknown = warning_for("Harvest festival").expect("season warning");
        assert!(unknown.contains("seasonal bonuses are not applied"));
    }

    #[test]
    fn non_object_body_is_rejected() {
        let catalog = catalog();
        let error = RequestNormalizer::new(&catalog).normalize(&json!([1, 2])).expect_err("should fail");
        assert!(matches!(error, DomainError::Validation(validation) if validation.mentions("request")));
    }
}

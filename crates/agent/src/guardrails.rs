use garden_core::advisor::catalog::Catalog;
use garden_core::domain::item::Item;
use garden_core::domain::request::AnalysisRequest;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProseField {
    Summary,
    MidBreakerQuote,
    Reasoning { section_id: String, action: String },
}

impl ProseField {
    pub fn label(&self) -> String {
        match self {
            Self::Summary => "playerProfile.summary".to_string(),
            Self::MidBreakerQuote => "midBreakerQuote".to_string(),
            Self::Reasoning { section_id, .. } => format!("sections.{section_id}.reasoning"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str, detail: String },
}

impl GuardrailDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Rejects generated prose that strays from the player's selection. Items the
/// player picked may be named freely; every other catalog item is off limits.
#[derive(Clone, Debug)]
pub struct ProseGuard {
    forbidden: Vec<Item>,
    max_chars: usize,
}

impl ProseGuard {
    pub const DEFAULT_MAX_CHARS: usize = 600;

    pub fn new(catalog: &Catalog, request: &AnalysisRequest) -> Self {
        let forbidden =
            catalog.items().filter(|item| !request.is_selected(&item.name)).cloned().collect();
        Self { forbidden, max_chars: Self::DEFAULT_MAX_CHARS }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn evaluate(&self, field: &ProseField, text: &str) -> GuardrailDecision {
        let text = text.trim();
        if text.is_empty() {
            return GuardrailDecision::Deny {
                reason_code: "empty_prose",
                detail: format!("{} was empty", field.label()),
            };
        }
        if text.chars().count() > self.max_chars {
            return GuardrailDecision::Deny {
                reason_code: "prose_too_long",
                detail: format!("{} exceeds {} characters", field.label(), self.max_chars),
            };
        }
        if let Some(item) = self.forbidden.iter().find(|item| mentions(item, text)) {
            return GuardrailDecision::Deny {
                reason_code: "unselected_item",
                detail: format!("{} names `{}`, which was not selected", field.label(), item.name),
            };
        }
        GuardrailDecision::Allow
    }
}

/// Looser than [`Item::is_named_in`]: generated prose tends to pluralize, so
/// `Strawberries` or `Mangoes` still count as naming the item.
fn mentions(item: &Item, text: &str) -> bool {
    if item.is_named_in(text) {
        return true;
    }
    let text = text.to_lowercase();
    let bases = [item.display_name.to_lowercase(), item.name.replace('_', " ")];
    bases.iter().flat_map(|base| plural_forms(base)).any(|form| contains_word(&text, &form))
}

fn plural_forms(base: &str) -> Vec<String> {
    let mut forms = vec![format!("{base}s"), format!("{base}es")];
    if let Some(stem) = base.strip_suffix('y') {
        forms.push(format!("{stem}ies"));
    }
    forms
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

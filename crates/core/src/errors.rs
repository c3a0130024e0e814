use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    InvalidType { expected: &'static str },
    InvalidValue(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub problem: FieldProblem,
}

impl FieldIssue {
    pub fn missing(field: impl Into<String>) -> Self {
        Self { field: field.into(), problem: FieldProblem::Missing }
    }

    pub fn invalid_type(field: impl Into<String>, expected: &'static str) -> Self {
        Self { field: field.into(), problem: FieldProblem::InvalidType { expected } }
    }

    pub fn invalid_value(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { field: field.into(), problem: FieldProblem::InvalidValue(detail.into()) }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            FieldProblem::Missing => write!(f, "{} is missing", self.field),
            FieldProblem::InvalidType { expected } => {
                write!(f, "{} must be {expected}", self.field)
            }
            FieldProblem::InvalidValue(detail) => write!(f, "{} {detail}", self.field),
        }
    }
}

/// Every invalid field of a request, collected in one pass.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid request: {}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    pub fn fields(&self) -> Vec<&str> {
        self.issues.iter().map(|issue| issue.field.as_str()).collect()
    }

    pub fn mentions(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

fn render_issues(issues: &[FieldIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no selected item could be resolved against the catalog (dropped: {})", .dropped.join(", "))]
    EmptySelection { dropped: Vec<String> },
    #[error("report assembly failed: {0}")]
    Assembly(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("catalog failure: {0}")]
    Catalog(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    EmptySelection,
    NotFound,
    AssemblyError,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::EmptySelection => "empty_selection",
            Self::NotFound => "not_found",
            Self::AssemblyError => "assembly_error",
            Self::Internal => "internal",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { kind: ErrorKind, message: String, fields: Vec<String>, correlation_id: String },
    #[error("unprocessable request: {message}")]
    Unprocessable { kind: ErrorKind, message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { kind: ErrorKind, message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { kind: ErrorKind, message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn not_found(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: ErrorKind::NotFound,
            message: message.into(),
            correlation_id: correlation_id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest { kind, .. }
            | Self::Unprocessable { kind, .. }
            | Self::NotFound { kind, .. }
            | Self::Internal { kind, .. } => *kind,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unprocessable { message, .. }
            | Self::NotFound { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn fields(&self) -> &[String] {
        match self {
            Self::BadRequest { fields, .. } => fields,
            _ => &[],
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Unprocessable { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Unprocessable { .. } => 422,
            Self::Internal { .. } => 500,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "Some request fields are missing or invalid. Check the listed fields and try again."
            }
            Self::Unprocessable { .. } => {
                "None of the selected items are known. Pick at least one crop or pet from the encyclopedia."
            }
            Self::NotFound { .. } => "The requested item does not exist.",
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unprocessable { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = || "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::Validation(error)) => Self::BadRequest {
                kind: ErrorKind::ValidationError,
                fields: error.fields().into_iter().map(str::to_owned).collect(),
                message: error.to_string(),
                correlation_id: unassigned(),
            },
            ApplicationError::Domain(error @ DomainError::EmptySelection { .. }) => {
                Self::Unprocessable {
                    kind: ErrorKind::EmptySelection,
                    message: error.to_string(),
                    correlation_id: unassigned(),
                }
            }
            ApplicationError::Domain(error @ DomainError::Assembly(_)) => Self::Internal {
                kind: ErrorKind::AssemblyError,
                message: error.to_string(),
                correlation_id: unassigned(),
            },
            ApplicationError::Catalog(message) | ApplicationError::Configuration(message) => {
                Self::Internal { kind: ErrorKind::Internal, message, correlation_id: unassigned() }
            }
        }
    }
}

impl From<DomainError> for InterfaceError {
    fn from(value: DomainError) -> Self {
        ApplicationError::from(value).into()
    }
}

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::domain::report::Report;
use crate::errors::DomainError;

pub const REPORT_ID_PREFIX: &str = "GGSB";

/// Final gate before a report leaves the advisor: stamps identity and rejects
/// structurally incomplete reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn assemble(&self, mut report: Report, published_at: DateTime<Utc>) -> Result<Report, DomainError> {
        check_structure(&report)?;

        report.report_id = format!("{REPORT_ID_PREFIX}-{}", Uuid::new_v4().simple());
        report.publication_date = published_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        Ok(report)
    }
}

fn check_structure(report: &Report) -> Result<(), DomainError> {
    if report.main_title.trim().is_empty() {
        return Err(DomainError::Assembly("report has an empty main title".to_owned()));
    }
    if report.sections.is_empty() {
        return Err(DomainError::Assembly("report has no sections".to_owned()));
    }
    if let Some(section) = report.sections.iter().find(|section| section.points.is_empty()) {
        return Err(DomainError::Assembly(format!("section `{}` has no points", section.id)));
    }
    Ok(())
}

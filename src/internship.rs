use crate::error::ApiResult;
use crate::session::Role;
use crate::smarthub::RestResource;
use crate::validation::{ensure_end_after_start, ensure_not_blank, FormCheck};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternshipStatus {
    #[default]
    Open,
    Closed,
}

impl InternshipStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InternshipStatus::Open => "Open for applications",
            InternshipStatus::Closed => "Closed",
        }
    }
}

/// Internship offer published by the administration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Internship {
    pub id: u64,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: InternshipStatus,
}

impl Internship {
    /// Whole weeks between start and end, rounded up.
    pub fn duration_weeks(&self) -> i64 {
        let days = (self.end_date - self.start_date).num_days().max(0);
        (days + 6) / 7
    }

    pub fn date_range_label(&self) -> String {
        format!(
            "{} to {}",
            self.start_date.format("%d/%m/%Y"),
            self.end_date.format("%d/%m/%Y")
        )
    }

    pub fn location_label(&self) -> &str {
        self.location.as_deref().unwrap_or("Remote / to be defined")
    }
}

impl RestResource for Internship {
    type Form = InternshipForm;
    const PATH: &'static str = "internships";
    const LABEL: &'static str = "internship";
    const WRITE_ROLES: &'static [Role] = &[Role::Admin];

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InternshipForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Company must be 1 to 200 characters"))]
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: InternshipStatus,
}

impl FormCheck for InternshipForm {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        ensure_not_blank("Title", &self.title)?;
        ensure_not_blank("Company", &self.company)?;
        ensure_end_after_start(self.start_date, self.end_date)
    }
}

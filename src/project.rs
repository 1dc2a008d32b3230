use crate::error::ApiResult;
use crate::session::Role;
use crate::smarthub::RestResource;
use crate::validation::{ensure_not_blank, FormCheck};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Planned => "Planned",
            ProjectStatus::InProgress => "In progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub course_id: Option<u64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub member_ids: Vec<u64>,
}

impl Project {
    /// A project is overdue when its deadline has passed and it is not completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.deadline {
            Some(deadline) => deadline < today && self.status != ProjectStatus::Completed,
            None => false,
        }
    }

    pub fn deadline_label(&self) -> String {
        self.deadline
            .map(|d| d.format("%d %b %Y").to_string())
            .unwrap_or_else(|| "No deadline".to_string())
    }
}

impl RestResource for Project {
    type Form = ProjectForm;
    const PATH: &'static str = "projects";
    const LABEL: &'static str = "project";
    const WRITE_ROLES: &'static [Role] = &[Role::Teacher, Role::Admin];

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub course_id: Option<u64>,
    pub deadline: Option<NaiveDate>,
    pub status: ProjectStatus,
    pub member_ids: Vec<u64>,
}

impl FormCheck for ProjectForm {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        ensure_not_blank("Title", &self.title)
    }
}

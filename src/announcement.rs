use crate::error::ApiResult;
use crate::session::Role;
use crate::smarthub::RestResource;
use crate::validation::{ensure_not_blank, FormCheck};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author_name: Option<String>,
    /// `None` for institution-wide announcements.
    #[serde(default)]
    pub course_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Announcement {
    /// First `max_chars` characters of the content, with an ellipsis when cut.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let content = self.content.trim();
        if content.chars().count() <= max_chars {
            return content.to_string();
        }
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }

    pub fn posted_label(&self) -> String {
        format!(
            "{} by {}",
            self.created_at.format("%d/%m/%Y %H:%M"),
            self.author_name.as_deref().unwrap_or("SmartHub")
        )
    }
}

impl RestResource for Announcement {
    type Form = AnnouncementForm;
    const PATH: &'static str = "announcements";
    const LABEL: &'static str = "announcement";
    const WRITE_ROLES: &'static [Role] = &[Role::Teacher, Role::Admin];

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    pub course_id: Option<u64>,
}

impl FormCheck for AnnouncementForm {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        ensure_not_blank("Title", &self.title)?;
        ensure_not_blank("Content", &self.content)
    }
}

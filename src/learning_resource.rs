use crate::error::ApiResult;
use crate::session::Role;
use crate::smarthub::RestResource;
use crate::validation::{ensure_http_url, ensure_not_blank, FormCheck};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Document,
    Video,
    Link,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Document => "Document",
            ResourceKind::Video => "Video",
            ResourceKind::Link => "External link",
        }
    }
}

/// Learning material attached to a course.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearningResource {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
    #[serde(default)]
    pub course_id: Option<u64>,
}

impl RestResource for LearningResource {
    type Form = ResourceForm;
    const PATH: &'static str = "resources";
    const LABEL: &'static str = "resource";
    const WRITE_ROLES: &'static [Role] = &[Role::Teacher, Role::Admin];

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResourceForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
    pub course_id: Option<u64>,
}

impl FormCheck for ResourceForm {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        ensure_not_blank("Title", &self.title)?;
        ensure_http_url(&self.url)
    }
}

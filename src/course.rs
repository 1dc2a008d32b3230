use crate::error::ApiResult;
use crate::session::Role;
use crate::smarthub::RestResource;
use crate::validation::{ensure_not_blank, FormCheck};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A course as returned by `GET /courses`.
///
/// Fields:
/// - `code`: Short identifier shown in lists (`CS101`).
/// - `credits`: ECTS credits.
/// - `teacher_id` / `teacher_name`: Assigned teacher, when there is one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: u64,
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub teacher_id: Option<u64>,
    #[serde(default)]
    pub teacher_name: Option<String>,
}

impl Course {
    /// `"CS101 - Intro to Programming"`.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.code, self.title)
    }

    pub fn teacher_label(&self) -> &str {
        self.teacher_name.as_deref().unwrap_or("Unassigned")
    }

    pub fn abbreviation(&self) -> String {
        abbreviate_course_title(&self.title)
    }
}

impl RestResource for Course {
    type Form = CourseForm;
    const PATH: &'static str = "courses";
    const LABEL: &'static str = "course";
    const WRITE_ROLES: &'static [Role] = &[Role::Admin];

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseForm {
    #[validate(length(min = 1, max = 20, message = "Course code must be 1 to 20 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 30, message = "Credits must be between 1 and 30"))]
    pub credits: u32,
    pub teacher_id: Option<u64>,
}

impl FormCheck for CourseForm {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        ensure_not_blank("Course code", &self.code)?;
        ensure_not_blank("Title", &self.title)
    }
}

impl From<&Course> for CourseForm {
    fn from(course: &Course) -> Self {
        CourseForm {
            code: course.code.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            credits: course.credits,
            teacher_id: course.teacher_id,
        }
    }
}

/// Abbreviates a course title for narrow columns.
///
/// Words shorter than four characters are dropped and every remaining word is capitalized:
/// - one word: its first 6 characters;
/// - two words: 3 characters of each;
/// - three or more: 2 characters of the first, second and last word.
pub fn abbreviate_course_title(title: &str) -> String {
    let parts: Vec<Vec<char>> = title
        .split_whitespace()
        .filter(|p| p.chars().count() >= 4)
        .map(|p| {
            let lower = p.to_lowercase();
            let mut chars = lower.chars();
            let mut word: Vec<char> = Vec::new();
            if let Some(first) = chars.next() {
                word.extend(first.to_uppercase());
            }
            word.extend(chars);
            word
        })
        .collect();

    let take = |word: &Vec<char>, n: usize| word.iter().take(n).collect::<String>();
    match parts.as_slice() {
        [] => String::new(),
        [only] => take(only, 6),
        [first, second] => format!("{}{}", take(first, 3), take(second, 3)),
        [first, second, .., last] => {
            format!("{}{}{}", take(first, 2), take(second, 2), take(last, 2))
        }
    }
}

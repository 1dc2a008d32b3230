use crate::error::{ApiError, ApiResult};
use crate::session::Role;
use crate::smarthub::RestResource;
use crate::validation::{ensure_not_blank, FormCheck};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Separator used on the wire between the selected options of a multiple-choice answer.
///
/// Option text containing `;` cannot be told apart from two options after joining; see
/// [`Question::has_ambiguous_options`].
pub const MULTI_CHOICE_DELIMITER: char = ';';

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    OpenEnded,
}

impl QuestionType {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "Single choice",
            QuestionType::MultipleChoice => "Multiple choice",
            QuestionType::TrueFalse => "True / False",
            QuestionType::OpenEnded => "Open-ended",
        }
    }

    /// Whether answers are picked from the question's option list.
    pub fn has_options(&self) -> bool {
        !matches!(self, QuestionType::OpenEnded)
    }

    pub const ALL: [QuestionType; 4] = [
        QuestionType::SingleChoice,
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::OpenEnded,
    ];
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u64,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Ordered options; empty for open-ended questions.
    #[serde(default)]
    pub options: Vec<String>,
    /// Absent when the backend hides answers from students.
    #[serde(default)]
    pub correct_answer: Option<String>,
}

impl Question {
    /// Options whose text contains the multiple-choice delimiter.
    pub fn has_ambiguous_options(&self) -> bool {
        self.question_type == QuestionType::MultipleChoice
            && self
                .options
                .iter()
                .any(|o| o.contains(MULTI_CHOICE_DELIMITER))
    }

    /// How the answer should be collected. Choice questions sent without options fall back to
    /// free text so they can still be answered.
    pub fn prompt_type(&self) -> QuestionType {
        if self.question_type.has_options() && self.options.is_empty() {
            QuestionType::OpenEnded
        } else {
            self.question_type
        }
    }
}

/// Quiz definition. Never changes during an attempt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
}

fn default_active() -> bool {
    true
}

impl Quiz {
    pub fn question(&self, question_id: u64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

impl RestResource for Quiz {
    type Form = QuizForm;
    const PATH: &'static str = "quizzes";
    const LABEL: &'static str = "quiz";
    const WRITE_ROLES: &'static [Role] = &[Role::Teacher, Role::Admin];

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl AttemptStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "In progress",
            AttemptStatus::Completed => "Completed",
            AttemptStatus::Abandoned => "Abandoned",
        }
    }
}

/// An answer as stored by the backend.
///
/// For in-progress attempts only `question_id` and `answer_text` are filled. After submission the
/// correctness fields are present and the record is read-only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question_id: u64,
    #[serde(default)]
    pub answer_text: String,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub question_text: Option<String>,
}

/// One student's session against a quiz.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: u64,
    pub quiz_id: u64,
    pub student_id: u64,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub answers: Vec<AnswerResult>,
}

impl Attempt {
    pub fn correct_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.is_correct == Some(true))
            .count()
    }

    pub fn score_label(&self) -> String {
        match self.score {
            Some(score) => format!("{:.1}%", score),
            None => "Not graded".to_string(),
        }
    }

    /// Time between start and completion, if completed.
    pub fn time_spent(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub question_id: u64,
    pub answer_text: String,
}

/// Body of `POST /quizzes/{id}/attempts/{attemptId}/submit`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub quiz_id: u64,
    pub answers: Vec<AnswerPayload>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionForm {
    #[validate(length(min = 1, message = "Question text is required"))]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

impl QuestionForm {
    fn check_consistency(&self, position: usize) -> ApiResult<()> {
        let fail = |msg: &str| Err(ApiError::Validation(format!("Question {}: {}", position, msg)));
        ensure_not_blank(&format!("Question {} text", position), &self.text)?;

        match self.question_type {
            QuestionType::OpenEnded => {
                if !self.options.is_empty() {
                    return fail("open-ended questions take no options");
                }
                return Ok(());
            }
            QuestionType::TrueFalse => {
                if self.options.len() != 2 {
                    return fail("true/false questions need exactly two options");
                }
            }
            QuestionType::SingleChoice | QuestionType::MultipleChoice => {
                if self.options.len() < 2 {
                    return fail("at least two options are required");
                }
            }
        }

        if self.options.iter().any(|o| o.trim().is_empty()) {
            return fail("options cannot be empty");
        }
        let correct = match self.correct_answer.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => return fail("a correct answer is required"),
        };
        let parts: Vec<&str> = if self.question_type == QuestionType::MultipleChoice {
            correct.split(MULTI_CHOICE_DELIMITER).map(str::trim).collect()
        } else {
            vec![correct.trim()]
        };
        if parts.iter().all(|p| self.options.iter().any(|o| o == p)) {
            Ok(())
        } else {
            fail("the correct answer must be one of the options")
        }
    }
}

impl From<&Question> for QuestionForm {
    fn from(question: &Question) -> Self {
        QuestionForm {
            text: question.text.clone(),
            question_type: question.question_type,
            options: question.options.clone(),
            correct_answer: question.correct_answer.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub active: bool,
    #[validate(length(min = 1, message = "A quiz needs at least one question"))]
    pub questions: Vec<QuestionForm>,
}

impl FormCheck for QuizForm {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        ensure_not_blank("Title", &self.title)?;
        for (index, question) in self.questions.iter().enumerate() {
            question.check_consistency(index + 1)?;
        }
        Ok(())
    }
}

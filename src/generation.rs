//! Quiz generation requests and agent recommendations.
//!
//! Content synthesis happens in the backend's retrieval-augmented generation service. The client
//! only sends the request form, lets a teacher edit the returned draft, and saves it as a regular
//! quiz.

use crate::error::{ApiError, ApiResult};
use crate::quiz::{QuestionForm, QuestionType, QuizForm};
use crate::validation::{ensure_not_blank, FormCheck};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

pub const MAX_GENERATED_QUESTIONS: u32 = 50;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizGenerationRequest {
    #[validate(length(min = 1, max = 300, message = "Topic must be 1 to 300 characters"))]
    pub topic: String,
    #[validate(range(min = 1, max = 50, message = "Question count must be between 1 and 50"))]
    pub question_count: u32,
    pub difficulty: Difficulty,
    pub question_types: BTreeSet<QuestionType>,
    /// Course whose material the generator should draw from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<u64>,
}

impl QuizGenerationRequest {
    pub fn new(topic: &str, question_count: u32, difficulty: Difficulty) -> Self {
        QuizGenerationRequest {
            topic: topic.to_string(),
            question_count,
            difficulty,
            question_types: QuestionType::ALL.into_iter().collect(),
            course_id: None,
        }
    }
}

impl FormCheck for QuizGenerationRequest {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        ensure_not_blank("Topic", &self.topic)?;
        if self.question_types.is_empty() {
            return Err(ApiError::Validation(
                "Select at least one question type".to_string(),
            ));
        }
        Ok(())
    }
}

/// Unsaved quiz returned by the generator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionForm>,
}

impl QuizDraft {
    pub fn rename(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn edit_question_text(&mut self, index: usize, text: &str) -> ApiResult<()> {
        let question = self.questions.get_mut(index).ok_or_else(|| {
            ApiError::Validation(format!("Draft has no question {}", index + 1))
        })?;
        question.text = text.to_string();
        Ok(())
    }

    pub fn remove_question(&mut self, index: usize) -> ApiResult<QuestionForm> {
        if index >= self.questions.len() {
            return Err(ApiError::Validation(format!(
                "Draft has no question {}",
                index + 1
            )));
        }
        Ok(self.questions.remove(index))
    }

    /// Turns the draft into a quiz form ready for `SmartHub::create::<Quiz>`.
    pub fn into_form(self, active: bool) -> QuizForm {
        QuizForm {
            title: self.title,
            description: self.description,
            active,
            questions: self.questions,
        }
    }
}

/// Item suggested by the recommendation agent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub resource_id: Option<u64>,
    #[serde(default)]
    pub quiz_id: Option<u64>,
}

impl Recommendation {
    pub fn kind_label(&self) -> &'static str {
        match (self.quiz_id, self.resource_id) {
            (Some(_), _) => "Quiz",
            (None, Some(_)) => "Resource",
            (None, None) => "Tip",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Quiz;
    use crate::smarthub::SmartHub;
    use crate::test_support::FakeTransport;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn request_defaults_to_every_question_type() {
        let request = QuizGenerationRequest::new("Ownership", 5, Difficulty::Hard);
        assert_eq!(request.question_types.len(), 4);
        assert!(request.check().is_ok());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["questionCount"], 5);
        assert_eq!(json["difficulty"], "HARD");
        assert!(json.get("courseId").is_none());
    }

    #[test]
    fn request_validation() {
        let mut request = QuizGenerationRequest::new("Ownership", 0, Difficulty::Easy);
        assert!(request.check().is_err());
        request.question_count = MAX_GENERATED_QUESTIONS + 1;
        assert!(request.check().is_err());
        request.question_count = 10;
        request.question_types.clear();
        assert_eq!(
            request.check(),
            Err(ApiError::Validation("Select at least one question type".to_string()))
        );
    }

    #[test]
    fn invalid_request_is_not_sent() {
        let transport = Arc::new(FakeTransport::new());
        let api = SmartHub::new("http://hub/api", transport.clone()).with_token("t");
        let request = QuizGenerationRequest::new("  ", 3, Difficulty::Easy);
        assert!(api.generate_quiz(&request).is_err());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn draft_can_be_edited_and_saved() {
        let transport = Arc::new(FakeTransport::new());
        transport.respond_json(
            200,
            json!({
                "title": "Ownership quiz",
                "questions": [
                    { "text": "Does moving copy?", "type": "TRUE_FALSE",
                      "options": ["True", "False"], "correctAnswer": "False" },
                    { "text": "Explain borrowing", "type": "OPEN_ENDED" }
                ]
            }),
        );
        transport.respond_json(200, json!({ "id": 31, "title": "Borrowing" }));
        let api = SmartHub::new("http://hub/api", transport.clone()).with_token("t");

        let mut draft = api
            .generate_quiz(&QuizGenerationRequest::new("Ownership", 2, Difficulty::Medium))
            .unwrap();
        draft.rename("Borrowing");
        draft.edit_question_text(0, "Does a move copy the heap data?").unwrap();
        draft.remove_question(1).unwrap();
        assert!(draft.remove_question(5).is_err());

        let saved = api.create::<Quiz>(&draft.into_form(false)).unwrap();

        assert_eq!(saved.id, 31);
        let requests = transport.requests();
        assert_eq!(requests[0].url, "http://hub/api/quizzes/generate");
        let body = requests[1].body.as_ref().unwrap();
        assert_eq!(body["title"], "Borrowing");
        assert_eq!(body["active"], false);
        assert_eq!(body["questions"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn recommendation_labels() {
        let items: Vec<Recommendation> = serde_json::from_value(json!([
            { "title": "Retry quiz 4", "quizId": 4 },
            { "title": "Read chapter 2", "resourceId": 9, "reason": "Low score on lifetimes" },
            { "title": "Sleep more" }
        ]))
        .unwrap();
        let labels: Vec<_> = items.iter().map(|r| r.kind_label()).collect();
        assert_eq!(labels, vec!["Quiz", "Resource", "Tip"]);
    }
}

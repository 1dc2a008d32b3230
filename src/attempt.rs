//! Timed quiz attempt workflow.
//!
//! The attempt is driven by [`AttemptEvent`] messages applied to an [`AttemptState`] by a single
//! transition function, [`AttemptState::apply`]. The transition function never touches the
//! network. It returns [`AttemptEffect`]s, which [`QuizAttempt`] executes against a
//! [`QuizBackend`] before feeding the outcome back as new events.
//!
//! Client-observed lifecycle:
//!
//! ```text
//! NotStarted --Loaded--> InProgress --SubmitRequested / Tick to zero--> Submitting
//! Submitting --SubmitSucceeded--> Completed
//! Submitting --SubmitFailed-----> InProgress   (answers kept, submit allowed again)
//! ```
//!
//! Once the countdown reaches zero the answers are frozen, even if the automatic submission
//! fails and the attempt returns to `InProgress` for a manual retry.

use crate::error::{ApiError, ApiResult};
use crate::quiz::{
    AnswerPayload, AnswerResult, Attempt, AttemptStatus, Question, QuestionType, Quiz,
    SubmitRequest, MULTI_CHOICE_DELIMITER,
};
use crate::session::{Role, UserIdentity};
use crate::smarthub::SmartHub;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// The backend calls a quiz attempt needs.
pub trait QuizBackend {
    fn fetch_quiz(&self, quiz_id: u64) -> ApiResult<Quiz>;
    fn resume_attempt(&self, quiz_id: u64, user_id: u64) -> ApiResult<Attempt>;
    fn submit_attempt(
        &self,
        quiz_id: u64,
        attempt_id: u64,
        request: &SubmitRequest,
    ) -> ApiResult<Attempt>;
}

impl QuizBackend for SmartHub {
    fn fetch_quiz(&self, quiz_id: u64) -> ApiResult<Quiz> {
        SmartHub::fetch_quiz(self, quiz_id)
    }

    fn resume_attempt(&self, quiz_id: u64, user_id: u64) -> ApiResult<Attempt> {
        SmartHub::resume_attempt(self, quiz_id, user_id)
    }

    fn submit_attempt(
        &self,
        quiz_id: u64,
        attempt_id: u64,
        request: &SubmitRequest,
    ) -> ApiResult<Attempt> {
        SmartHub::submit_attempt(self, quiz_id, attempt_id, request)
    }
}

/// The answer currently held for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    Text(String),
    /// Selected options of a multiple-choice question. Selection order does not matter.
    Choices(BTreeSet<String>),
}

/// In-memory answers of an attempt, keyed by question id.
///
/// A question is answered when it has a non-empty text or at least one selected option.
/// Clearing a text answer or deselecting the last option makes it unanswered again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    answers: BTreeMap<u64, AnswerValue>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the sheet from answers saved on an in-progress attempt.
    ///
    /// Multiple-choice answers are split on the delimiter. A question id appearing twice keeps
    /// its last saved value.
    pub fn from_saved(quiz: &Quiz, saved: &[AnswerResult]) -> Self {
        let mut sheet = AnswerSheet::new();
        for answer in saved {
            let is_multiple = quiz
                .question(answer.question_id)
                .map(|q| q.question_type == QuestionType::MultipleChoice)
                .unwrap_or(false);

            if is_multiple {
                let choices: BTreeSet<String> = answer
                    .answer_text
                    .split(MULTI_CHOICE_DELIMITER)
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect();
                if choices.is_empty() {
                    sheet.answers.remove(&answer.question_id);
                } else {
                    sheet
                        .answers
                        .insert(answer.question_id, AnswerValue::Choices(choices));
                }
            } else if answer.answer_text.is_empty() {
                sheet.answers.remove(&answer.question_id);
            } else {
                sheet.answers.insert(
                    answer.question_id,
                    AnswerValue::Text(answer.answer_text.clone()),
                );
            }
        }
        sheet
    }

    /// Records an answer.
    ///
    /// For multiple-choice questions `value` is toggled in or out of the selection. For every
    /// other type it replaces the previous answer. An empty value clears a text answer and is
    /// ignored for multiple choice.
    pub fn record(&mut self, question_id: u64, value: &str, question_type: QuestionType) {
        if question_type == QuestionType::MultipleChoice {
            if value.is_empty() {
                return;
            }
            let mut choices = match self.answers.remove(&question_id) {
                Some(AnswerValue::Choices(choices)) => choices,
                _ => BTreeSet::new(),
            };
            if !choices.remove(value) {
                choices.insert(value.to_string());
            }
            if !choices.is_empty() {
                self.answers
                    .insert(question_id, AnswerValue::Choices(choices));
            }
        } else if value.is_empty() {
            self.answers.remove(&question_id);
        } else {
            self.answers
                .insert(question_id, AnswerValue::Text(value.to_string()));
        }
    }

    pub fn get(&self, question_id: u64) -> Option<&AnswerValue> {
        self.answers.get(&question_id)
    }

    pub fn is_answered(&self, question_id: u64) -> bool {
        self.answers.contains_key(&question_id)
    }

    pub fn is_selected(&self, question_id: u64, option: &str) -> bool {
        match self.answers.get(&question_id) {
            Some(AnswerValue::Choices(choices)) => choices.contains(option),
            Some(AnswerValue::Text(text)) => text == option,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Flattens the sheet into the submission payload.
    ///
    /// One entry per answered question, in quiz question order, followed by answers to ids the
    /// quiz does not list (ascending id). Multiple-choice selections are joined with `;` in the
    /// order the options appear in the question; selections that are not among the options come
    /// last, sorted.
    pub fn to_payload(&self, quiz: &Quiz) -> Vec<AnswerPayload> {
        let mut payload = Vec::with_capacity(self.answers.len());
        for question in &quiz.questions {
            if let Some(value) = self.answers.get(&question.id) {
                payload.push(AnswerPayload {
                    question_id: question.id,
                    answer_text: answer_text(value, Some(question)),
                });
            }
        }
        for (question_id, value) in &self.answers {
            if quiz.question(*question_id).is_none() {
                payload.push(AnswerPayload {
                    question_id: *question_id,
                    answer_text: answer_text(value, None),
                });
            }
        }
        payload
    }
}

fn answer_text(value: &AnswerValue, question: Option<&Question>) -> String {
    match value {
        AnswerValue::Text(text) => text.clone(),
        AnswerValue::Choices(choices) => {
            let options: &[String] = question.map(|q| q.options.as_slice()).unwrap_or(&[]);
            let mut ordered: Vec<&str> = options
                .iter()
                .filter(|o| choices.contains(o.as_str()))
                .map(String::as_str)
                .collect();
            ordered.extend(
                choices
                    .iter()
                    .filter(|c| !options.contains(c))
                    .map(String::as_str),
            );
            let delimiter = MULTI_CHOICE_DELIMITER.to_string();
            ordered.join(delimiter.as_str())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    NotStarted,
    InProgress,
    Submitting,
    Completed,
}

/// Messages understood by [`AttemptState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptEvent {
    /// Quiz definition and resumed attempt arrived.
    Loaded {
        quiz: Quiz,
        attempt: Attempt,
        duration: Duration,
    },
    LoadFailed(String),
    AnswerRecorded {
        question_id: u64,
        value: String,
        question_type: QuestionType,
    },
    /// One second of the local countdown elapsed.
    Tick,
    SubmitRequested,
    SubmitSucceeded(Attempt),
    SubmitFailed(String),
    ErrorDismissed,
    /// The page showing the attempt went away.
    Unmounted,
}

/// Work requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptEffect {
    Submit {
        quiz_id: u64,
        attempt_id: u64,
        request: SubmitRequest,
    },
    StopTimer,
    ShowResults(u64),
}

/// Everything the attempt page renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptState {
    pub phase: AttemptPhase,
    pub quiz: Option<Quiz>,
    pub attempt_id: Option<u64>,
    pub answers: AnswerSheet,
    pub remaining_secs: u64,
    pub timer_running: bool,
    /// Set once the countdown reached zero. Expiry submits at most once.
    pub timed_out: bool,
    /// Cleared on unmount. Late responses are dropped once this is false.
    pub alive: bool,
    /// Inline error banner.
    pub error: Option<String>,
    pub result: Option<Attempt>,
}

impl Default for AttemptState {
    fn default() -> Self {
        AttemptState {
            phase: AttemptPhase::NotStarted,
            quiz: None,
            attempt_id: None,
            answers: AnswerSheet::new(),
            remaining_secs: 0,
            timer_running: false,
            timed_out: false,
            alive: true,
            error: None,
            result: None,
        }
    }
}

impl AttemptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit control is enabled only while answering.
    pub fn can_submit(&self) -> bool {
        self.alive && self.phase == AttemptPhase::InProgress
    }

    /// `"MM:SS"` of the countdown.
    pub fn remaining_label(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// The transition function. Returns the effects the caller must run.
    pub fn apply(&mut self, event: AttemptEvent) -> Vec<AttemptEffect> {
        match event {
            AttemptEvent::Loaded {
                quiz,
                attempt,
                duration,
            } => self.on_loaded(quiz, attempt, duration),
            AttemptEvent::LoadFailed(message) => {
                if self.alive {
                    self.error = Some(message);
                }
                Vec::new()
            }
            AttemptEvent::AnswerRecorded {
                question_id,
                value,
                question_type,
            } => {
                if self.can_submit() && !self.timed_out {
                    self.answers.record(question_id, &value, question_type);
                } else {
                    log::debug!(
                        "Ignoring answer for question {} in phase {:?} (timed out: {})",
                        question_id,
                        self.phase,
                        self.timed_out
                    );
                }
                Vec::new()
            }
            AttemptEvent::Tick => self.on_tick(),
            AttemptEvent::SubmitRequested => self.start_submission(),
            AttemptEvent::SubmitSucceeded(attempt) => {
                if !self.alive {
                    log::debug!("Dropping submission result of attempt {} after unmount", attempt.id);
                    return Vec::new();
                }
                let id = attempt.id;
                self.phase = AttemptPhase::Completed;
                self.timer_running = false;
                self.error = None;
                self.result = Some(attempt);
                vec![AttemptEffect::StopTimer, AttemptEffect::ShowResults(id)]
            }
            AttemptEvent::SubmitFailed(message) => {
                if !self.alive {
                    return Vec::new();
                }
                if self.phase == AttemptPhase::Submitting {
                    self.phase = AttemptPhase::InProgress;
                }
                self.error = Some(message);
                Vec::new()
            }
            AttemptEvent::ErrorDismissed => {
                self.error = None;
                Vec::new()
            }
            AttemptEvent::Unmounted => {
                self.alive = false;
                if self.timer_running {
                    self.timer_running = false;
                    vec![AttemptEffect::StopTimer]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_loaded(&mut self, quiz: Quiz, attempt: Attempt, duration: Duration) -> Vec<AttemptEffect> {
        if !self.alive || self.phase != AttemptPhase::NotStarted {
            return Vec::new();
        }
        self.attempt_id = Some(attempt.id);
        self.error = None;

        if attempt.status == AttemptStatus::Completed {
            let id = attempt.id;
            self.phase = AttemptPhase::Completed;
            self.quiz = Some(quiz);
            self.result = Some(attempt);
            return vec![AttemptEffect::ShowResults(id)];
        }

        self.answers = AnswerSheet::from_saved(&quiz, &attempt.answers);
        self.quiz = Some(quiz);
        self.remaining_secs = duration.as_secs();
        self.timer_running = true;
        self.timed_out = false;
        self.phase = AttemptPhase::InProgress;
        Vec::new()
    }

    fn on_tick(&mut self) -> Vec<AttemptEffect> {
        if !self.alive || !self.timer_running {
            return Vec::new();
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Vec::new();
        }

        self.timer_running = false;
        self.timed_out = true;
        let mut effects = vec![AttemptEffect::StopTimer];
        if self.phase == AttemptPhase::InProgress {
            log::info!("Time is up, submitting automatically");
            effects.extend(self.start_submission());
        }
        effects
    }

    fn start_submission(&mut self) -> Vec<AttemptEffect> {
        if !self.can_submit() {
            return Vec::new();
        }
        let (quiz, attempt_id) = match (&self.quiz, self.attempt_id) {
            (Some(quiz), Some(attempt_id)) => (quiz, attempt_id),
            _ => return Vec::new(),
        };
        if quiz.questions.iter().any(Question::has_ambiguous_options) {
            log::warn!(
                "Quiz {} has options containing '{}'; multiple-choice answers may not round-trip",
                quiz.id,
                MULTI_CHOICE_DELIMITER
            );
        }
        let request = SubmitRequest {
            quiz_id: quiz.id,
            answers: self.answers.to_payload(quiz),
        };
        let quiz_id = quiz.id;
        self.phase = AttemptPhase::Submitting;
        self.error = None;
        vec![AttemptEffect::Submit {
            quiz_id,
            attempt_id,
            request,
        }]
    }
}

/// Drives one quiz-taking session against a backend.
pub struct QuizAttempt<'a, B: QuizBackend + ?Sized> {
    backend: &'a B,
    duration: Duration,
    state: AttemptState,
    last_submit_error: Option<ApiError>,
}

impl<'a, B: QuizBackend + ?Sized> QuizAttempt<'a, B> {
    /// Arguments:
    /// - `backend`: usually the session's [`SmartHub`] client.
    /// - `duration`: length of the local countdown (see `ClientConfig::quiz_duration`).
    pub fn new(backend: &'a B, duration: Duration) -> Self {
        QuizAttempt {
            backend,
            duration,
            state: AttemptState::new(),
            last_submit_error: None,
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.state.quiz.as_ref()
    }

    pub fn results(&self) -> Option<&Attempt> {
        self.state.result.as_ref()
    }

    /// Loads the quiz and resumes or starts the user's attempt.
    ///
    /// Only students may take quizzes. The gate is a convenience; the backend enforces it too.
    ///
    /// Returns:
    /// - `Ok(())`: the attempt is in progress (answers restored, countdown started), or was
    ///   already completed and the results are available.
    /// - `Err(ApiError)`: role denied or a backend call failed; the error is also set on the state.
    pub fn begin(&mut self, quiz_id: u64, user: &UserIdentity) -> ApiResult<()> {
        if user.role != Role::Student {
            let err = ApiError::Forbidden("Only students can take quizzes".to_string());
            self.dispatch(AttemptEvent::LoadFailed(err.user_message()));
            return Err(err);
        }

        let loaded = self.backend.fetch_quiz(quiz_id).and_then(|quiz| {
            self.backend
                .resume_attempt(quiz_id, user.id)
                .map(|attempt| (quiz, attempt))
        });
        match loaded {
            Ok((quiz, attempt)) => {
                log::info!(
                    "Attempt {} on quiz {} for user {} ({} saved answers)",
                    attempt.id,
                    quiz.id,
                    user.id,
                    attempt.answers.len()
                );
                self.dispatch(AttemptEvent::Loaded {
                    quiz,
                    attempt,
                    duration: self.duration,
                });
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to start quiz {}: {}", quiz_id, e);
                self.dispatch(AttemptEvent::LoadFailed(e.user_message()));
                Err(e)
            }
        }
    }

    pub fn record_answer(&mut self, question_id: u64, value: &str, question_type: QuestionType) {
        self.dispatch(AttemptEvent::AnswerRecorded {
            question_id,
            value: value.to_string(),
            question_type,
        });
    }

    /// Submits every answer in one call.
    ///
    /// Does nothing unless the attempt is in progress. On failure the answers stay untouched, the
    /// error is shown inline and submitting is allowed again.
    pub fn submit(&mut self) -> ApiResult<()> {
        self.last_submit_error = None;
        self.dispatch(AttemptEvent::SubmitRequested);
        match self.last_submit_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Advances the countdown by one second. Reaching zero submits.
    pub fn tick(&mut self) {
        self.dispatch(AttemptEvent::Tick);
    }

    pub fn dismiss_error(&mut self) {
        self.dispatch(AttemptEvent::ErrorDismissed);
    }

    /// Applies every event already waiting on `events` without blocking.
    ///
    /// Call it after each prompt returns and before recording the answer, so ticks that arrived
    /// while the user was typing expire the attempt first. Returns the number of events applied.
    pub fn drain_events(&mut self, events: &Receiver<AttemptEvent>) -> usize {
        let mut applied = 0;
        while let Ok(event) = events.try_recv() {
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    pub fn unmount(&mut self) {
        self.dispatch(AttemptEvent::Unmounted);
    }

    /// Applies an event and runs the resulting effects until none are left.
    pub fn dispatch(&mut self, event: AttemptEvent) {
        let mut pending = self.state.apply(event);
        while !pending.is_empty() {
            let mut next = Vec::new();
            for effect in pending {
                match effect {
                    AttemptEffect::Submit {
                        quiz_id,
                        attempt_id,
                        request,
                    } => {
                        log::info!(
                            "Submitting {} answers for attempt {}",
                            request.answers.len(),
                            attempt_id
                        );
                        let event = match self.backend.submit_attempt(quiz_id, attempt_id, &request)
                        {
                            Ok(attempt) => AttemptEvent::SubmitSucceeded(attempt),
                            Err(e) => {
                                log::warn!("Submission of attempt {} failed: {}", attempt_id, e);
                                let message = e.user_message();
                                self.last_submit_error = Some(e);
                                AttemptEvent::SubmitFailed(message)
                            }
                        };
                        next.extend(self.state.apply(event));
                    }
                    AttemptEffect::StopTimer => log::debug!("Countdown stopped"),
                    AttemptEffect::ShowResults(id) => {
                        log::info!("Attempt {} completed", id);
                    }
                }
            }
            pending = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;

    fn question(id: u64, question_type: QuestionType, options: &[&str]) -> Question {
        Question {
            id,
            text: format!("Question {}", id),
            question_type,
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: None,
        }
    }

    fn sample_quiz() -> Quiz {
        Quiz {
            id: 5,
            title: "Sample".to_string(),
            description: None,
            active: true,
            questions: vec![
                question(1, QuestionType::SingleChoice, &["A", "B"]),
                question(2, QuestionType::MultipleChoice, &["X", "Y", "Z"]),
                question(3, QuestionType::OpenEnded, &[]),
            ],
        }
    }

    fn attempt(status: AttemptStatus, answers: Vec<AnswerResult>) -> Attempt {
        Attempt {
            id: 77,
            quiz_id: 5,
            student_id: 42,
            status,
            started_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            completed_at: None,
            score: None,
            answers,
        }
    }

    fn saved(question_id: u64, text: &str) -> AnswerResult {
        AnswerResult {
            question_id,
            answer_text: text.to_string(),
            is_correct: None,
            correct_answer: None,
            question_text: None,
        }
    }

    fn payload(pairs: &[(u64, &str)]) -> Vec<AnswerPayload> {
        pairs
            .iter()
            .map(|(id, text)| AnswerPayload {
                question_id: *id,
                answer_text: text.to_string(),
            })
            .collect()
    }

    fn loaded_state(duration_secs: u64) -> AttemptState {
        let mut state = AttemptState::new();
        state.apply(AttemptEvent::Loaded {
            quiz: sample_quiz(),
            attempt: attempt(AttemptStatus::InProgress, Vec::new()),
            duration: Duration::from_secs(duration_secs),
        });
        state
    }

    fn submit_count(effects: &[AttemptEffect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, AttemptEffect::Submit { .. }))
            .count()
    }

    #[test]
    fn non_multiple_choice_answers_are_last_write_wins() {
        let mut sheet = AnswerSheet::new();
        sheet.record(1, "A", QuestionType::SingleChoice);
        sheet.record(1, "B", QuestionType::SingleChoice);
        sheet.record(1, "B", QuestionType::SingleChoice);
        sheet.record(4, "True", QuestionType::TrueFalse);
        sheet.record(4, "False", QuestionType::TrueFalse);
        assert_eq!(sheet.get(1), Some(&AnswerValue::Text("B".to_string())));
        assert_eq!(sheet.get(4), Some(&AnswerValue::Text("False".to_string())));
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn multiple_choice_toggles_selection() {
        let mut sheet = AnswerSheet::new();
        sheet.record(2, "X", QuestionType::MultipleChoice);
        sheet.record(2, "Y", QuestionType::MultipleChoice);
        sheet.record(2, "X", QuestionType::MultipleChoice);
        assert!(!sheet.is_selected(2, "X"));
        assert!(sheet.is_selected(2, "Y"));

        sheet.record(2, "Y", QuestionType::MultipleChoice);
        assert!(!sheet.is_answered(2));
    }

    #[test]
    fn multiple_choice_order_of_toggles_does_not_matter() {
        let quiz = sample_quiz();
        let mut a = AnswerSheet::new();
        a.record(2, "Z", QuestionType::MultipleChoice);
        a.record(2, "X", QuestionType::MultipleChoice);
        let mut b = AnswerSheet::new();
        b.record(2, "X", QuestionType::MultipleChoice);
        b.record(2, "Z", QuestionType::MultipleChoice);
        assert_eq!(a, b);
        assert_eq!(a.to_payload(&quiz), payload(&[(2, "X;Z")]));
    }

    #[test]
    fn payload_has_one_entry_per_answered_question() {
        let quiz = sample_quiz();
        let mut sheet = AnswerSheet::new();
        sheet.record(3, "typed", QuestionType::OpenEnded);
        assert_eq!(sheet.to_payload(&quiz), payload(&[(3, "typed")]));

        sheet.record(3, "", QuestionType::OpenEnded);
        assert!(sheet.to_payload(&quiz).is_empty());
    }

    #[test]
    fn three_question_scenario_payload() {
        let quiz = sample_quiz();
        let mut sheet = AnswerSheet::new();
        sheet.record(1, "B", QuestionType::SingleChoice);
        sheet.record(2, "X", QuestionType::MultipleChoice);
        sheet.record(2, "Z", QuestionType::MultipleChoice);
        sheet.record(3, "hello", QuestionType::OpenEnded);

        assert_eq!(
            sheet.to_payload(&quiz),
            payload(&[(1, "B"), (2, "X;Z"), (3, "hello")])
        );
    }

    #[test]
    fn unknown_selections_follow_listed_options() {
        let quiz = sample_quiz();
        let mut sheet = AnswerSheet::new();
        sheet.record(2, "Z", QuestionType::MultipleChoice);
        sheet.record(2, "W", QuestionType::MultipleChoice);
        sheet.record(2, "Y", QuestionType::MultipleChoice);
        sheet.record(9, "orphan", QuestionType::OpenEnded);
        assert_eq!(
            sheet.to_payload(&quiz),
            payload(&[(2, "Y;Z;W"), (9, "orphan")])
        );
    }

    #[test]
    fn resume_restores_every_saved_answer() {
        let quiz = sample_quiz();
        let sheet = AnswerSheet::from_saved(
            &quiz,
            &[saved(1, "A"), saved(2, "Z;X"), saved(3, "draft"), saved(1, "B")],
        );

        assert_eq!(sheet.len(), 3);
        assert_eq!(sheet.get(1), Some(&AnswerValue::Text("B".to_string())));
        assert!(sheet.is_selected(2, "X") && sheet.is_selected(2, "Z"));
        assert_eq!(sheet.get(3), Some(&AnswerValue::Text("draft".to_string())));
        assert_eq!(
            sheet.to_payload(&quiz),
            payload(&[(1, "B"), (2, "X;Z"), (3, "draft")])
        );
    }

    #[test]
    fn loaded_event_starts_countdown() {
        let state = loaded_state(1800);
        assert_eq!(state.phase, AttemptPhase::InProgress);
        assert!(state.timer_running);
        assert_eq!(state.remaining_label(), "30:00");
        assert!(state.can_submit());
    }

    #[test]
    fn completed_attempt_goes_straight_to_results() {
        let mut state = AttemptState::new();
        let effects = state.apply(AttemptEvent::Loaded {
            quiz: sample_quiz(),
            attempt: attempt(AttemptStatus::Completed, Vec::new()),
            duration: Duration::from_secs(60),
        });
        assert_eq!(state.phase, AttemptPhase::Completed);
        assert_eq!(effects, vec![AttemptEffect::ShowResults(77)]);
        assert!(!state.timer_running);
    }

    #[test]
    fn manual_submit_disables_further_submits() {
        let mut state = loaded_state(60);
        state.apply(AttemptEvent::AnswerRecorded {
            question_id: 1,
            value: "A".to_string(),
            question_type: QuestionType::SingleChoice,
        });

        let first = state.apply(AttemptEvent::SubmitRequested);
        let second = state.apply(AttemptEvent::SubmitRequested);

        assert_eq!(submit_count(&first), 1);
        assert_eq!(submit_count(&second), 0);
        assert_eq!(state.phase, AttemptPhase::Submitting);
        assert!(!state.can_submit());
    }

    #[test]
    fn countdown_reaching_zero_submits_exactly_once() {
        let mut state = loaded_state(3);
        let mut submits = 0;
        for _ in 0..10 {
            submits += submit_count(&state.apply(AttemptEvent::Tick));
        }
        assert_eq!(submits, 1);
        assert!(state.timed_out);
        assert_eq!(state.remaining_secs, 0);
        assert_eq!(state.phase, AttemptPhase::Submitting);
    }

    #[test]
    fn expiry_during_manual_submission_does_not_resubmit() {
        let mut state = loaded_state(2);
        assert_eq!(submit_count(&state.apply(AttemptEvent::SubmitRequested)), 1);

        let mut effects = state.apply(AttemptEvent::Tick);
        effects.extend(state.apply(AttemptEvent::Tick));

        assert_eq!(submit_count(&effects), 0);
        assert!(effects.contains(&AttemptEffect::StopTimer));
        assert!(state.timed_out);
    }

    #[test]
    fn failed_submission_keeps_answers_and_reenables_submit() {
        let mut state = loaded_state(60);
        state.apply(AttemptEvent::AnswerRecorded {
            question_id: 3,
            value: "hello".to_string(),
            question_type: QuestionType::OpenEnded,
        });
        let before = state.answers.clone();

        state.apply(AttemptEvent::SubmitRequested);
        state.apply(AttemptEvent::SubmitFailed("Server unavailable".to_string()));

        assert_eq!(state.answers, before);
        assert_eq!(state.phase, AttemptPhase::InProgress);
        assert!(state.can_submit());
        assert_eq!(state.error.as_deref(), Some("Server unavailable"));

        assert_eq!(submit_count(&state.apply(AttemptEvent::SubmitRequested)), 1);
        assert_eq!(state.error, None);
    }

    #[test]
    fn responses_after_unmount_are_dropped() {
        let mut state = loaded_state(60);
        state.apply(AttemptEvent::SubmitRequested);
        assert_eq!(
            state.apply(AttemptEvent::Unmounted),
            vec![AttemptEffect::StopTimer]
        );

        let effects = state.apply(AttemptEvent::SubmitSucceeded(attempt(
            AttemptStatus::Completed,
            Vec::new(),
        )));

        assert!(effects.is_empty());
        assert_eq!(state.phase, AttemptPhase::Submitting);
        assert!(state.result.is_none());
        assert!(state.apply(AttemptEvent::Tick).is_empty());
    }

    struct FakeBackend {
        quiz: Quiz,
        resumed: Attempt,
        submit_results: RefCell<Vec<ApiResult<Attempt>>>,
        submitted: RefCell<Vec<SubmitRequest>>,
    }

    impl FakeBackend {
        fn new(resumed: Attempt, submit_results: Vec<ApiResult<Attempt>>) -> Self {
            FakeBackend {
                quiz: sample_quiz(),
                resumed,
                submit_results: RefCell::new(submit_results),
                submitted: RefCell::new(Vec::new()),
            }
        }
    }

    impl QuizBackend for FakeBackend {
        fn fetch_quiz(&self, quiz_id: u64) -> ApiResult<Quiz> {
            if quiz_id == self.quiz.id {
                Ok(self.quiz.clone())
            } else {
                Err(ApiError::Http {
                    status: 404,
                    message: "Quiz not found".to_string(),
                })
            }
        }

        fn resume_attempt(&self, _quiz_id: u64, _user_id: u64) -> ApiResult<Attempt> {
            Ok(self.resumed.clone())
        }

        fn submit_attempt(
            &self,
            _quiz_id: u64,
            _attempt_id: u64,
            request: &SubmitRequest,
        ) -> ApiResult<Attempt> {
            self.submitted.borrow_mut().push(request.clone());
            self.submit_results.borrow_mut().remove(0)
        }
    }

    fn user(role: Role) -> UserIdentity {
        UserIdentity {
            id: 42,
            username: "sam".to_string(),
            full_name: None,
            email: None,
            role,
        }
    }

    fn graded() -> Attempt {
        Attempt {
            status: AttemptStatus::Completed,
            score: Some(100.0),
            ..attempt(AttemptStatus::Completed, Vec::new())
        }
    }

    #[test]
    fn orchestrator_full_flow() {
        let backend = FakeBackend::new(
            attempt(AttemptStatus::InProgress, vec![saved(1, "A")]),
            vec![
                Err(ApiError::Connection("reset".to_string())),
                Ok(graded()),
            ],
        );
        let mut quiz_attempt = QuizAttempt::new(&backend, Duration::from_secs(1800));

        quiz_attempt.begin(5, &user(Role::Student)).unwrap();
        assert!(quiz_attempt.state().answers.is_selected(1, "A"));

        quiz_attempt.record_answer(1, "B", QuestionType::SingleChoice);
        quiz_attempt.record_answer(2, "X", QuestionType::MultipleChoice);
        quiz_attempt.record_answer(2, "Z", QuestionType::MultipleChoice);
        quiz_attempt.record_answer(3, "hello", QuestionType::OpenEnded);

        assert!(quiz_attempt.submit().is_err());
        assert!(quiz_attempt.state().can_submit());
        assert_eq!(quiz_attempt.state().answered_count(), 3);

        quiz_attempt.submit().unwrap();
        assert_eq!(quiz_attempt.state().phase, AttemptPhase::Completed);
        assert_eq!(quiz_attempt.results().unwrap().score, Some(100.0));

        let submitted = backend.submitted.borrow();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0], submitted[1]);
        assert_eq!(
            submitted[1].answers,
            payload(&[(1, "B"), (2, "X;Z"), (3, "hello")])
        );
    }

    #[test]
    fn orchestrator_auto_submits_on_timeout() {
        let backend = FakeBackend::new(attempt(AttemptStatus::InProgress, Vec::new()), vec![Ok(graded())]);
        let mut quiz_attempt = QuizAttempt::new(&backend, Duration::from_secs(2));
        quiz_attempt.begin(5, &user(Role::Student)).unwrap();

        quiz_attempt.tick();
        assert_eq!(backend.submitted.borrow().len(), 0);
        quiz_attempt.tick();
        quiz_attempt.tick();

        assert_eq!(backend.submitted.borrow().len(), 1);
        assert_eq!(quiz_attempt.state().phase, AttemptPhase::Completed);
    }

    #[test]
    fn teachers_cannot_take_quizzes() {
        let backend = FakeBackend::new(attempt(AttemptStatus::InProgress, Vec::new()), Vec::new());
        let mut quiz_attempt = QuizAttempt::new(&backend, Duration::from_secs(60));
        let err = quiz_attempt.begin(5, &user(Role::Teacher)).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(quiz_attempt.state().phase, AttemptPhase::NotStarted);
        assert!(quiz_attempt.state().error.is_some());
    }

    #[test]
    fn load_failure_is_reported_inline() {
        let backend = FakeBackend::new(attempt(AttemptStatus::InProgress, Vec::new()), Vec::new());
        let mut quiz_attempt = QuizAttempt::new(&backend, Duration::from_secs(60));
        assert!(quiz_attempt.begin(999, &user(Role::Student)).is_err());
        assert_eq!(quiz_attempt.state().error.as_deref(), Some("Quiz not found"));

        quiz_attempt.dismiss_error();
        assert_eq!(quiz_attempt.state().error, None);
    }

    #[test]
    fn empty_multiple_choice_value_is_ignored() {
        let mut sheet = AnswerSheet::new();
        sheet.record(2, "", QuestionType::MultipleChoice);
        assert!(!sheet.is_answered(2));

        sheet.record(2, "X", QuestionType::MultipleChoice);
        sheet.record(2, "", QuestionType::MultipleChoice);
        assert_eq!(
            sheet.to_payload(&sample_quiz()),
            payload(&[(2, "X")])
        );
    }

    #[test]
    fn answers_are_frozen_once_time_is_up() {
        let mut state = loaded_state(1);
        state.apply(AttemptEvent::Tick);
        state.apply(AttemptEvent::SubmitFailed("offline".to_string()));
        assert_eq!(state.phase, AttemptPhase::InProgress);
        assert!(state.timed_out);

        state.apply(AttemptEvent::AnswerRecorded {
            question_id: 3,
            value: "too late".to_string(),
            question_type: QuestionType::OpenEnded,
        });
        assert!(!state.answers.is_answered(3));
        assert!(state.can_submit());
    }

    #[test]
    fn answer_typed_past_the_deadline_is_not_submitted() {
        let backend = FakeBackend::new(attempt(AttemptStatus::InProgress, Vec::new()), vec![Ok(graded())]);
        let mut quiz_attempt = QuizAttempt::new(&backend, Duration::from_secs(2));
        quiz_attempt.begin(5, &user(Role::Student)).unwrap();
        quiz_attempt.record_answer(1, "A", QuestionType::SingleChoice);

        let (sender, receiver) = std::sync::mpsc::channel();
        for _ in 0..5 {
            sender.send(AttemptEvent::Tick).unwrap();
        }
        assert_eq!(quiz_attempt.drain_events(&receiver), 5);
        quiz_attempt.record_answer(3, "typed after deadline", QuestionType::OpenEnded);

        let submitted = backend.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].answers, payload(&[(1, "A")]));
        assert_eq!(quiz_attempt.state().phase, AttemptPhase::Completed);
        assert!(!quiz_attempt.state().answers.is_answered(3));
    }

    #[test]
    fn manual_retry_after_failed_auto_submit_sends_frozen_answers() {
        let backend = FakeBackend::new(
            attempt(AttemptStatus::InProgress, Vec::new()),
            vec![Err(ApiError::Connection("reset".to_string())), Ok(graded())],
        );
        let mut quiz_attempt = QuizAttempt::new(&backend, Duration::from_secs(1));
        quiz_attempt.begin(5, &user(Role::Student)).unwrap();
        quiz_attempt.record_answer(1, "B", QuestionType::SingleChoice);

        quiz_attempt.tick();
        assert!(quiz_attempt.state().error.is_some());
        quiz_attempt.record_answer(3, "late", QuestionType::OpenEnded);
        quiz_attempt.submit().unwrap();

        let submitted = backend.submitted.borrow();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[1].answers, payload(&[(1, "B")]));
    }

    #[test]
    fn dismissed_manual_failure_is_not_reported_again_by_later_ticks() {
        let backend = FakeBackend::new(
            attempt(AttemptStatus::InProgress, Vec::new()),
            vec![Err(ApiError::Connection("reset".to_string()))],
        );
        let mut quiz_attempt = QuizAttempt::new(&backend, Duration::from_secs(60));
        quiz_attempt.begin(5, &user(Role::Student)).unwrap();

        assert!(quiz_attempt.submit().is_err());
        assert!(quiz_attempt.state().error.is_some());
        quiz_attempt.dismiss_error();

        let (sender, receiver) = std::sync::mpsc::channel();
        sender.send(AttemptEvent::Tick).unwrap();
        quiz_attempt.drain_events(&receiver);

        assert_eq!(quiz_attempt.state().error, None);
        assert!(!quiz_attempt.state().timed_out);
        assert_eq!(quiz_attempt.state().remaining_secs, 59);
    }
}

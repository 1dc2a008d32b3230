//! # SmartHub Connector
//!
//! Client library for the SmartHub academic-management REST API. It covers what the SmartHub
//! front-end does on the client side, as typed Rust:
//!
//! - **Session:** login/logout and role gating for students, teachers and administrators.
//! - **Resources:** list, fetch, create, update and delete courses, projects, announcements,
//!   internships, learning resources and quizzes, with forms checked locally before sending.
//! - **Quiz attempts:** resume-or-start, in-memory answers, a local countdown with
//!   auto-submit, a single batch submission, and read-only results.
//! - **Quiz generation:** draft quizzes and recommendations from the backend's agent endpoints.
//!
//! All persistence and grading happen on the backend. The library never decides correctness.
//!
//! ## Usage
//!
//! ```no_run
//! use smarthub_connector::{ClientConfig, QuizAttempt, ReqwestTransport, Session};
//! use std::sync::Arc;
//!
//! let config = ClientConfig::load().unwrap();
//! let transport = Arc::new(ReqwestTransport::new(config.request_timeout()).unwrap());
//! let session = Session::login(transport, &config.base_url, "alice", "secret").unwrap();
//!
//! let mut attempt = QuizAttempt::new(session.api(), config.quiz_duration());
//! attempt.begin(5, session.user()).unwrap();
//! if let Err(e) = attempt.submit() {
//!     eprintln!("{}", e.user_message());
//! }
//! ```
pub mod announcement;
pub mod attempt; // Timed quiz attempt state machine and orchestrator.
pub mod config;
mod connection; // HTTP transport and request plumbing.
pub mod course;
pub mod credentials; // Stored base URL and token (keyring or environment).
pub mod error;
pub mod generation;
pub mod internship;
pub mod learning_resource;
pub mod pages;
pub mod project;
pub mod quiz;
pub mod session;
pub mod smarthub;
pub mod timer;
pub mod validation;

#[cfg(test)]
mod test_support;

// Exports key structures for external use.
pub use announcement::{Announcement, AnnouncementForm};
pub use attempt::{
    AnswerSheet, AnswerValue, AttemptEffect, AttemptEvent, AttemptPhase, AttemptState,
    QuizAttempt, QuizBackend,
};
pub use config::ClientConfig;
pub use connection::{HttpMethod, HttpResponse, ReqwestTransport, Transport};
pub use course::{Course, CourseForm};
pub use credentials::SmartHubCredentials;
pub use error::{ApiError, ApiResult};
pub use generation::{Difficulty, QuizDraft, QuizGenerationRequest, Recommendation};
pub use internship::{Internship, InternshipForm, InternshipStatus};
pub use learning_resource::{LearningResource, ResourceForm, ResourceKind};
pub use pages::ResourcePage;
pub use project::{Project, ProjectForm, ProjectStatus};
pub use quiz::{
    AnswerPayload, AnswerResult, Attempt, AttemptStatus, Question, QuestionForm, QuestionType,
    Quiz, QuizForm, SubmitRequest,
};
pub use session::{Role, Session, UserIdentity};
pub use smarthub::{RestResource, SmartHub};
pub use timer::Ticker;
pub use validation::FormCheck;

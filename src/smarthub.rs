use crate::connection::{decode, send_http_request, HttpMethod, Transport};
use crate::credentials::SmartHubCredentials;
use crate::error::ApiResult;
use crate::generation::{QuizDraft, QuizGenerationRequest, Recommendation};
use crate::quiz::{Attempt, Quiz, SubmitRequest};
use crate::session::Role;
use crate::validation::FormCheck;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// A backend collection managed through the generic list/detail/create/edit/delete cycle.
pub trait RestResource: DeserializeOwned + Clone {
    /// Payload sent on create and update.
    type Form: Serialize + FormCheck;
    /// Collection path below the API root, without slashes (`"courses"`).
    const PATH: &'static str;
    /// Singular human label used in messages.
    const LABEL: &'static str;
    /// Roles allowed to create, update and delete. Every role may read.
    const WRITE_ROLES: &'static [Role];

    fn id(&self) -> u64;
}

/// Main interface to the SmartHub REST API.
///
/// `SmartHub` is cheap to clone: the transport is shared and only the base URL and token are
/// copied. An instance without a token can only reach public endpoints such as login.
///
/// Example:
/// ```no_run
/// use smarthub_connector::{Course, ReqwestTransport, SmartHub};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(30)).unwrap());
/// let api = SmartHub::new("https://hub.example.edu/api", transport).with_token("token");
/// match api.list::<Course>() {
///     Ok(courses) => println!("{} courses", courses.len()),
///     Err(e) => eprintln!("{}", e.user_message()),
/// }
/// ```
#[derive(Clone)]
pub struct SmartHub {
    base_url: String,
    token: Option<String>,
    transport: Arc<dyn Transport>,
}

impl SmartHub {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        SmartHub {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            transport,
        }
    }

    pub fn from_credentials(credentials: &SmartHubCredentials, transport: Arc<dyn Transport>) -> Self {
        SmartHub::new(&credentials.url_smarthub, transport).with_token(&credentials.token_smarthub)
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, method: HttpMethod, path: &str, params: Vec<(String, String)>) -> ApiResult<String> {
        send_http_request(
            self.transport.as_ref(),
            method,
            &self.url(path),
            self.token.as_deref(),
            params,
        )
    }

    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> ApiResult<T> {
        let body = self.send(HttpMethod::Get, path, params)?;
        decode(&body)
    }

    pub(crate) fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.send(HttpMethod::Post(body), path, Vec::new())?;
        decode(&response)
    }

    /// POST whose response body, if any, is ignored.
    pub(crate) fn post_empty<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let body = serde_json::to_value(body)?;
        self.send(HttpMethod::Post(body), path, Vec::new())?;
        Ok(())
    }

    pub(crate) fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.send(HttpMethod::Put(body), path, Vec::new())?;
        decode(&response)
    }

    pub(crate) fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(HttpMethod::Delete, path, Vec::new())?;
        Ok(())
    }

    /// Lists every item of a resource collection.
    pub fn list<R: RestResource>(&self) -> ApiResult<Vec<R>> {
        self.get(&format!("/{}", R::PATH), Vec::new())
    }

    pub fn fetch<R: RestResource>(&self, id: u64) -> ApiResult<R> {
        self.get(&format!("/{}/{}", R::PATH, id), Vec::new())
    }

    /// Creates an item after checking the form locally.
    ///
    /// Returns:
    /// - `Ok(R)`: the item as stored by the backend.
    /// - `Err(ApiError::Validation)`: the form failed its local checks; nothing was sent.
    pub fn create<R: RestResource>(&self, form: &R::Form) -> ApiResult<R> {
        form.check()?;
        let created: R = self.post(&format!("/{}", R::PATH), form)?;
        log::info!("Created {} {}", R::LABEL, created.id());
        Ok(created)
    }

    pub fn update<R: RestResource>(&self, id: u64, form: &R::Form) -> ApiResult<R> {
        form.check()?;
        let updated = self.put(&format!("/{}/{}", R::PATH, id), form)?;
        log::info!("Updated {} {}", R::LABEL, id);
        Ok(updated)
    }

    pub fn remove<R: RestResource>(&self, id: u64) -> ApiResult<()> {
        self.delete(&format!("/{}/{}", R::PATH, id))?;
        log::info!("Deleted {} {}", R::LABEL, id);
        Ok(())
    }

    /// Fetches a quiz definition with its ordered questions.
    pub fn fetch_quiz(&self, quiz_id: u64) -> ApiResult<Quiz> {
        self.get(&format!("/quizzes/{}", quiz_id), Vec::new())
    }

    /// Resume-or-start: returns the user's in-progress attempt for the quiz, creating one if
    /// none exists. Saved answers come back in `Attempt::answers`.
    pub fn resume_attempt(&self, quiz_id: u64, user_id: u64) -> ApiResult<Attempt> {
        self.get(
            &format!("/quizzes/{}/users/{}/resume", quiz_id, user_id),
            Vec::new(),
        )
    }

    /// Submits every answer of an attempt in one call. The response carries the score and the
    /// per-answer correctness.
    pub fn submit_attempt(
        &self,
        quiz_id: u64,
        attempt_id: u64,
        request: &SubmitRequest,
    ) -> ApiResult<Attempt> {
        self.post(
            &format!("/quizzes/{}/attempts/{}/submit", quiz_id, attempt_id),
            request,
        )
    }

    pub fn fetch_attempt(&self, attempt_id: u64) -> ApiResult<Attempt> {
        self.get(&format!("/quizzes/attempts/{}", attempt_id), Vec::new())
    }

    pub fn fetch_attempt_history(&self, user_id: u64) -> ApiResult<Vec<Attempt>> {
        self.get(&format!("/quizzes/users/{}/attempts", user_id), Vec::new())
    }

    /// Asks the generation service for a draft quiz. The draft is not saved.
    pub fn generate_quiz(&self, request: &QuizGenerationRequest) -> ApiResult<QuizDraft> {
        request.check()?;
        log::info!(
            "Requesting {} generated questions on '{}'",
            request.question_count,
            request.topic
        );
        self.post("/quizzes/generate", request)
    }

    pub fn fetch_recommendations(&self, user_id: u64) -> ApiResult<Vec<Recommendation>> {
        self.get(
            &format!("/agent/users/{}/recommendations", user_id),
            Vec::new(),
        )
    }
}

impl std::fmt::Debug for SmartHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartHub")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

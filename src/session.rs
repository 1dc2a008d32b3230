use crate::connection::Transport;
use crate::credentials::SmartHubCredentials;
use crate::error::{ApiError, ApiResult};
use crate::smarthub::SmartHub;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Role of an authenticated user. Decides which pages and actions are offered.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[serde(alias = "student", alias = "ROLE_STUDENT")]
    Student,
    #[serde(alias = "teacher", alias = "ROLE_TEACHER")]
    Teacher,
    #[serde(alias = "admin", alias = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Teacher => "Teacher",
            Role::Admin => "Administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
}

impl UserIdentity {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: UserIdentity,
}

/// The authenticated user and an API client carrying their token.
///
/// A `Session` exists from a successful login until [`Session::logout`] consumes it. Every page
/// and workflow receives it explicitly; there is no ambient "current user".
#[derive(Clone, Debug)]
pub struct Session {
    api: SmartHub,
    user: UserIdentity,
}

impl Session {
    /// Logs in with a username and password.
    ///
    /// Arguments:
    /// - `transport`: network boundary used for this and every later call of the session.
    /// - `base_url`: SmartHub API root, e.g. `https://hub.example.edu/api`.
    ///
    /// Returns:
    /// - `Ok(Session)` holding the bearer token and identity returned by `POST /auth/login`.
    /// - `Err(ApiError::Validation)` if either field is blank (no request is sent).
    pub fn login(
        transport: Arc<dyn Transport>,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> ApiResult<Session> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let anonymous = SmartHub::new(base_url, transport);
        let response: LoginResponse = anonymous.post(
            "/auth/login",
            &json!({ "username": username.trim(), "password": password }),
        )?;
        log::info!(
            "Logged in as {} ({})",
            response.user.username,
            response.user.role
        );

        Ok(Session {
            api: anonymous.with_token(&response.token),
            user: response.user,
        })
    }

    /// Rebuilds a session from stored credentials by asking the backend who the token belongs to.
    pub fn resume(
        transport: Arc<dyn Transport>,
        credentials: &SmartHubCredentials,
    ) -> ApiResult<Session> {
        let api = SmartHub::from_credentials(credentials, transport);
        let user: UserIdentity = api.get("/auth/me", Vec::new())?;
        log::info!("Resumed session of {}", user.username);
        Ok(Session { api, user })
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn api(&self) -> &SmartHub {
        &self.api
    }

    pub fn credentials(&self) -> SmartHubCredentials {
        SmartHubCredentials {
            url_smarthub: self.api.base_url().to_string(),
            token_smarthub: self.api.token().unwrap_or_default().to_string(),
        }
    }

    /// Client-side role gate. Pages render a denial view on `Err`.
    pub fn require_role(&self, allowed: &[Role]) -> ApiResult<()> {
        if allowed.contains(&self.user.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "This page is not available to the {} role",
                self.user.role.label().to_lowercase()
            )))
        }
    }

    /// Ends the session on the backend. The session is consumed even if the call fails.
    pub fn logout(self) -> ApiResult<()> {
        let result = self.api.post_empty("/auth/logout", &json!({}));
        match &result {
            Ok(()) => log::info!("Logged out {}", self.user.username),
            Err(e) => log::warn!("Logout of {} failed: {}", self.user.username, e),
        }
        result
    }
}

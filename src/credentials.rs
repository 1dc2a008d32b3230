use crate::error::{ApiError, ApiResult};
use keyring::Entry;
use serde::{Deserialize, Serialize};

const KEYRING_URL_KEY: &str = "URL_SMARTHUB";
const KEYRING_TOKEN_KEY: &str = "TOKEN_SMARTHUB";

/// Base URL of the SmartHub API and the bearer token of a logged-in user.
///
/// Credentials are produced by a successful login (see `Session::login`) and can be persisted in
/// the system keyring so the next run resumes the session without prompting.
///
/// Example usage:
/// ```
/// use smarthub_connector::SmartHubCredentials;
/// let credentials = SmartHubCredentials {
///     url_smarthub: "https://smarthub.example.edu/api".to_string(),
///     token_smarthub: "your_api_token".to_string(),
/// };
/// assert!(!credentials.token_smarthub.is_empty());
/// ```
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct SmartHubCredentials {
    pub url_smarthub: String,
    pub token_smarthub: String,
}

impl SmartHubCredentials {
    /// Loads credentials from the `SMARTHUB_URL` and `SMARTHUB_TOKEN` environment variables.
    ///
    /// Only available with the `use_env_credentials` feature; otherwise always an error.
    pub fn load_credentials_from_env() -> ApiResult<SmartHubCredentials> {
        #[cfg(not(feature = "use_env_credentials"))]
        {
            Err(ApiError::Config("Feature not enabled".to_string()))
        }

        #[cfg(feature = "use_env_credentials")]
        {
            let url = std::env::var("SMARTHUB_URL").map_err(|_| {
                ApiError::Config("Error retrieving URL from environment".to_string())
            })?;
            let token = std::env::var("SMARTHUB_TOKEN").map_err(|_| {
                ApiError::Config("Error retrieving token from environment".to_string())
            })?;
            log::info!("Credentials loaded from environment -> {}", url);
            Ok(SmartHubCredentials {
                url_smarthub: url,
                token_smarthub: token,
            })
        }
    }

    /// Loads credentials from the system keyring.
    pub fn load_credentials_from_system() -> ApiResult<SmartHubCredentials> {
        let url = read_keyring(KEYRING_URL_KEY)
            .map_err(|_| ApiError::Config("Error retrieving URL from system".to_string()))?;
        let token = read_keyring(KEYRING_TOKEN_KEY)
            .map_err(|_| ApiError::Config("Error retrieving token from system".to_string()))?;
        Ok(SmartHubCredentials {
            url_smarthub: url,
            token_smarthub: token,
        })
    }

    /// Tries the environment first, then the system keyring.
    pub fn load() -> Option<SmartHubCredentials> {
        match Self::load_credentials_from_env() {
            Ok(credentials) => Some(credentials),
            Err(_) => match Self::load_credentials_from_system() {
                Ok(credentials) => Some(credentials),
                Err(e) => {
                    log::debug!("No stored credentials: {}", e);
                    None
                }
            },
        }
    }

    /// Persists the credentials in the system keyring.
    pub fn store_in_system(&self) -> ApiResult<()> {
        write_keyring(KEYRING_URL_KEY, &self.url_smarthub)?;
        write_keyring(KEYRING_TOKEN_KEY, &self.token_smarthub)?;
        Ok(())
    }

    /// Removes stored credentials. Missing entries are not an error.
    pub fn clear_system() -> ApiResult<()> {
        for key in [KEYRING_URL_KEY, KEYRING_TOKEN_KEY] {
            let entry = keyring_entry(key)?;
            match entry.delete_password() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => {
                    return Err(ApiError::Config(format!("Error removing {}: {}", key, e)));
                }
            }
        }
        Ok(())
    }
}

fn keyring_entry(key: &str) -> ApiResult<Entry> {
    let app_name = env!("CARGO_PKG_NAME");
    Entry::new(app_name, key).map_err(|e| ApiError::Config(format!("Keyring unavailable: {}", e)))
}

fn read_keyring(key: &str) -> ApiResult<String> {
    keyring_entry(key)?
        .get_password()
        .map_err(|e| ApiError::Config(format!("Error reading {}: {}", key, e)))
}

fn write_keyring(key: &str, value: &str) -> ApiResult<()> {
    keyring_entry(key)?
        .set_password(value)
        .map_err(|e| ApiError::Config(format!("Error saving {}: {}", key, e)))
}

//! Authentication endpoints.

use easytrade_core::UserId;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use super::{ApiError, ApiRequest, MarketplaceClient};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

/// Identity returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub user_id: UserId,
    pub username: String,
    /// Not every backend issues one.
    pub token: Option<String>,
}

/// Body of a registration request.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

const INCOMPLETE_LOGIN: &str = "Login response from server was incomplete.";
const REGISTERED: &str = "Registration successful! Please log in.";

impl MarketplaceClient {
    /// Exchange credentials for an identity and (optionally) a token.
    ///
    /// # Errors
    ///
    /// Returns the API's rejection, or [`ApiError::Incomplete`] when the response
    /// lacks the user id or username.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Authenticated, ApiError> {
        let request = ApiRequest::post("/api/auth/login")
            .json(json!({ "username": username, "password": password }));
        let response: LoginResponse = self.send(request).await?.unwrap_or_default();

        match response {
            LoginResponse {
                user_id: Some(user_id),
                username: Some(username),
                token,
            } if !username.is_empty() => Ok(Authenticated {
                user_id,
                username,
                token,
            }),
            _ => Err(ApiError::Incomplete(INCOMPLETE_LOGIN)),
        }
    }

    /// Create an account. Returns the confirmation message to show.
    ///
    /// # Errors
    ///
    /// Returns the API's rejection (e.g. the username is taken).
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, ApiError> {
        let response: MessageResponse = self
            .send(ApiRequest::post("/api/auth/register").json(serde_json::to_value(request)?))
            .await?
            .unwrap_or_default();
        Ok(response
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| REGISTERED.to_string()))
    }
}

//! User profile endpoint.

use easytrade_core::{User, UserId};
use secrecy::SecretString;
use tracing::instrument;

use super::{ApiError, ApiRequest, MarketplaceClient};

impl MarketplaceClient {
    /// Fetch a user's profile.
    ///
    /// Returns `Ok(None)` when the API reports the user as not found.
    ///
    /// # Errors
    ///
    /// Returns any other API failure.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn get_user_profile(
        &self,
        id: &UserId,
        token: Option<&SecretString>,
    ) -> Result<Option<User>, ApiError> {
        let path = format!("/api/users/{}", urlencoding::encode(id.as_str()));
        match self.send::<User>(ApiRequest::get(path).bearer(token)).await {
            Err(e) if e.is_not_found() => Ok(None),
            other => other,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::tests::client_for;

    #[tokio::test]
    async fn test_profile_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/12"))
            .and(header("authorization", "Bearer jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12,
                "name": "Thabo",
                "surname": "Nkosi",
                "username": "thabo",
                "email": "thabo@example.com",
                "verified": true,
                "createdAt": "2024-03-01T10:00:00Z"
            })))
            .mount(&server)
            .await;

        let token = SecretString::from("jwt");
        let user = client_for(&server)
            .get_user_profile(&UserId::from(12), Some(&token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.full_name(), "Thabo Nkosi");
        assert!(user.verified);
    }

    #[tokio::test]
    async fn test_missing_profile_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let user = client_for(&server)
            .get_user_profile(&UserId::from(99), None)
            .await
            .unwrap();
        assert!(user.is_none());
    }
}

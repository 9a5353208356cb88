//! Visitor extractors.
//!
//! Build the per-request cart and session stores from the visitor's session,
//! and guard the seller dashboard.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{Method, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use easytrade_core::UserSession;
use tower_sessions::Session;
use tracing::{debug, error};

use crate::error::AppError;
use crate::stores::{CartStore, SessionStorage, SessionStore, StoreError};

/// Fetch the session attached by `SessionManagerLayer`.
///
/// A route without the session layer is a wiring bug, so this fails loudly.
fn storage_for(parts: &Parts) -> Result<SessionStorage, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .map(SessionStorage::new)
        .ok_or_else(|| {
            error!(
                path = %parts.uri.path(),
                "Visitor stores requested on a route without the session layer"
            );
            AppError::Store(StoreError::Unavailable)
        })
}

/// The visitor's cart.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(ShoppingCart(mut cart): ShoppingCart) -> Result<String> {
///     cart.clear_cart().await?;
///     Ok(format!("{} items", cart.item_count()))
/// }
/// ```
pub struct ShoppingCart(pub CartStore<SessionStorage>);

impl<S> FromRequestParts<S> for ShoppingCart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let storage = storage_for(parts)?;
        Ok(Self(CartStore::load(storage).await))
    }
}

/// The visitor's session store, signed in or not.
pub struct Visitor(pub SessionStore<SessionStorage>);

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let storage = storage_for(parts)?;
        Ok(Self(SessionStore::load(storage).await?))
    }
}

/// Extractor that requires a signed-in seller.
///
/// Signed-out visitors are redirected to `/login`, with the requested page
/// remembered as the post-login destination.
pub struct RequireAuth {
    pub user: UserSession,
    pub session: SessionStore<SessionStorage>,
}

/// Rejection for [`RequireAuth`].
pub enum AuthRejection {
    /// Send the visitor to the login page.
    RedirectToLogin(String),
    /// The stores could not be loaded.
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(location) => Redirect::to(&location).into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

/// Login page URL carrying `destination` as its callback.
#[must_use]
pub fn login_redirect(destination: &str) -> String {
    format!("/login?callbackUrl={}", urlencoding::encode(destination))
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Visitor(session) = Visitor::from_request_parts(parts, state)
            .await
            .map_err(AuthRejection::Failed)?;

        if let Some(user) = session.user().cloned() {
            return Ok(Self { user, session });
        }

        // Only pages can be returned to; a form post falls back to the default.
        if parts.method == Method::GET {
            // Nested routers see a stripped path; remember the full one.
            let uri = parts
                .extensions
                .get::<OriginalUri>()
                .map_or(&parts.uri, |original| &original.0);
            let destination = uri
                .path_and_query()
                .map_or_else(|| uri.path().to_string(), ToString::to_string);
            session
                .remember_destination(&destination)
                .await
                .map_err(|e| AuthRejection::Failed(e.into()))?;
            debug!(%destination, "Sign-in required");
            return Err(AuthRejection::RedirectToLogin(login_redirect(&destination)));
        }

        Err(AuthRejection::RedirectToLogin("/login".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::get,
    };
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;

    async fn protected(auth: RequireAuth) -> String {
        auth.user.username
    }

    async fn count(ShoppingCart(cart): ShoppingCart) -> String {
        cart.item_count().to_string()
    }

    #[test]
    fn test_login_redirect_encodes_destination() {
        assert_eq!(
            login_redirect("/dashboard/listings?page=2"),
            "/login?callbackUrl=%2Fdashboard%2Flistings%3Fpage%3D2"
        );
    }

    #[tokio::test]
    async fn test_signed_out_visitor_is_redirected() {
        let app = Router::new()
            .route("/dashboard", get(protected))
            .layer(SessionManagerLayer::new(MemoryStore::default()));

        let response = app
            .oneshot(Request::builder().uri("/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?callbackUrl=%2Fdashboard"
        );
    }

    #[tokio::test]
    async fn test_nested_route_remembers_full_path() {
        let app = Router::new()
            .nest("/dashboard", Router::new().route("/listings", get(protected)))
            .layer(SessionManagerLayer::new(MemoryStore::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard/listings?page=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?callbackUrl=%2Fdashboard%2Flistings%3Fpage%3D2"
        );
    }

    #[tokio::test]
    async fn test_missing_session_layer_is_a_server_error() {
        let app = Router::new().route("/cart/count", get(count));

        let response = app
            .oneshot(Request::builder().uri("/cart/count").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Authentication route handlers.
//!
//! Credentials are checked by the marketplace API. On success the identity
//! and token are kept in the visitor's session store and the visitor is
//! sent to the remembered destination.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use easytrade_core::{LoginInput, RegisterInput, UserSession};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::api::RegisterRequest;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{ShoppingCart, Visitor};
use crate::state::AppState;
use crate::stores::{
    CartStore, DEFAULT_DESTINATION, SessionStorage, SessionStore, is_site_relative,
};
use crate::views::Chrome;

/// Query parameters accepted by the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Logout form data.
#[derive(Debug, Deserialize)]
pub struct LogoutForm {
    #[serde(default)]
    pub current_path: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub chrome: Chrome,
    pub username: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub chrome: Chrome,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub error: Option<String>,
}

impl RegisterTemplate {
    fn with_input(chrome: Chrome, input: &RegisterInput, error: Option<String>) -> Self {
        Self {
            chrome,
            name: input.name.clone(),
            surname: input.surname.clone(),
            username: input.username.clone(),
            email: input.email.clone(),
            error,
        }
    }
}

fn login_failed(
    cart: &CartStore<SessionStorage>,
    session: &SessionStore<SessionStorage>,
    username: &str,
    error: String,
) -> Response {
    LoginTemplate {
        chrome: Chrome::new(cart, session, "/login"),
        username: username.to_string(),
        error: Some(error),
        notice: None,
    }
    .into_response()
}

/// Display login page.
///
/// A `callbackUrl` is remembered as the post-login destination. Visitors
/// who are already signed in are sent straight there.
#[instrument(skip(cart, session))]
pub async fn login_page(
    ShoppingCart(cart): ShoppingCart,
    Visitor(session): Visitor,
    Query(query): Query<LoginQuery>,
) -> Result<Response> {
    let callback = query.callback_url.as_deref().filter(|c| !c.is_empty());

    if session.is_authenticated() {
        let destination = callback
            .filter(|c| is_site_relative(c))
            .unwrap_or(DEFAULT_DESTINATION);
        return Ok(Redirect::to(destination).into_response());
    }

    if let Some(callback) = callback {
        if !session.remember_destination(callback).await? {
            warn!(%callback, "Ignoring off-site login callback");
        }
    }

    Ok(LoginTemplate {
        chrome: Chrome::new(&cart, &session, "/login"),
        username: String::new(),
        error: None,
        notice: None,
    }
    .into_response())
}

/// Handle login form submission.
#[instrument(skip(state, cart, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    ShoppingCart(cart): ShoppingCart,
    Visitor(mut session): Visitor,
    Form(form): Form<LoginInput>,
) -> Result<Response> {
    if let Err(message) = form.validate() {
        return Ok(login_failed(&cart, &session, &form.username, message.to_string()));
    }

    let identity = match state
        .marketplace()
        .login(form.username.trim(), &form.password)
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "Login failed");
            return Ok(login_failed(&cart, &session, &form.username, e.user_message()));
        }
    };

    let user = UserSession {
        user_id: identity.user_id,
        username: identity.username,
    };
    set_sentry_user(&user.user_id, Some(&user.username));
    info!(user_id = %user.user_id, "User logged in");

    let destination = session.login(user, identity.token).await?;
    Ok(Redirect::to(&destination).into_response())
}

/// Display register page.
#[instrument(skip(cart, session))]
pub async fn register_page(
    ShoppingCart(cart): ShoppingCart,
    Visitor(session): Visitor,
) -> RegisterTemplate {
    RegisterTemplate::with_input(
        Chrome::new(&cart, &session, "/register"),
        &RegisterInput::default(),
        None,
    )
}

/// Handle register form submission.
///
/// On success the login page is shown with the API's confirmation.
#[instrument(skip(state, cart, session, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    ShoppingCart(cart): ShoppingCart,
    Visitor(session): Visitor,
    Form(form): Form<RegisterInput>,
) -> Response {
    if let Err(message) = form.validate() {
        return RegisterTemplate::with_input(
            Chrome::new(&cart, &session, "/register"),
            &form,
            Some(message.to_string()),
        )
        .into_response();
    }

    let request = RegisterRequest {
        name: form.name.trim().to_string(),
        surname: form.surname.trim().to_string(),
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };

    match state.marketplace().register(&request).await {
        Ok(message) => {
            info!("User registered");
            LoginTemplate {
                chrome: Chrome::new(&cart, &session, "/login"),
                username: request.username,
                error: None,
                notice: Some(message),
            }
            .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Registration failed");
            RegisterTemplate::with_input(
                Chrome::new(&cart, &session, "/register"),
                &form,
                Some(e.user_message()),
            )
            .into_response()
        }
    }
}

/// Handle logout.
///
/// The cart is kept; only the identity and token are cleared.
#[instrument(skip(session))]
pub async fn logout(Visitor(mut session): Visitor, Form(form): Form<LogoutForm>) -> Result<Redirect> {
    let current = form
        .current_path
        .filter(|p| is_site_relative(p))
        .unwrap_or_else(|| "/".to_string());

    let destination = session.logout(&current).await?;
    clear_sentry_user();
    info!("User logged out");

    Ok(Redirect::to(destination.unwrap_or(current.as_str())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::{get, post},
    };
    use easytrade_core::UserId;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;

    async fn sign_in(Visitor(mut session): Visitor) -> Result<String> {
        let user = UserSession {
            user_id: UserId::from(12),
            username: "thabo".to_string(),
        };
        Ok(session.login(user, Some("jwt".to_string())).await?)
    }

    fn app() -> Router {
        Router::new()
            .route("/seed", get(sign_in))
            .route("/login", get(login_page))
            .route("/logout", post(logout))
            .layer(SessionManagerLayer::new(MemoryStore::default()))
    }

    /// Sign a visitor in and return their session cookie.
    async fn signed_in_cookie(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/seed").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        cookie.to_str().unwrap().split(';').next().unwrap().to_string()
    }

    async fn login_location(app: &Router, cookie: &str, callback: &str) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/login?callbackUrl={callback}"))
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        response.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_signed_in_visitor_follows_site_relative_callback() {
        let app = app();
        let cookie = signed_in_cookie(&app).await;
        assert_eq!(login_location(&app, &cookie, "%2Fproducts%2F7").await, "/products/7");
    }

    #[tokio::test]
    async fn test_signed_in_visitor_ignores_off_site_callbacks() {
        let app = app();
        let cookie = signed_in_cookie(&app).await;
        for callback in ["%2F%5Cevil.example", "%2F%2Fevil.example", "https%3A%2F%2Fevil.example"] {
            assert_eq!(login_location(&app, &cookie, callback).await, DEFAULT_DESTINATION);
        }
    }

    #[tokio::test]
    async fn test_logout_ignores_off_site_current_path() {
        let app = app();
        let cookie = signed_in_cookie(&app).await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("current_path=%2F%5Cevil.example"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }
}

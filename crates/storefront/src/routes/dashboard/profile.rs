//! Seller profile page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use easytrade_core::User;
use tracing::{instrument, warn};

use crate::filters;
use crate::middleware::{RequireAuth, ShoppingCart};
use crate::state::AppState;
use crate::views::Chrome;

const NOT_FOUND: &str = "Profile information not found.";
const LOAD_FAILED: &str = "Could not load your profile information.";

/// Profile fields as displayed.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub verified: bool,
    pub member_since: Option<String>,
}

impl From<User> for ProfileView {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            member_since: user.created_at.map(|at| at.format("%B %-d, %Y").to_string()),
            username: user.username,
            email: user.email,
            verified: user.verified,
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/profile.html")]
pub struct ProfileTemplate {
    pub chrome: Chrome,
    pub profile: Option<ProfileView>,
    pub error: Option<String>,
}

/// Display the signed-in seller's profile.
#[instrument(skip_all, fields(user_id = %auth.user.user_id))]
pub async fn show(
    State(state): State<AppState>,
    auth: RequireAuth,
    ShoppingCart(cart): ShoppingCart,
) -> ProfileTemplate {
    let result = state
        .marketplace()
        .get_user_profile(&auth.user.user_id, auth.session.token())
        .await;

    let (profile, error) = match result {
        Ok(Some(user)) => (Some(ProfileView::from(user)), None),
        Ok(None) => (None, Some(NOT_FOUND.to_string())),
        Err(e) => {
            warn!(error = %e, "Failed to load profile");
            let message = e.user_message();
            let message = if message.trim().is_empty() {
                LOAD_FAILED.to_string()
            } else {
                message
            };
            (None, Some(message))
        }
    };

    ProfileTemplate {
        chrome: Chrome::new(&cart, &auth.session, "/dashboard/customers"),
        profile,
        error,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use easytrade_core::UserId;

    use super::*;

    #[test]
    fn test_profile_view_formats_join_date() {
        let user = User {
            id: UserId::from(12),
            name: "Thabo".to_string(),
            surname: "Nkosi".to_string(),
            username: "thabo".to_string(),
            email: "thabo@example.com".to_string(),
            verified: false,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single(),
        };

        let view = ProfileView::from(user);
        assert_eq!(view.full_name, "Thabo Nkosi");
        assert_eq!(view.member_since.as_deref(), Some("March 1, 2024"));
    }
}

//! Listing management: table, create/edit forms, delete.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use easytrade_core::{ActionOutcome, Field, ListingInput, ListingMode, Pagination, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAuth, ShoppingCart};
use crate::routes::ListQuery;
use crate::routes::products::ProductNotFoundTemplate;
use crate::services::listings;
use crate::state::AppState;
use crate::views::{Chrome, PaginationView, ProductView, listing_path, product_views};

const LISTINGS_PATH: &str = "/dashboard/listings";

/// Listings table template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/listings.html")]
pub struct ListingsTemplate {
    pub chrome: Chrome,
    pub query: String,
    pub products: Vec<ProductView>,
    pub pagination: PaginationView,
    pub outcome: Option<ActionOutcome>,
}

/// Create and edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/listing_form.html")]
pub struct ListingFormTemplate {
    pub chrome: Chrome,
    pub heading: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    /// `create` or `update`, echoed to the inline validator.
    pub mode: &'static str,
    pub name: String,
    pub description: String,
    pub price: String,
    pub errors: FormErrors,
    pub outcome: Option<ActionOutcome>,
}

/// Per-field messages, joined for display.
#[derive(Debug, Default)]
pub struct FormErrors {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
}

impl From<&ActionOutcome> for FormErrors {
    fn from(outcome: &ActionOutcome) -> Self {
        let joined = |field| {
            let messages = outcome.errors.get(field);
            (!messages.is_empty()).then(|| messages.join(", "))
        };
        Self {
            name: joined(Field::Name),
            description: joined(Field::Description),
            price: joined(Field::Price),
        }
    }
}

/// Inline validation fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/field_error.html")]
pub struct FieldErrorTemplate {
    pub field: &'static str,
    pub message: Option<String>,
}

/// Inline validation request: the whole form plus the field to check.
#[derive(Debug, Deserialize)]
pub struct ValidateForm {
    pub field: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(flatten)]
    pub input: ListingInput,
}

impl ListingFormTemplate {
    fn create(chrome: Chrome, input: &ListingInput, outcome: Option<ActionOutcome>) -> Self {
        Self {
            chrome,
            heading: "List a New Product",
            action: format!("{LISTINGS_PATH}/create"),
            submit_label: "Create Listing",
            mode: "create",
            name: input.name.clone(),
            description: input.description.clone().unwrap_or_default(),
            price: input.price.clone().unwrap_or_default(),
            errors: outcome.as_ref().map(FormErrors::from).unwrap_or_default(),
            outcome,
        }
    }

    fn edit(
        chrome: Chrome,
        id: &ProductId,
        input: &ListingInput,
        outcome: Option<ActionOutcome>,
    ) -> Self {
        Self {
            heading: "Edit Listing",
            action: format!("{}/edit", listing_path(id)),
            submit_label: "Save Changes",
            mode: "update",
            ..Self::create(chrome, input, outcome)
        }
    }
}

async fn render_table(
    state: &AppState,
    chrome: Chrome,
    query: &ListQuery,
    outcome: Option<ActionOutcome>,
) -> ListingsTemplate {
    let page = query.page();
    let results = state
        .marketplace()
        .list_products(query.search(), page, state.config().catalog.page_size)
        .await;

    ListingsTemplate {
        chrome,
        query: query.search().to_string(),
        products: product_views(&results.items),
        pagination: PaginationView::new(
            Pagination::new(page, results.total_pages),
            LISTINGS_PATH,
            query.search(),
        ),
        outcome,
    }
}

/// Display the listings table.
#[instrument(skip(state, auth, cart))]
pub async fn index(
    State(state): State<AppState>,
    auth: RequireAuth,
    ShoppingCart(cart): ShoppingCart,
    Query(query): Query<ListQuery>,
) -> ListingsTemplate {
    let chrome = Chrome::new(&cart, &auth.session, LISTINGS_PATH);
    render_table(&state, chrome, &query, None).await
}

/// Display the create form.
#[instrument(skip_all)]
pub async fn create_page(auth: RequireAuth, ShoppingCart(cart): ShoppingCart) -> ListingFormTemplate {
    ListingFormTemplate::create(
        Chrome::new(&cart, &auth.session, format!("{LISTINGS_PATH}/create")),
        &ListingInput::default(),
        None,
    )
}

/// Create a listing and show the result in the form.
///
/// A successful create clears the form for the next listing.
#[instrument(skip_all, fields(seller = %auth.user.username))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    ShoppingCart(cart): ShoppingCart,
    Form(input): Form<ListingInput>,
) -> Response {
    let outcome = listings::create_listing(
        state.marketplace(),
        &auth.user.username,
        auth.session.token(),
        &input,
    )
    .await;

    let status = if outcome.success {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let shown = if outcome.success {
        ListingInput::default()
    } else {
        input
    };

    let chrome = Chrome::new(&cart, &auth.session, format!("{LISTINGS_PATH}/create"));
    (status, ListingFormTemplate::create(chrome, &shown, Some(outcome))).into_response()
}

/// Check one field of a listing form (HTMX fragment).
#[instrument(skip_all, fields(field = %form.field))]
pub async fn validate(Form(form): Form<ValidateForm>) -> Response {
    let Ok(field) = form.field.parse::<Field>() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let mode = match form.mode.as_deref() {
        Some("update") => ListingMode::Update,
        _ => ListingMode::Create,
    };

    let message = form
        .input
        .validate(mode)
        .err()
        .and_then(|errors| errors.first(field).map(String::from));

    FieldErrorTemplate {
        field: field.as_str(),
        message,
    }
    .into_response()
}

/// Display the edit form for a listing.
#[instrument(skip(state, auth, cart))]
pub async fn edit_page(
    State(state): State<AppState>,
    auth: RequireAuth,
    ShoppingCart(cart): ShoppingCart,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let chrome = Chrome::new(&cart, &auth.session, format!("{}/edit", listing_path(&id)));

    let Some(product) = state.marketplace().get_product(&id).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            ProductNotFoundTemplate {
                chrome,
                id: id.to_string(),
            },
        )
            .into_response());
    };

    let input = ListingInput {
        name: product.name.clone(),
        description: product.description.clone(),
        price: Some(product.price.to_string()),
    };
    Ok(ListingFormTemplate::edit(chrome, &id, &input, None).into_response())
}

/// Update a listing and show the result in the form.
#[instrument(skip(state, auth, cart, input))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    ShoppingCart(cart): ShoppingCart,
    Path(id): Path<String>,
    Form(input): Form<ListingInput>,
) -> Response {
    let id = ProductId::new(id);
    let outcome =
        listings::update_listing(state.marketplace(), &id, auth.session.token(), &input).await;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let chrome = Chrome::new(&cart, &auth.session, format!("{}/edit", listing_path(&id)));
    (status, ListingFormTemplate::edit(chrome, &id, &input, Some(outcome))).into_response()
}

/// Delete a listing, then show the table with the result.
#[instrument(skip(state, auth, cart))]
pub async fn delete(
    State(state): State<AppState>,
    auth: RequireAuth,
    ShoppingCart(cart): ShoppingCart,
    Path(id): Path<String>,
) -> Response {
    let id = ProductId::new(id);
    let outcome = listings::delete_listing(state.marketplace(), &id, auth.session.token()).await;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let chrome = Chrome::new(&cart, &auth.session, LISTINGS_PATH);
    let page = render_table(&state, chrome, &ListQuery::default(), Some(outcome)).await;
    (status, page).into_response()
}

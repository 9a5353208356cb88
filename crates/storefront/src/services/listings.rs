//! Seller listing write actions.
//!
//! Each action re-validates its input, calls the marketplace API and
//! revalidates the cached views that show the affected listing. Failures are
//! folded into the returned [`ActionOutcome`]; nothing is propagated.

use easytrade_core::{ActionOutcome, Field, ListingInput, ListingMode, ProductId};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, ListingPayload, MarketplaceClient, Revalidate};
use crate::error::add_breadcrumb;

/// Outcome for a failed API call, keeping any per-field messages the API
/// sent for fields the form knows about.
fn api_failure(err: &ApiError) -> ActionOutcome {
    let mut outcome = ActionOutcome::api_error(err.user_message());
    if let ApiError::Status { field_errors, .. } = err {
        for (name, message) in field_errors {
            if let Ok(field) = name.parse::<Field>() {
                outcome.errors.push(field, message.clone());
            }
        }
    }
    outcome
}

/// Create a listing owned by `seller`.
#[instrument(skip(client, token, input), fields(seller = %seller))]
pub async fn create_listing(
    client: &MarketplaceClient,
    seller: &str,
    token: Option<&SecretString>,
    input: &ListingInput,
) -> ActionOutcome {
    let draft = match input.validate(ListingMode::Create) {
        Ok(draft) => draft,
        Err(errors) => return ActionOutcome::validation(errors),
    };

    match client
        .create_product(&ListingPayload::create(&draft, seller), token)
        .await
    {
        Ok(product) => {
            info!(product_id = %product.id, "Listing created");
            add_breadcrumb("listings", "Created listing", Some(&[("product_id", product.id.as_str())]));
            client.revalidate(&[Revalidate::Catalog, Revalidate::Dashboard]);
            ActionOutcome::ok(format!("Product \"{}\" added successfully!", product.name))
        }
        Err(e) => {
            warn!(error = %e, "Failed to create listing");
            api_failure(&e)
        }
    }
}

/// Edit a listing. A blank price keeps the current one.
#[instrument(skip(client, token, input), fields(product_id = %id))]
pub async fn update_listing(
    client: &MarketplaceClient,
    id: &ProductId,
    token: Option<&SecretString>,
    input: &ListingInput,
) -> ActionOutcome {
    let draft = match input.validate(ListingMode::Update) {
        Ok(draft) => draft,
        Err(errors) => return ActionOutcome::validation(errors),
    };

    match client
        .update_product(id, &ListingPayload::update(&draft), token)
        .await
    {
        Ok(product) => {
            info!("Listing updated");
            add_breadcrumb("listings", "Updated listing", Some(&[("product_id", id.as_str())]));
            client.revalidate(&[
                Revalidate::Catalog,
                Revalidate::Product(id.clone()),
                Revalidate::Dashboard,
            ]);
            ActionOutcome::ok(format!("Product \"{}\" updated successfully!", product.name))
        }
        Err(e) => {
            warn!(error = %e, "Failed to update listing");
            api_failure(&e)
        }
    }
}

/// Delete a listing.
#[instrument(skip(client, token), fields(product_id = %id))]
pub async fn delete_listing(
    client: &MarketplaceClient,
    id: &ProductId,
    token: Option<&SecretString>,
) -> ActionOutcome {
    match client.delete_product(id, token).await {
        Ok(response) => {
            info!("Listing deleted");
            add_breadcrumb("listings", "Deleted listing", Some(&[("product_id", id.as_str())]));
            client.revalidate(&[
                Revalidate::Catalog,
                Revalidate::Product(id.clone()),
                Revalidate::Dashboard,
            ]);
            let message = response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("Product {id} deleted successfully."));
            ActionOutcome::ok(message)
        }
        Err(e) => {
            warn!(error = %e, "Failed to delete listing");
            api_failure(&e)
        }
    }
}

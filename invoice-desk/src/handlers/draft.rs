//! Draft edits. Typing returns only the preview; adding, removing and
//! blur-commits return the whole workspace because the form itself changes.

use super::app::{preview, workspace};
use crate::models::{DeskSession, ItemField};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CustomerForm {
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemUpdateForm {
    pub field: ItemField,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemCommitForm {
    pub field: ItemField,
}

#[derive(Debug, Deserialize)]
pub struct DiscountForm {
    #[serde(default)]
    pub discount_percentage: String,
}

/// Stale rows (a double-clicked remove, a blur after removal) leave the draft
/// alone and tell HTMX there is nothing to swap.
fn unknown_item(index: usize) -> Response {
    tracing::debug!(index, "Ignored edit for an item that no longer exists");
    StatusCode::NO_CONTENT.into_response()
}

pub async fn update_customer(
    State(state): State<AppState>,
    mut session: DeskSession,
    Form(form): Form<CustomerForm>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(name) = form.customer_name.as_deref() {
        session.draft.set_customer_name(name);
    }
    if let Some(mobile) = form.customer_mobile.as_deref() {
        session.draft.set_customer_mobile(mobile);
    }
    session.store_draft().await?;

    Ok(preview(&state, &session.draft).await)
}

pub async fn add_item(
    State(state): State<AppState>,
    mut session: DeskSession,
) -> Result<Response, AppError> {
    if !session.draft.add_item() {
        tracing::debug!(items = session.draft.items.len(), "Item limit reached");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    session.store_draft().await?;
    tracing::debug!(items = session.draft.items.len(), "Item added");

    Ok(workspace(&state, &session.draft, None)
        .await
        .into_response())
}

pub async fn update_item(
    State(state): State<AppState>,
    mut session: DeskSession,
    Path(index): Path<usize>,
    Form(form): Form<ItemUpdateForm>,
) -> Result<Response, AppError> {
    if !session.draft.update_item(index, form.field, &form.value) {
        return Ok(unknown_item(index));
    }
    session.store_draft().await?;

    Ok(preview(&state, &session.draft).await.into_response())
}

/// Blur on a numeric cell: an empty value becomes `0`. Nothing to redraw when
/// the cell already held a value.
pub async fn commit_item(
    State(state): State<AppState>,
    mut session: DeskSession,
    Path(index): Path<usize>,
    Form(form): Form<ItemCommitForm>,
) -> Result<Response, AppError> {
    if index >= session.draft.items.len() {
        return Ok(unknown_item(index));
    }
    if !session.draft.commit_item_field(index, form.field) {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    session.store_draft().await?;

    Ok(workspace(&state, &session.draft, None)
        .await
        .into_response())
}

pub async fn remove_item(
    State(state): State<AppState>,
    mut session: DeskSession,
    Path(index): Path<usize>,
) -> Result<Response, AppError> {
    if !session.draft.remove_item(index) {
        return Ok(unknown_item(index));
    }
    session.store_draft().await?;
    tracing::debug!(index, items = session.draft.items.len(), "Item removed");

    Ok(workspace(&state, &session.draft, None)
        .await
        .into_response())
}

pub async fn update_discount(
    State(state): State<AppState>,
    mut session: DeskSession,
    Form(form): Form<DiscountForm>,
) -> Result<impl IntoResponse, AppError> {
    session
        .draft
        .set_discount_percentage(&form.discount_percentage);
    session.store_draft().await?;

    Ok(preview(&state, &session.draft).await)
}

pub async fn commit_discount(
    State(state): State<AppState>,
    mut session: DeskSession,
) -> Result<Response, AppError> {
    if !session.draft.commit_discount() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    session.store_draft().await?;

    Ok(workspace(&state, &session.draft, None)
        .await
        .into_response())
}

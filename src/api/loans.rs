//! Loan listings and renewal endpoints

use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::BookInstanceView,
        pagination::{PageQuery, Paginated},
    },
    services::{
        renewal::{RenewBookForm, RenewalOutcome, RenewalRequest},
        today,
    },
    AppState,
};

use super::{object_id, AuthenticatedUser, JsonOrForm, MaybeUser};

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/catalog/mybooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Borrowed copies, soonest due first", body = crate::models::pagination::BookInstancePage),
        (status = 302, description = "Login required"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn my_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<BookInstanceView>>> {
    let page = state.services.loans.my_borrowed(&claims, query.page).await?;
    Ok(Json(page))
}

/// Every copy on loan (librarians)
#[utoipa::path(
    get,
    path = "/catalog/borrowed/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Borrowed copies with borrowers", body = crate::models::pagination::BookInstancePage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Permission catalog.can_mark_returned required"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<BookInstanceView>>> {
    let page = state.services.loans.all_borrowed(&claims, query.page).await?;
    Ok(Json(page))
}

fn origin(uri: &OriginalUri) -> String {
    uri.0
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.0.path().to_string())
}

fn into_response(outcome: RenewalOutcome) -> Response {
    match outcome {
        RenewalOutcome::Form(page) => Json(page).into_response(),
        RenewalOutcome::Renewed { redirect_to, .. } => Redirect::to(redirect_to).into_response(),
    }
}

/// Renewal form for a copy, proposing a date three weeks ahead
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Copy ID")),
    responses(
        (status = 200, description = "Renewal form", body = crate::services::renewal::RenewalPage),
        (status = 302, description = "Login required"),
        (status = 403, description = "Permission catalog.can_mark_returned required"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn renew_form(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
    uri: OriginalUri,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id: Uuid = object_id(&id, "Book instance")?;

    let outcome = state
        .services
        .loans
        .renew(claims.as_ref(), id, &origin(&uri), RenewalRequest::Show, today())
        .await?;
    Ok(into_response(outcome))
}

/// Submit a new due date for a copy
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Copy ID")),
    request_body = RenewBookForm,
    responses(
        (status = 200, description = "Date rejected; form with errors", body = crate::services::renewal::RenewalPage),
        (status = 302, description = "Login required"),
        (status = 303, description = "Renewed; redirect to /catalog/borrowed/"),
        (status = 403, description = "Permission catalog.can_mark_returned required"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    MaybeUser(claims): MaybeUser,
    uri: OriginalUri,
    Path(id): Path<String>,
    body: Result<JsonOrForm<RenewBookForm>, AppError>,
) -> AppResult<Response> {
    let id: Uuid = object_id(&id, "Book instance")?;

    let form = submitted_form(body);

    let outcome = state
        .services
        .loans
        .renew(claims.as_ref(), id, &origin(&uri), RenewalRequest::Submit(form), today())
        .await?;
    Ok(into_response(outcome))
}

/// An unreadable body is an empty submission
fn submitted_form(body: Result<JsonOrForm<RenewBookForm>, AppError>) -> RenewBookForm {
    body.map(|JsonOrForm(form)| form).unwrap_or_else(|e| {
        tracing::debug!("Unreadable renewal body: {}", e);
        RenewBookForm::default()
    })
}

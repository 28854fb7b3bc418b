//! Circulation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{CheckoutRequest, Transaction, TransactionDetails},
};

/// Return response with the closed transaction
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ReturnResponse {
    pub message: String,
    pub transaction: Transaction,
}

/// Check a book out to a member
#[utoipa::path(
    post,
    path = "/transactions/checkout",
    tag = "transactions",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Book checked out, due in 14 days", body = Transaction),
        (status = 400, description = "Book not available or already borrowed by this member", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn checkout_book(
    State(state): State<crate::AppState>,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<Transaction>> {
    let transaction = state.services.circulation.checkout(request).await?;
    Ok(Json(transaction))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/transactions/{id}/return",
    tag = "transactions",
    params(("id" = String, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 400, description = "Book is not currently borrowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ReturnResponse>> {
    let transaction = state.services.circulation.return_book(&id).await?;
    Ok(Json(ReturnResponse {
        message: "Book returned successfully".to_string(),
        transaction,
    }))
}

/// List transactions with book and member details, newest first.
///
/// Borrowed transactions past their due date are marked overdue.
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    responses(
        (status = 200, description = "Transaction log", body = Vec<TransactionDetails>)
    )
)]
pub async fn list_transactions(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let transactions = state.services.circulation.list_transactions().await?;
    Ok(Json(transactions))
}

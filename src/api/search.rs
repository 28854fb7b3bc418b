//! Search endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{Book, BookQuery, Member, MemberQuery},
};

/// Search books by title, author or ISBN
#[utoipa::path(
    get,
    path = "/search/books",
    tag = "search",
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>)
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.search.search_books(&query).await?;
    Ok(Json(books))
}

/// Search members by name, student ID or email
#[utoipa::path(
    get,
    path = "/search/members",
    tag = "search",
    params(MemberQuery),
    responses(
        (status = 200, description = "Matching members", body = Vec<Member>)
    )
)]
pub async fn search_members(
    State(state): State<crate::AppState>,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<Vec<Member>>> {
    let members = state.services.search.search_members(&query).await?;
    Ok(Json(members))
}

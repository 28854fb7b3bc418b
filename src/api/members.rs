//! Member directory endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{Member, MemberInput, MessageResponse},
};

/// Register a member
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    request_body = MemberInput,
    responses(
        (status = 200, description = "Member created", body = Member),
        (status = 400, description = "Student ID already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_member(
    State(state): State<crate::AppState>,
    Json(member): Json<MemberInput>,
) -> AppResult<Json<Member>> {
    let created = state.services.members.create_member(member).await?;
    Ok(Json(created))
}

/// List members (at most 1000)
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    responses(
        (status = 200, description = "List of members", body = Vec<Member>)
    )
)]
pub async fn list_members(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Member>>> {
    let members = state.services.members.list_members().await?;
    Ok(Json(members))
}

/// Get member by ID
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    params(("id" = String, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member details", body = Member),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_member(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Member>> {
    let member = state.services.members.get_member(&id).await?;
    Ok(Json(member))
}

/// Update a member
#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "members",
    params(("id" = String, Path, description = "Member ID")),
    request_body = MemberInput,
    responses(
        (status = 200, description = "Member updated", body = Member),
        (status = 400, description = "Student ID already exists", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_member(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(member): Json<MemberInput>,
) -> AppResult<Json<Member>> {
    let updated = state.services.members.update_member(&id, member).await?;
    Ok(Json(updated))
}

/// Delete a member
#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "members",
    params(("id" = String, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member deleted", body = MessageResponse),
        (status = 400, description = "Member has borrowed books", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_member(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.members.delete_member(&id).await?;
    Ok(Json(MessageResponse::new("Member deleted successfully")))
}

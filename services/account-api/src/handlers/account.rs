//! Profile handlers for the authenticated user

use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;

use vidhub_types::PublicUser;

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::response::Envelope;
use crate::staging::stage_multipart;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

/// GET /api/v1/users/current-user
pub async fn current_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Envelope<PublicUser>> {
    let user = state.accounts.current_user(auth_user.id()).await?;
    Ok(Envelope::ok(user, "User fetched successfully"))
}

/// PATCH /api/v1/users/update-account
pub async fn update_account(
    State(state): State<AppState>,
    auth_user: AuthUser,
    body: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> ApiResult<Envelope<PublicUser>> {
    let Json(req) = body?;

    let user = state
        .accounts
        .update_account_details(auth_user.id(), &req.full_name, &req.email)
        .await?;

    Ok(Envelope::ok(user, "Account details updated successfully"))
}

/// PATCH /api/v1/users/avatar
pub async fn update_avatar(
    State(state): State<AppState>,
    auth_user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Envelope<PublicUser>> {
    let mut form = stage_multipart(multipart?, &state.config.upload_dir).await?;
    let staged = form.take_file("avatar");
    form.discard().await;

    let user = state.accounts.update_avatar(auth_user.id(), staged).await?;
    Ok(Envelope::ok(user, "Avatar image updated successfully"))
}

/// PATCH /api/v1/users/cover-image
pub async fn update_cover_image(
    State(state): State<AppState>,
    auth_user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Envelope<PublicUser>> {
    let mut form = stage_multipart(multipart?, &state.config.upload_dir).await?;
    let staged = form.take_file("coverImage");
    form.discard().await;

    let user = state
        .accounts
        .update_cover_image(auth_user.id(), staged)
        .await?;
    Ok(Envelope::ok(user, "Cover image updated successfully"))
}

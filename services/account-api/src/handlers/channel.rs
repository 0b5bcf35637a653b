//! Channel profile handler

use axum::extract::{Path, State};

use vidhub_types::ChannelProfile;

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::response::Envelope;
use crate::state::AppState;

/// GET /api/v1/users/c/{username}
pub async fn channel_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(username): Path<String>,
) -> ApiResult<Envelope<ChannelProfile>> {
    let profile = state
        .accounts
        .channel_profile(&username, auth_user.id())
        .await?;

    Ok(Envelope::ok(profile, "User channel fetched successfully"))
}

use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use litfass_common::model::{
    Id,
    follow::{FollowAction, FollowEntry},
    user::UserMarker,
};
use litfass_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(toggle_follow)
        .typed_get(get_followers)
        .typed_get(get_following)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/follow", rejection(ServerError))]
struct ToggleFollowPath {
    id: Id<UserMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct FollowResponse {
    user_id: Id<UserMarker>,
    action: FollowAction,
}

async fn toggle_follow(
    ToggleFollowPath { id }: ToggleFollowPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<FollowResponse>> {
    let target = db
        .fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    let action = db.flip_follow(user.user_id(), target.id).await?;

    Ok(Json(FollowResponse {
        user_id: target.id,
        action,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/followers", rejection(ServerError))]
struct FollowersPath();

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct FollowersResponse {
    followers: Vec<FollowEntry>,
}

async fn get_followers(
    FollowersPath(): FollowersPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<FollowersResponse>> {
    let followers = db.followers(user.user_id()).await?;

    Ok(Json(FollowersResponse { followers }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/following", rejection(ServerError))]
struct FollowingPath();

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct FollowingResponse {
    following: Vec<FollowEntry>,
}

async fn get_following(
    FollowingPath(): FollowingPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<FollowingResponse>> {
    let following = db.following(user.user_id()).await?;

    Ok(Json(FollowingResponse { following }))
}

use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json, overlay,
};
use axum::extract::{Query, State};
use axum_extra::routing::{RouterExt, TypedPath};
use litfass_common::{
    feed::FeedPost,
    model::{
        Id,
        user::{UpsertUser, UserMarker, UserSummary},
    },
    page::{PageNumber, Pagination},
};
use litfass_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_put(upsert_user)
        .typed_get(get_user)
        .typed_get(get_user_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}", rejection(ServerError))]
struct UserPath {
    id: Id<UserMarker>,
}

/// Ingestion point for the external identity system: it pushes display
/// attributes here whenever a profile is created or changed.
async fn upsert_user(
    UserPath { id }: UserPath,
    State(db): State<Arc<DbClient>>,
    Json(user): Json<UpsertUser>,
) -> Result<Json<UserSummary>> {
    let user = db.upsert_user(id, &user).await?;

    Ok(Json(user))
}

async fn get_user(
    UserPath { id }: UserPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<UserSummary>> {
    let user = db
        .fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Json(user))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/posts", rejection(ServerError))]
struct UserPostsPath {
    id: Id<UserMarker>,
}

#[derive(Deserialize)]
struct UserPostsQuery {
    #[serde(default)]
    page: PageNumber,
}

#[derive(Debug, Serialize)]
struct UserPostsResponse {
    user: UserSummary,
    is_own_profile: bool,
    is_following: bool,
    posts: Vec<FeedPost>,
    pagination: Pagination,
}

async fn get_user_posts(
    UserPostsPath { id }: UserPostsPath,
    State(db): State<Arc<DbClient>>,
    viewer: AuthenticatedUser,
    Query(query): Query<UserPostsQuery>,
) -> Result<Json<UserPostsResponse>> {
    let user = db
        .fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    let is_following = db.is_following(viewer.user_id(), id).await?;
    let (posts, pagination) = db.posts_by_author(id, query.page).await?;
    let posts = overlay::attach_engagement(&db, viewer.user_id(), posts).await?;

    Ok(Json(UserPostsResponse {
        is_own_profile: user.id == viewer.user_id(),
        is_following,
        user,
        posts,
        pagination,
    }))
}

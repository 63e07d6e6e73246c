use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json, overlay,
};
use axum::extract::{Query, State};
use axum_extra::routing::{RouterExt, TypedPath};
use litfass_common::{
    feed::FeedPost,
    model::{
        Id, ModelValidationError,
        post::{MediaKind, NewMediaItem, NewPost, Post, PostMarker, normalize_media},
    },
    page::{PageNumber, Pagination},
};
use litfass_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_delete(delete_post)
        .typed_get(get_public_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct CreatePostPath();

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct CreatePostRequest {
    #[serde(flatten)]
    post: NewPost,
    media: Vec<NewMediaItem>,
}

async fn create_post(
    CreatePostPath(): CreatePostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Post>> {
    let media = normalize_media(request.media).map_err(ModelValidationError::from)?;

    let post = db
        .create_post(user.user_id(), &request.post, &media)
        .await?
        .ok_or(ServerError::UserByIdNotFound(user.user_id()))?;

    Ok(Json(post))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<FeedPost>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let viewer = user.user_id();
    let likes_count = db.like_count(id).await?;
    let comments_count = db.comment_count(id).await?;
    let has_liked = db.has_liked(id, viewer).await?;
    let has_saved = db.has_saved(id, viewer).await?;

    Ok(Json(FeedPost {
        likes_count,
        comments_count,
        has_liked,
        has_saved,
        is_own_post: post.author.id == viewer,
        post,
    }))
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct DeletePostResponse {
    post_id: Id<PostMarker>,
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<DeletePostResponse>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if post.author.id != user.user_id() {
        return Err(ServerError::PostNotDeletable);
    }

    // Media, likes, comments and saves cascade with the post.
    if !db.delete_post(id).await? {
        return Err(ServerError::PostByIdNotFound(id));
    }

    Ok(Json(DeletePostResponse { post_id: id }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/public", rejection(ServerError))]
struct PublicPostsPath();

#[derive(Deserialize)]
struct PublicPostsQuery {
    kind: Option<MediaKind>,
    #[serde(default)]
    page: PageNumber,
}

#[derive(Debug, Serialize)]
struct PublicPostsResponse {
    posts: Vec<FeedPost>,
    pagination: Pagination,
}

/// Public posts, optionally narrowed to those carrying media of one kind.
async fn get_public_posts(
    PublicPostsPath(): PublicPostsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Query(query): Query<PublicPostsQuery>,
) -> Result<Json<PublicPostsResponse>> {
    let (posts, pagination) = db.public_posts(query.kind, query.page).await?;
    let posts = overlay::attach_engagement(&db, user.user_id(), posts).await?;

    Ok(Json(PublicPostsResponse { posts, pagination }))
}

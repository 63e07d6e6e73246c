use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json, overlay,
};
use axum::extract::{Query, State};
use axum_extra::routing::{RouterExt, TypedPath};
use litfass_common::{
    feed::FeedPost,
    model::{
        Id,
        engagement::{Comment, CommentMarker, CommentText},
        post::PostMarker,
    },
    page::{PageNumber, Pagination},
};
use litfass_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::UtcDateTime;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(toggle_like)
        .typed_post(toggle_save)
        .typed_post(create_comment)
        .typed_get(get_comments)
        .typed_delete(delete_comment)
        .typed_get(get_saved_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/like", rejection(ServerError))]
struct LikePath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct LikeResponse {
    post_id: Id<PostMarker>,
    liked: bool,
    likes_count: i64,
}

async fn toggle_like(
    LikePath { id }: LikePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<LikeResponse>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if !post.allow_likes {
        return Err(ServerError::LikesDisabled(id));
    }

    let toggle = db.flip_like(id, user.user_id()).await?;

    Ok(Json(LikeResponse {
        post_id: id,
        liked: toggle.liked,
        likes_count: toggle.likes_count,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/save", rejection(ServerError))]
struct SavePath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct SaveResponse {
    post_id: Id<PostMarker>,
    saved: bool,
}

async fn toggle_save(
    SavePath { id }: SavePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<SaveResponse>> {
    db.fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let toggle = db.flip_save(id, user.user_id()).await?;

    Ok(Json(SaveResponse {
        post_id: id,
        saved: toggle.saved,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comments", rejection(ServerError))]
struct CommentsPath {
    id: Id<PostMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct CreateCommentRequest {
    text: CommentText,
}

async fn create_comment(
    CommentsPath { id }: CommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<Comment>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if !post.allow_comments {
        return Err(ServerError::CommentsDisabled(id));
    }

    let comment = db
        .add_comment(id, user.user_id(), &request.text)
        .await?
        .ok_or(ServerError::UserByIdNotFound(user.user_id()))?;

    Ok(Json(comment))
}

#[derive(Deserialize)]
struct CommentsQuery {
    #[serde(default)]
    page: PageNumber,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct CommentEntry {
    #[serde(flatten)]
    comment: Comment,
    is_own_comment: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct CommentsResponse {
    post_id: Id<PostMarker>,
    comments: Vec<CommentEntry>,
    pagination: Pagination,
}

async fn get_comments(
    CommentsPath { id }: CommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<CommentsResponse>> {
    db.fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let (comments, pagination) = db.comments(id, query.page).await?;
    let comments = comments
        .into_iter()
        .map(|comment| CommentEntry {
            is_own_comment: comment.author.id == user.user_id(),
            comment,
        })
        .collect();

    Ok(Json(CommentsResponse {
        post_id: id,
        comments,
        pagination,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{id}", rejection(ServerError))]
struct CommentPath {
    id: Id<CommentMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct DeleteCommentResponse {
    comment_id: Id<CommentMarker>,
}

/// A comment may be removed by its author or by the author of the post it
/// sits on.
async fn delete_comment(
    CommentPath { id }: CommentPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<DeleteCommentResponse>> {
    let comment = db
        .fetch_comment(id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;
    let post = db
        .fetch_post(comment.post_id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;

    let requester = user.user_id();
    if comment.author.id != requester && post.author.id != requester {
        return Err(ServerError::CommentNotDeletable);
    }

    if !db.delete_comment(id).await? {
        return Err(ServerError::CommentByIdNotFound(id));
    }

    Ok(Json(DeleteCommentResponse { comment_id: id }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/saved", rejection(ServerError))]
struct SavedPostsPath();

#[derive(Deserialize)]
struct SavedPostsQuery {
    #[serde(default)]
    page: PageNumber,
}

#[derive(Debug, Serialize)]
struct SavedPostEntry {
    #[serde(flatten)]
    post: FeedPost,
    saved_at: UtcDateTime,
}

#[derive(Debug, Serialize)]
struct SavedPostsResponse {
    saved_posts: Vec<SavedPostEntry>,
    pagination: Pagination,
}

async fn get_saved_posts(
    SavedPostsPath(): SavedPostsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Query(query): Query<SavedPostsQuery>,
) -> Result<Json<SavedPostsResponse>> {
    let (entries, pagination) = db.saved_posts(user.user_id(), query.page).await?;

    let (posts, saved_ats): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
    let posts = overlay::attach_engagement(&db, user.user_id(), posts).await?;

    let saved_posts = posts
        .into_iter()
        .zip(saved_ats)
        .map(|(post, saved_at)| SavedPostEntry { post, saved_at })
        .collect();

    Ok(Json(SavedPostsResponse {
        saved_posts,
        pagination,
    }))
}

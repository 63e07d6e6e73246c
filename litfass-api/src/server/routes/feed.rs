use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json, overlay,
};
use axum::extract::{Query, State};
use axum_extra::routing::{RouterExt, TypedPath};
use litfass_common::{
    feed::{FALLBACK_POOL_SIZE, FeedPage, assemble_post_feed},
    page::PageNumber,
};
use litfass_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_feed)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/feed", rejection(ServerError))]
struct FeedPath();

#[derive(Deserialize)]
struct FeedQuery {
    #[serde(default)]
    page: PageNumber,
}

/// Assembles the randomized post feed: public posts from followed authors
/// (or a bounded random sample for viewers who follow nobody), shuffled,
/// with the viewer's latest post pinned on top of page 1.
async fn get_feed(
    FeedPath(): FeedPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedPage>> {
    let viewer = user.user_id();

    let following = db.following_ids(viewer).await?;
    let pool = if following.is_empty() {
        db.random_public_posts(viewer, FALLBACK_POOL_SIZE).await?
    } else {
        db.public_posts_by_authors(&following).await?
    };
    let own_latest = db.latest_post_by_author(viewer).await?;

    let (page_posts, pagination) =
        assemble_post_feed(pool, own_latest, query.page, &mut rand::rng());
    let posts = overlay::attach_engagement(&db, viewer, page_posts).await?;

    Ok(Json(FeedPage { posts, pagination }))
}

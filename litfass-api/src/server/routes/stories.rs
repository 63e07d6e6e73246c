use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, json::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use litfass_common::{
    feed::{AuthorStories, group_story_feed},
    model::{
        Id,
        post::MediaKind,
        story::{NewStory, Story, StoryMarker},
    },
};
use litfass_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::UtcDateTime;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_story)
        .typed_get(get_my_stories)
        .typed_get(get_story_feed)
        .typed_post(view_story)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/stories", rejection(ServerError))]
struct CreateStoryPath();

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct CreateStoryResponse {
    story_id: Id<StoryMarker>,
    expires_at: UtcDateTime,
}

async fn create_story(
    CreateStoryPath(): CreateStoryPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(request): Json<NewStory>,
) -> Result<Json<CreateStoryResponse>> {
    let story = db
        .create_story(user.user_id(), &request)
        .await?
        .ok_or(ServerError::UserByIdNotFound(user.user_id()))?;

    Ok(Json(CreateStoryResponse {
        story_id: story.id,
        expires_at: story.expires_at(),
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/stories/mine", rejection(ServerError))]
struct MyStoriesPath();

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct MyStory {
    id: Id<StoryMarker>,
    content: Option<String>,
    media_key: String,
    media_kind: MediaKind,
    created_at: UtcDateTime,
    expires_at: UtcDateTime,
    is_expired: bool,
    view_count: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct MyStoriesResponse {
    stories: Vec<MyStory>,
}

/// The viewer's stories from the last 24 hours. A story whose own duration
/// already ran out still shows up here, flagged expired.
async fn get_my_stories(
    MyStoriesPath(): MyStoriesPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<MyStoriesResponse>> {
    let now = UtcDateTime::now();

    let mut stories = Vec::new();
    for story in db.stories_by_author(user.user_id()).await? {
        let view_count = db.story_view_count(story.id).await?;
        stories.push(MyStory {
            id: story.id,
            expires_at: story.expires_at(),
            is_expired: story.is_expired(now),
            content: story.content,
            media_key: story.media_key,
            media_kind: story.media_kind,
            created_at: story.created_at,
            view_count,
        });
    }

    Ok(Json(MyStoriesResponse { stories }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/stories/feed", rejection(ServerError))]
struct StoryFeedPath();

#[derive(Clone, Debug, Serialize)]
struct StoryFeedResponse {
    author_stories: Vec<AuthorStories>,
}

/// Own stories first, then public window-fresh stories from followed
/// authors, grouped by author with the per-viewer seen flag attached.
async fn get_story_feed(
    StoryFeedPath(): StoryFeedPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<StoryFeedResponse>> {
    let viewer = user.user_id();

    let mut pool = db.stories_by_author(viewer).await?;
    let following = db.following_ids(viewer).await?;
    pool.extend(db.public_stories_by_authors(&following).await?);

    let mut stories: Vec<(Story, bool)> = Vec::with_capacity(pool.len());
    for story in pool {
        let viewed = db.has_viewed(story.id, viewer).await?;
        stories.push((story, viewed));
    }

    Ok(Json(StoryFeedResponse {
        author_stories: group_story_feed(stories, viewer),
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/stories/{id}/view", rejection(ServerError))]
struct ViewStoryPath {
    id: Id<StoryMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct ViewStoryResponse {
    story_id: Id<StoryMarker>,
    created: bool,
}

/// Gated view record: the story must exist, must not be past its own
/// expiry, and private stories are only viewable by their author. Recording
/// is idempotent per viewer.
async fn view_story(
    ViewStoryPath { id }: ViewStoryPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<ViewStoryResponse>> {
    let story = db
        .fetch_story(id)
        .await?
        .ok_or(ServerError::StoryByIdNotFound(id))?;

    if story.is_expired(UtcDateTime::now()) {
        return Err(ServerError::StoryExpired(id));
    }
    if !story.is_public && story.author.id != user.user_id() {
        return Err(ServerError::PrivateStory(id));
    }

    let recorded = db.record_story_view(id, user.user_id()).await?;

    Ok(Json(ViewStoryResponse {
        story_id: id,
        created: recorded.created,
    }))
}

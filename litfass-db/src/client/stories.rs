use crate::{
    client::{DbClient, Result},
    record::StoryRecord,
};
use litfass_common::model::{
    Id,
    story::{NewStory, Story, StoryMarker},
    user::UserMarker,
};
use sqlx::{query_as, query_scalar};
use time::PrimitiveDateTime;
use uuid::Uuid;

/// Story row joined with its author, aliased to match [`StoryRecord`].
const STORY_SELECT: &str = "
    SELECT
        stories.story_id,
        stories.content,
        stories.media_key,
        stories.media_kind,
        stories.duration_hours,
        stories.is_public,
        stories.created_at,
        users.user_id AS author_id,
        users.username AS author_username,
        users.display_name AS author_display_name,
        users.avatar_url AS author_avatar_url
    FROM
        stories JOIN users ON users.user_id = stories.author_id
";

/// Listings only reach back this far, regardless of per-story durations
/// (see `STORY_LISTING_WINDOW` in the model).
const LISTING_WINDOW_SQL: &str = "stories.created_at >= (now() AT TIME ZONE 'utc') - interval '24 hours'";

impl DbClient {
    /// Returns `None` when the author is unknown to the identity mirror.
    pub async fn create_story(
        &self,
        author_id: Id<UserMarker>,
        story: &NewStory,
    ) -> Result<Option<Story>> {
        let Some(author) = self.fetch_user(author_id).await? else {
            return Ok(None);
        };

        let story_id = Id::<StoryMarker>::random();
        let created_at = query_scalar::<_, PrimitiveDateTime>(
            "
            INSERT INTO stories
                (story_id, author_id, content, media_key, media_kind, duration_hours, is_public)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7)
            RETURNING stories.created_at
            ",
        )
        .bind(story_id.uuid())
        .bind(author_id.uuid())
        .bind(story.content.as_deref())
        .bind(&story.media_key)
        .bind(story.media_kind.as_str())
        .bind(story.duration.hours())
        .bind(story.is_public)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(Story {
            id: story_id,
            author,
            content: story.content.clone(),
            media_key: story.media_key.clone(),
            media_kind: story.media_kind,
            duration: story.duration,
            is_public: story.is_public,
            created_at: created_at.as_utc(),
        }))
    }

    pub async fn fetch_story(&self, story_id: Id<StoryMarker>) -> Result<Option<Story>> {
        let record =
            query_as::<_, StoryRecord>(&format!("{STORY_SELECT} WHERE stories.story_id = $1"))
                .bind(story_id.uuid())
                .fetch_optional(&self.pool)
                .await?;

        let story = record.map(Story::try_from).transpose()?;
        Ok(story)
    }

    /// The author's own stories inside the listing window, newest first.
    /// Individually expired stories still appear here when their duration is
    /// shorter than the window; expiry is the viewer gate, not the listing
    /// gate.
    pub async fn stories_by_author(&self, author_id: Id<UserMarker>) -> Result<Vec<Story>> {
        let records = query_as::<_, StoryRecord>(&format!(
            "{STORY_SELECT}
            WHERE stories.author_id = $1 AND {LISTING_WINDOW_SQL}
            ORDER BY stories.created_at DESC"
        ))
        .bind(author_id.uuid())
        .fetch_all(&self.pool)
        .await?;

        let stories = records
            .into_iter()
            .map(Story::try_from)
            .collect::<Result<_, _>>()?;
        Ok(stories)
    }

    /// Public window-fresh stories from the given authors, newest first
    /// across all of them.
    pub async fn public_stories_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Story>> {
        let records = query_as::<_, StoryRecord>(&format!(
            "{STORY_SELECT}
            WHERE stories.author_id = ANY($1) AND stories.is_public AND {LISTING_WINDOW_SQL}
            ORDER BY stories.created_at DESC"
        ))
        .bind(author_ids)
        .fetch_all(&self.pool)
        .await?;

        let stories = records
            .into_iter()
            .map(Story::try_from)
            .collect::<Result<_, _>>()?;
        Ok(stories)
    }
}

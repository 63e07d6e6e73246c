use crate::{
    client::{DbClient, DbError, Result},
    record::{CommentRecord, SavedPostRecord},
};
use litfass_common::{
    model::{
        Id,
        engagement::{Comment, CommentMarker, CommentText, LikeToggle, RecordedView, SaveToggle},
        post::{Post, PostMarker},
        story::StoryMarker,
        user::UserMarker,
    },
    page::{PAGE_SIZE, PageNumber, Pagination},
};
use sqlx::{query, query_as, query_scalar};
use std::collections::{HashMap, HashSet};
use time::{PrimitiveDateTime, UtcDateTime};
use uuid::Uuid;

/// Comment row joined with its author, aliased to match [`CommentRecord`].
const COMMENT_SELECT: &str = "
    SELECT
        post_comments.comment_id,
        post_comments.post_id,
        post_comments.body,
        post_comments.created_at,
        post_comments.updated_at,
        users.user_id AS author_id,
        users.username AS author_username,
        users.display_name AS author_display_name,
        users.avatar_url AS author_avatar_url
    FROM
        post_comments JOIN users ON users.user_id = post_comments.author_id
";

impl DbClient {
    pub async fn has_liked(&self, post_id: Id<PostMarker>, user_id: Id<UserMarker>) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM post_likes
                WHERE post_likes.post_id = $1 AND post_likes.user_id = $2
            )
            ",
        )
        .bind(post_id.uuid())
        .bind(user_id.uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn like_count(&self, post_id: Id<PostMarker>) -> Result<i64> {
        let count =
            query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE post_likes.post_id = $1")
                .bind(post_id.uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn comment_count(&self, post_id: Id<PostMarker>) -> Result<i64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM post_comments WHERE post_comments.post_id = $1",
        )
        .bind(post_id.uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Flips the like membership; same race rules as `flip_follow`.
    pub async fn flip_like(
        &self,
        post_id: Id<PostMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<LikeToggle> {
        for _ in 0..2 {
            let inserted = query_scalar::<_, Uuid>(
                "
                INSERT INTO post_likes (post_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (post_id, user_id) DO NOTHING
                RETURNING post_likes.post_id
                ",
            )
            .bind(post_id.uuid())
            .bind(user_id.uuid())
            .fetch_optional(&self.pool)
            .await?;

            if inserted.is_some() {
                let likes_count = self.like_count(post_id).await?;
                return Ok(LikeToggle {
                    liked: true,
                    likes_count,
                });
            }

            let deleted = query(
                "DELETE FROM post_likes WHERE post_likes.post_id = $1 AND post_likes.user_id = $2",
            )
            .bind(post_id.uuid())
            .bind(user_id.uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

            if deleted > 0 {
                let likes_count = self.like_count(post_id).await?;
                return Ok(LikeToggle {
                    liked: false,
                    likes_count,
                });
            }
        }

        Err(DbError::ToggleContention)
    }

    pub async fn has_saved(&self, post_id: Id<PostMarker>, user_id: Id<UserMarker>) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM saved_posts
                WHERE saved_posts.post_id = $1 AND saved_posts.user_id = $2
            )
            ",
        )
        .bind(post_id.uuid())
        .bind(user_id.uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn flip_save(
        &self,
        post_id: Id<PostMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<SaveToggle> {
        for _ in 0..2 {
            let inserted = query_scalar::<_, Uuid>(
                "
                INSERT INTO saved_posts (post_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (post_id, user_id) DO NOTHING
                RETURNING saved_posts.post_id
                ",
            )
            .bind(post_id.uuid())
            .bind(user_id.uuid())
            .fetch_optional(&self.pool)
            .await?;

            if inserted.is_some() {
                return Ok(SaveToggle { saved: true });
            }

            let deleted = query(
                "DELETE FROM saved_posts WHERE saved_posts.post_id = $1 AND saved_posts.user_id = $2",
            )
            .bind(post_id.uuid())
            .bind(user_id.uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

            if deleted > 0 {
                return Ok(SaveToggle { saved: false });
            }
        }

        Err(DbError::ToggleContention)
    }

    /// The user's saved posts with the time each was saved, newest first.
    pub async fn saved_posts(
        &self,
        user_id: Id<UserMarker>,
        page: PageNumber,
    ) -> Result<(Vec<(Post, UtcDateTime)>, Pagination)> {
        let total = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM saved_posts WHERE saved_posts.user_id = $1",
        )
        .bind(user_id.uuid())
        .fetch_one(&self.pool)
        .await?;

        let records = query_as::<_, SavedPostRecord>(
            "
            SELECT
                posts.post_id,
                posts.caption,
                posts.location_name,
                posts.is_public,
                posts.allow_comments,
                posts.allow_likes,
                posts.created_at,
                posts.updated_at,
                users.user_id AS author_id,
                users.username AS author_username,
                users.display_name AS author_display_name,
                users.avatar_url AS author_avatar_url,
                saved_posts.created_at AS saved_at
            FROM
                saved_posts
                JOIN posts ON posts.post_id = saved_posts.post_id
                JOIN users ON users.user_id = posts.author_id
            WHERE
                saved_posts.user_id = $1
            ORDER BY
                saved_posts.created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id.uuid())
        .bind(i64::from(PAGE_SIZE))
        .bind(page.offset().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let mut saved_at_by_post = HashMap::new();
        let mut post_records = Vec::with_capacity(records.len());
        for record in records {
            saved_at_by_post.insert(record.post.post_id, record.saved_at.as_utc());
            post_records.push(record.post);
        }

        let posts = self.collect_posts(post_records).await?;
        let entries = posts
            .into_iter()
            .filter_map(|post| {
                let saved_at = saved_at_by_post.get(&post.id.uuid()).copied()?;
                Some((post, saved_at))
            })
            .collect();

        Ok((entries, Pagination::new(page, total.cast_unsigned())))
    }

    /// Returns `None` when the author is unknown to the identity mirror.
    pub async fn add_comment(
        &self,
        post_id: Id<PostMarker>,
        author_id: Id<UserMarker>,
        text: &CommentText,
    ) -> Result<Option<Comment>> {
        let Some(author) = self.fetch_user(author_id).await? else {
            return Ok(None);
        };

        let comment_id = Id::<CommentMarker>::random();
        let (created_at, updated_at) = query_as::<_, (PrimitiveDateTime, PrimitiveDateTime)>(
            "
            INSERT INTO post_comments (comment_id, post_id, author_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING post_comments.created_at, post_comments.updated_at
            ",
        )
        .bind(comment_id.uuid())
        .bind(post_id.uuid())
        .bind(author_id.uuid())
        .bind(text.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(Comment {
            id: comment_id,
            post_id,
            author,
            text: text.clone(),
            created_at: created_at.as_utc(),
            updated_at: updated_at.as_utc(),
        }))
    }

    pub async fn comments(
        &self,
        post_id: Id<PostMarker>,
        page: PageNumber,
    ) -> Result<(Vec<Comment>, Pagination)> {
        let total = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM post_comments WHERE post_comments.post_id = $1",
        )
        .bind(post_id.uuid())
        .fetch_one(&self.pool)
        .await?;

        let records = query_as::<_, CommentRecord>(&format!(
            "{COMMENT_SELECT}
            WHERE post_comments.post_id = $1
            ORDER BY post_comments.created_at DESC
            LIMIT $2 OFFSET $3"
        ))
        .bind(post_id.uuid())
        .bind(i64::from(PAGE_SIZE))
        .bind(page.offset().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok((comments, Pagination::new(page, total.cast_unsigned())))
    }

    pub async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>> {
        let record = query_as::<_, CommentRecord>(&format!(
            "{COMMENT_SELECT} WHERE post_comments.comment_id = $1"
        ))
        .bind(comment_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        let comment = record.map(Comment::try_from).transpose()?;
        Ok(comment)
    }

    pub async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        let affected = query("DELETE FROM post_comments WHERE post_comments.comment_id = $1")
            .bind(comment_id.uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    pub async fn has_viewed(
        &self,
        story_id: Id<StoryMarker>,
        viewer_id: Id<UserMarker>,
    ) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM story_views
                WHERE story_views.story_id = $1 AND story_views.viewer_id = $2
            )
            ",
        )
        .bind(story_id.uuid())
        .bind(viewer_id.uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Idempotent: the second record for the same pair reports
    /// `created: false` instead of erroring. Views only ever accumulate, so
    /// no delete arm and no retry is needed here.
    pub async fn record_story_view(
        &self,
        story_id: Id<StoryMarker>,
        viewer_id: Id<UserMarker>,
    ) -> Result<RecordedView> {
        let inserted = query_scalar::<_, Uuid>(
            "
            INSERT INTO story_views (story_id, viewer_id)
            VALUES ($1, $2)
            ON CONFLICT (story_id, viewer_id) DO NOTHING
            RETURNING story_views.story_id
            ",
        )
        .bind(story_id.uuid())
        .bind(viewer_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(RecordedView {
            created: inserted.is_some(),
        })
    }

    pub async fn story_view_count(&self, story_id: Id<StoryMarker>) -> Result<i64> {
        let count = query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM story_views WHERE story_views.story_id = $1",
        )
        .bind(story_id.uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn like_counts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        self.group_counts("post_likes", "post_id", post_ids).await
    }

    pub async fn comment_counts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        self.group_counts("post_comments", "post_id", post_ids).await
    }

    /// Which of the given posts the user has liked.
    pub async fn liked_post_ids(
        &self,
        user_id: Id<UserMarker>,
        post_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>> {
        self.membership_ids("post_likes", "post_id", "user_id", user_id.uuid(), post_ids)
            .await
    }

    /// Which of the given posts the user has saved.
    pub async fn saved_post_ids(
        &self,
        user_id: Id<UserMarker>,
        post_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>> {
        self.membership_ids("saved_posts", "post_id", "user_id", user_id.uuid(), post_ids)
            .await
    }

    async fn group_counts(
        &self,
        table: &str,
        key: &str,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, i64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = query_as::<_, (Uuid, i64)>(&format!(
            "SELECT {key}, COUNT(*) FROM {table} WHERE {key} = ANY($1) GROUP BY {key}"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn membership_ids(
        &self,
        table: &str,
        key: &str,
        member: &str,
        member_id: Uuid,
        ids: &[Uuid],
    ) -> Result<HashSet<Uuid>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = query_scalar::<_, Uuid>(&format!(
            "SELECT {key} FROM {table} WHERE {member} = $1 AND {key} = ANY($2)"
        ))
        .bind(member_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}

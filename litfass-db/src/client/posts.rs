use crate::{
    client::{DbClient, Result},
    record::{MediaRecord, PostRecord},
};
use litfass_common::{
    model::{
        Id,
        post::{MediaItem, MediaKind, NewMediaItem, NewPost, Post, PostMarker},
        user::UserMarker,
    },
    page::{PAGE_SIZE, PageNumber, Pagination},
};
use sqlx::{query, query_as, query_scalar};
use std::collections::HashMap;
use time::PrimitiveDateTime;
use uuid::Uuid;

/// Post row joined with its author, aliased to match [`PostRecord`].
const POST_SELECT: &str = "
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
        users.avatar_url AS author_avatar_url
    FROM
        posts JOIN users ON users.user_id = posts.author_id
";

fn order_media(items: &mut [MediaItem]) {
    items.sort_by(|a, b| {
        b.is_main
            .cmp(&a.is_main)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

impl DbClient {
    /// Persists the post and every media row in one transaction; a failure
    /// anywhere rolls the whole post back. Media is expected normalized
    /// (non-empty, exactly one main item).
    ///
    /// Returns `None` when the author is unknown to the identity mirror.
    pub async fn create_post(
        &self,
        author_id: Id<UserMarker>,
        post: &NewPost,
        media: &[NewMediaItem],
    ) -> Result<Option<Post>> {
        let Some(author) = self.fetch_user(author_id).await? else {
            return Ok(None);
        };

        let post_id = Id::<PostMarker>::random();
        let mut tx = self.pool.begin().await?;

        let (created_at, updated_at) = query_as::<_, (PrimitiveDateTime, PrimitiveDateTime)>(
            "
            INSERT INTO posts
                (post_id, author_id, caption, location_name, is_public, allow_comments, allow_likes)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7)
            RETURNING posts.created_at, posts.updated_at
            ",
        )
        .bind(post_id.uuid())
        .bind(author_id.uuid())
        .bind(post.caption.as_deref())
        .bind(post.location_name.as_deref())
        .bind(post.is_public)
        .bind(post.allow_comments)
        .bind(post.allow_likes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(media.len());
        for item in media {
            let (media_id, media_created_at) = query_as::<_, (Uuid, PrimitiveDateTime)>(
                "
                INSERT INTO post_media (media_id, post_id, storage_key, kind, is_main)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING post_media.media_id, post_media.created_at
                ",
            )
            .bind(Uuid::new_v4())
            .bind(post_id.uuid())
            .bind(&item.storage_key)
            .bind(item.kind.as_str())
            .bind(item.is_main)
            .fetch_one(&mut *tx)
            .await?;

            items.push(MediaItem {
                id: media_id.into(),
                storage_key: item.storage_key.clone(),
                kind: item.kind,
                is_main: item.is_main,
                created_at: media_created_at.as_utc(),
            });
        }

        tx.commit().await?;

        order_media(&mut items);
        Ok(Some(Post {
            id: post_id,
            author,
            caption: post.caption.clone(),
            location_name: post.location_name.clone(),
            is_public: post.is_public,
            allow_comments: post.allow_comments,
            allow_likes: post.allow_likes,
            created_at: created_at.as_utc(),
            updated_at: updated_at.as_utc(),
            media: items,
        }))
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(&format!("{POST_SELECT} WHERE posts.post_id = $1"))
            .bind(post_id.uuid())
            .fetch_optional(&self.pool)
            .await?;

        let Some(record) = record else {
            return Ok(None);
        };
        let posts = self.collect_posts(vec![record]).await?;
        Ok(posts.into_iter().next())
    }

    /// All posts by one author, any visibility, newest first. Whether a
    /// caller may see the private ones is decided a layer up.
    pub async fn posts_by_author(
        &self,
        author_id: Id<UserMarker>,
        page: PageNumber,
    ) -> Result<(Vec<Post>, Pagination)> {
        let total = query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE posts.author_id = $1")
            .bind(author_id.uuid())
            .fetch_one(&self.pool)
            .await?;

        let records = query_as::<_, PostRecord>(&format!(
            "{POST_SELECT}
            WHERE posts.author_id = $1
            ORDER BY posts.created_at DESC
            LIMIT $2 OFFSET $3"
        ))
        .bind(author_id.uuid())
        .bind(i64::from(PAGE_SIZE))
        .bind(page.offset().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let posts = self.collect_posts(records).await?;
        Ok((posts, Pagination::new(page, total.cast_unsigned())))
    }

    /// Public posts, optionally narrowed to posts carrying at least one media
    /// item of the given kind, newest first.
    pub async fn public_posts(
        &self,
        kind: Option<MediaKind>,
        page: PageNumber,
    ) -> Result<(Vec<Post>, Pagination)> {
        let kind = kind.map(MediaKind::as_str);

        let total = query_scalar::<_, i64>(
            "
            SELECT COUNT(*) FROM posts
            WHERE posts.is_public
              AND ($1::varchar IS NULL OR EXISTS (
                  SELECT 1 FROM post_media
                  WHERE post_media.post_id = posts.post_id AND post_media.kind = $1
              ))
            ",
        )
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;

        let records = query_as::<_, PostRecord>(&format!(
            "{POST_SELECT}
            WHERE posts.is_public
              AND ($1::varchar IS NULL OR EXISTS (
                  SELECT 1 FROM post_media
                  WHERE post_media.post_id = posts.post_id AND post_media.kind = $1
              ))
            ORDER BY posts.created_at DESC
            LIMIT $2 OFFSET $3"
        ))
        .bind(kind)
        .bind(i64::from(PAGE_SIZE))
        .bind(page.offset().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let posts = self.collect_posts(records).await?;
        Ok((posts, Pagination::new(page, total.cast_unsigned())))
    }

    /// Unpaginated candidate pool for the feed: every public post authored
    /// by any of the given users.
    pub async fn public_posts_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(&format!(
            "{POST_SELECT}
            WHERE posts.is_public AND posts.author_id = ANY($1)
            ORDER BY posts.created_at DESC"
        ))
        .bind(author_ids)
        .fetch_all(&self.pool)
        .await?;

        self.collect_posts(records).await
    }

    /// Bounded random sample of public posts from anyone but the viewer;
    /// the no-follow fallback pool.
    pub async fn random_public_posts(
        &self,
        exclude_author: Id<UserMarker>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(&format!(
            "{POST_SELECT}
            WHERE posts.is_public AND posts.author_id <> $1
            ORDER BY random()
            LIMIT $2"
        ))
        .bind(exclude_author.uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.collect_posts(records).await
    }

    pub async fn latest_post_by_author(&self, author_id: Id<UserMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(&format!(
            "{POST_SELECT}
            WHERE posts.author_id = $1
            ORDER BY posts.created_at DESC
            LIMIT 1"
        ))
        .bind(author_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };
        let posts = self.collect_posts(vec![record]).await?;
        Ok(posts.into_iter().next())
    }

    /// Deletes the post; media, likes, comments and saves go with it through
    /// the schema's cascade rules.
    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let affected = query("DELETE FROM posts WHERE posts.post_id = $1")
            .bind(post_id.uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    pub(crate) async fn collect_posts(&self, records: Vec<PostRecord>) -> Result<Vec<Post>> {
        let mut posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_media(&mut posts).await?;
        Ok(posts)
    }

    async fn attach_media(&self, posts: &mut [Post]) -> Result<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = posts.iter().map(|post| post.id.uuid()).collect();
        let records = query_as::<_, MediaRecord>(
            "
            SELECT
                post_media.media_id,
                post_media.post_id,
                post_media.storage_key,
                post_media.kind,
                post_media.is_main,
                post_media.created_at
            FROM
                post_media
            WHERE
                post_media.post_id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_post: HashMap<Uuid, Vec<MediaItem>> = HashMap::new();
        for record in records {
            let post_id = record.post_id;
            by_post
                .entry(post_id)
                .or_default()
                .push(MediaItem::try_from(record)?);
        }

        for post in posts {
            if let Some(mut items) = by_post.remove(&post.id.uuid()) {
                order_media(&mut items);
                post.media = items;
            }
        }

        Ok(())
    }
}

use crate::{
    client::{DbClient, DbError, Result},
    record::FollowEntryRecord,
};
use litfass_common::model::{
    Id,
    follow::{FollowAction, FollowEntry},
    user::UserMarker,
};
use sqlx::{query, query_as, query_scalar};
use uuid::Uuid;

impl DbClient {
    pub async fn is_following(
        &self,
        follower: Id<UserMarker>,
        followee: Id<UserMarker>,
    ) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM follows
                WHERE follows.follower_id = $1 AND follows.followee_id = $2
            )
            ",
        )
        .bind(follower.uuid())
        .bind(followee.uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Flips the follow edge. The pair constraint is the arbiter under
    /// concurrency: each arm settles atomically, and a flip that loses both
    /// races (edge appeared and vanished between the arms) retries once
    /// against the new state before giving up.
    pub async fn flip_follow(
        &self,
        follower: Id<UserMarker>,
        followee: Id<UserMarker>,
    ) -> Result<FollowAction> {
        if follower == followee {
            return Err(DbError::SelfFollow);
        }

        for _ in 0..2 {
            if self.insert_follow_edge(follower, followee).await? {
                return Ok(FollowAction::Followed);
            }
            if self.delete_follow_edge(follower, followee).await? {
                return Ok(FollowAction::Unfollowed);
            }
        }

        Err(DbError::ToggleContention)
    }

    async fn insert_follow_edge(
        &self,
        follower: Id<UserMarker>,
        followee: Id<UserMarker>,
    ) -> Result<bool> {
        let inserted = query_scalar::<_, Uuid>(
            "
            INSERT INTO follows (follower_id, followee_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            RETURNING follows.follower_id
            ",
        )
        .bind(follower.uuid())
        .bind(followee.uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    async fn delete_follow_edge(
        &self,
        follower: Id<UserMarker>,
        followee: Id<UserMarker>,
    ) -> Result<bool> {
        let affected = query(
            "
            DELETE FROM follows
            WHERE follows.follower_id = $1 AND follows.followee_id = $2
            ",
        )
        .bind(follower.uuid())
        .bind(followee.uuid())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    pub async fn followers(&self, user_id: Id<UserMarker>) -> Result<Vec<FollowEntry>> {
        let records = query_as::<_, FollowEntryRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                users.display_name,
                users.avatar_url,
                follows.created_at AS followed_at
            FROM
                follows JOIN users ON users.user_id = follows.follower_id
            WHERE
                follows.followee_id = $1
            ORDER BY
                follows.created_at DESC
            ",
        )
        .bind(user_id.uuid())
        .fetch_all(&self.pool)
        .await?;

        let entries = records
            .into_iter()
            .map(FollowEntry::try_from)
            .collect::<Result<_, _>>()?;
        Ok(entries)
    }

    pub async fn following(&self, user_id: Id<UserMarker>) -> Result<Vec<FollowEntry>> {
        let records = query_as::<_, FollowEntryRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                users.display_name,
                users.avatar_url,
                follows.created_at AS followed_at
            FROM
                follows JOIN users ON users.user_id = follows.followee_id
            WHERE
                follows.follower_id = $1
            ORDER BY
                follows.created_at DESC
            ",
        )
        .bind(user_id.uuid())
        .fetch_all(&self.pool)
        .await?;

        let entries = records
            .into_iter()
            .map(FollowEntry::try_from)
            .collect::<Result<_, _>>()?;
        Ok(entries)
    }

    /// Just the followee ids, for feed assembly.
    pub async fn following_ids(&self, user_id: Id<UserMarker>) -> Result<Vec<Uuid>> {
        let ids = query_scalar::<_, Uuid>(
            "
            SELECT follows.followee_id
            FROM follows
            WHERE follows.follower_id = $1
            ",
        )
        .bind(user_id.uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

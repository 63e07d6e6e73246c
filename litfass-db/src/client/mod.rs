mod engagement;
mod follows;
mod posts;
mod stories;

use crate::record::UserRecord;
use litfass_common::model::{
    Id, ModelValidationError,
    user::{UpsertUser, UserMarker, UserSummary},
};
use sqlx::{PgPool, postgres::PgPoolOptions, query_as};
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("A user cannot follow themselves")]
    SelfFollow,
    #[error("The toggle lost repeated races against concurrent requests")]
    ToggleContention,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<UserSummary>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                users.display_name,
                users.avatar_url
            FROM
                users
            WHERE
                users.user_id = $1
            ",
        )
        .bind(user_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(UserSummary::try_from).transpose()?;
        Ok(user)
    }

    /// Ingests display attributes pushed by the external identity system.
    pub async fn upsert_user(
        &self,
        user_id: Id<UserMarker>,
        user: &UpsertUser,
    ) -> Result<UserSummary> {
        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users (user_id, username, display_name, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                display_name = EXCLUDED.display_name,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = (now() AT TIME ZONE 'utc')
            RETURNING
                users.user_id,
                users.username,
                users.display_name,
                users.avatar_url
            ",
        )
        .bind(user_id.uuid())
        .bind(user.username.get())
        .bind(&user.display_name)
        .bind(user.avatar_url.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(UserSummary::try_from(record)?)
    }
}

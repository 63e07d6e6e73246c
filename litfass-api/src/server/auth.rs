use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use litfass_common::model::{Id, user::UserMarker};
use litfass_db::client::DbClient;
use std::sync::Arc;
use uuid::Uuid;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The requesting viewer. Session issuance lives outside this core: the
/// gateway hands us the authenticated subject id as the bearer token, and we
/// only verify the subject is known to the identity mirror.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct AuthenticatedUser {
    id: Id<UserMarker>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.id
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let subject: Uuid = AuthorizationHeader::from_request_parts(parts, state)
            .await
            .map_err(ServerError::InvalidAuthorizationHeader)?
            .token()
            .parse()
            .map_err(ServerError::InvalidBearerSubject)?;

        let user_id = Id::new(subject);
        let user = Arc::<DbClient>::from_ref(state)
            .fetch_user(user_id)
            .await?
            .ok_or(ServerError::UnknownSubject(user_id))?;

        Ok(Self { id: user.id })
    }
}

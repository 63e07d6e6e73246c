use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use json::Json;
use litfass_common::model::{
    Id, ModelValidationError,
    engagement::CommentMarker,
    post::PostMarker,
    story::StoryMarker,
    user::UserMarker,
};
use litfass_db::client::{DbClient, DbError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

mod auth;
mod json;
mod overlay;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The bearer subject is not a valid user id: {0}")]
    InvalidBearerSubject(uuid::Error),
    #[error("The bearer subject {0} is not a known user")]
    UnknownSubject(Id<UserMarker>),
    #[error("Invalid input: {0}")]
    Validation(#[from] ModelValidationError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("User with id {0} was not found.")]
    UserByIdNotFound(Id<UserMarker>),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Story with id {0} was not found.")]
    StoryByIdNotFound(Id<StoryMarker>),
    #[error("Comment with id {0} was not found.")]
    CommentByIdNotFound(Id<CommentMarker>),
    #[error("Post {0} does not allow likes")]
    LikesDisabled(Id<PostMarker>),
    #[error("Post {0} does not allow comments")]
    CommentsDisabled(Id<PostMarker>),
    #[error("Story {0} has expired")]
    StoryExpired(Id<StoryMarker>),
    #[error("No permission to view story {0}")]
    PrivateStory(Id<StoryMarker>),
    #[error("Only the comment author or the post author may delete a comment")]
    CommentNotDeletable,
    #[error("Only the author may delete a post")]
    PostNotDeletable,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::UserByIdNotFound(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::StoryByIdNotFound(_)
            | ServerError::CommentByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::UnknownSubject(_) => StatusCode::UNAUTHORIZED,
            ServerError::JsonRejection(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidBearerSubject(_)
            | ServerError::Validation(_)
            | ServerError::LikesDisabled(_)
            | ServerError::CommentsDisabled(_)
            | ServerError::StoryExpired(_)
            | ServerError::Database(DbError::SelfFollow) => StatusCode::BAD_REQUEST,
            ServerError::PrivateStory(_)
            | ServerError::CommentNotDeletable
            | ServerError::PostNotDeletable => StatusCode::FORBIDDEN,
            ServerError::Database(DbError::ToggleContention) => StatusCode::CONFLICT,
            ServerError::JsonResponse(_) | ServerError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::server::ServerError;
    use axum::http::StatusCode;
    use litfass_common::model::Id;
    use litfass_db::client::DbError;

    #[test]
    fn error_statuses_follow_the_taxonomy() {
        let cases = [
            (
                ServerError::Database(DbError::SelfFollow),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::Database(DbError::ToggleContention),
                StatusCode::CONFLICT,
            ),
            (
                ServerError::StoryExpired(Id::default()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::LikesDisabled(Id::default()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::PrivateStory(Id::default()),
                StatusCode::FORBIDDEN,
            ),
            (ServerError::CommentNotDeletable, StatusCode::FORBIDDEN),
            (
                ServerError::CommentByIdNotFound(Id::default()),
                StatusCode::NOT_FOUND,
            ),
            (
                ServerError::UnknownSubject(Id::default()),
                StatusCode::UNAUTHORIZED,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
        }
    }
}

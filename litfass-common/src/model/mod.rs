pub mod engagement;
pub mod follow;
pub mod post;
pub mod story;
pub mod user;

use crate::model::{
    engagement::EmptyCommentTextError,
    post::{NoMediaError, UnknownMediaKindError},
    story::NonPositiveStoryDurationError,
    user::InvalidUsernameError,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    CommentText(#[from] EmptyCommentTextError),
    #[error(transparent)]
    MediaKind(#[from] UnknownMediaKindError),
    #[error(transparent)]
    StoryDuration(#[from] NonPositiveStoryDurationError),
    #[error(transparent)]
    NoMedia(#[from] NoMediaError),
}

/// Typed entity id. The marker keeps user, post, story and comment ids from
/// being mixed up at compile time; the inner uuid is minted by whoever
/// creates the row.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(Uuid, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    #[must_use]
    pub fn random() -> Self {
        Self::new(Uuid::new_v4())
    }

    #[must_use]
    pub fn uuid(self) -> Uuid {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<Uuid> for Id<Marker> {
    fn from(value: Uuid) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for Uuid {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

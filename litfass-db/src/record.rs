//! Row shapes as they come off the wire, converted into domain models at
//! this boundary so invalid rows surface as data errors instead of panics.

use litfass_common::model::{
    ModelValidationError,
    engagement::{Comment, CommentText},
    follow::FollowEntry,
    post::{MediaItem, MediaKind, Post},
    story::{Story, StoryDuration},
    user::{UserSummary, Username},
};
use sqlx::prelude::FromRow;
use time::PrimitiveDateTime;
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct FollowEntryRecord {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub followed_at: PrimitiveDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: Uuid,
    pub caption: Option<String>,
    pub location_name: Option<String>,
    pub is_public: bool,
    pub allow_comments: bool,
    pub allow_likes: bool,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
}

/// A post row joined with the saving relation.
#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct SavedPostRecord {
    #[sqlx(flatten)]
    pub post: PostRecord,
    pub saved_at: PrimitiveDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct MediaRecord {
    pub media_id: Uuid,
    pub post_id: Uuid,
    pub storage_key: String,
    pub kind: String,
    pub is_main: bool,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_id: Uuid,
    pub post_id: Uuid,
    pub body: String,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct StoryRecord {
    pub story_id: Uuid,
    pub content: Option<String>,
    pub media_key: String,
    pub media_kind: String,
    pub duration_hours: i64,
    pub is_public: bool,
    pub created_at: PrimitiveDateTime,
    pub author_id: Uuid,
    pub author_username: String,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
}

fn author_summary(
    id: Uuid,
    username: String,
    display_name: String,
    avatar_url: Option<String>,
) -> Result<UserSummary, ModelValidationError> {
    Ok(UserSummary {
        id: id.into(),
        username: Username::new(username)?,
        display_name,
        avatar_url,
    })
}

impl TryFrom<UserRecord> for UserSummary {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        author_summary(
            value.user_id,
            value.username,
            value.display_name,
            value.avatar_url,
        )
    }
}

impl TryFrom<FollowEntryRecord> for FollowEntry {
    type Error = ModelValidationError;

    fn try_from(value: FollowEntryRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: author_summary(
                value.user_id,
                value.username,
                value.display_name,
                value.avatar_url,
            )?,
            followed_at: value.followed_at.as_utc(),
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    /// Media is attached afterwards from its own query.
    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.into(),
            author: author_summary(
                value.author_id,
                value.author_username,
                value.author_display_name,
                value.author_avatar_url,
            )?,
            caption: value.caption,
            location_name: value.location_name,
            is_public: value.is_public,
            allow_comments: value.allow_comments,
            allow_likes: value.allow_likes,
            created_at: value.created_at.as_utc(),
            updated_at: value.updated_at.as_utc(),
            media: Vec::new(),
        })
    }
}

impl TryFrom<MediaRecord> for MediaItem {
    type Error = ModelValidationError;

    fn try_from(value: MediaRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.media_id.into(),
            storage_key: value.storage_key,
            kind: value.kind.parse::<MediaKind>()?,
            is_main: value.is_main,
            created_at: value.created_at.as_utc(),
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.into(),
            post_id: value.post_id.into(),
            author: author_summary(
                value.author_id,
                value.author_username,
                value.author_display_name,
                value.author_avatar_url,
            )?,
            text: CommentText::new(&value.body)?,
            created_at: value.created_at.as_utc(),
            updated_at: value.updated_at.as_utc(),
        })
    }
}

impl TryFrom<StoryRecord> for Story {
    type Error = ModelValidationError;

    fn try_from(value: StoryRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.story_id.into(),
            author: author_summary(
                value.author_id,
                value.author_username,
                value.author_display_name,
                value.author_avatar_url,
            )?,
            content: value.content,
            media_key: value.media_key,
            media_kind: value.media_kind.parse::<MediaKind>()?,
            duration: StoryDuration::try_from(value.duration_hours)?,
            is_public: value.is_public,
            created_at: value.created_at.as_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::{StoryRecord, UserRecord};
    use litfass_common::model::{story::Story, user::UserSummary};
    use time::macros::datetime;
    use uuid::Uuid;

    fn story_record() -> StoryRecord {
        StoryRecord {
            story_id: Uuid::from_u128(1),
            content: None,
            media_key: "stories/a".to_owned(),
            media_kind: "image".to_owned(),
            duration_hours: 24,
            is_public: true,
            created_at: datetime!(2025-06-01 12:00),
            author_id: Uuid::from_u128(2),
            author_username: "anna".to_owned(),
            author_display_name: "Anna".to_owned(),
            author_avatar_url: None,
        }
    }

    #[test]
    fn invalid_username_is_a_data_error() {
        let record = UserRecord {
            user_id: Uuid::from_u128(1),
            username: String::new(),
            display_name: "Nobody".to_owned(),
            avatar_url: None,
        };

        assert!(UserSummary::try_from(record).is_err());
    }

    #[test]
    fn story_record_converts() {
        let story = Story::try_from(story_record()).unwrap();

        assert_eq!(story.duration.hours(), 24);
        assert_eq!(story.author.username.get(), "anna");
    }

    #[test]
    fn bad_story_rows_are_rejected() {
        let mut unknown_kind = story_record();
        unknown_kind.media_kind = "gif".to_owned();
        assert!(Story::try_from(unknown_kind).is_err());

        let mut zero_duration = story_record();
        zero_duration.duration_hours = 0;
        assert!(Story::try_from(zero_duration).is_err());
    }
}

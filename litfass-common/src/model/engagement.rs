use crate::model::{Id, post::PostMarker, user::UserSummary};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

/// Comment body, trimmed and guaranteed non-empty.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentText(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Comment text must not be empty")]
pub struct EmptyCommentTextError;

impl CommentText {
    pub fn new(text: &str) -> Result<Self, EmptyCommentTextError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Err(EmptyCommentTextError)
        } else {
            Ok(CommentText(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CommentText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        CommentText::new(&inner)
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"CommentText"))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub post_id: Id<PostMarker>,
    pub author: UserSummary,
    pub text: CommentText,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

/// What a like toggle settled on, with the count observed right after.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct SaveToggle {
    pub saved: bool,
}

/// Outcome of an idempotent story-view record; `created` is false when the
/// viewer had already seen the story.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct RecordedView {
    pub created: bool,
}

#[cfg(test)]
mod tests {
    use crate::model::engagement::{CommentText, EmptyCommentTextError};

    #[test]
    fn text_is_trimmed() {
        let text = CommentText::new("  hello there \n").unwrap();
        assert_eq!(text.get(), "hello there");
    }

    #[test]
    fn blank_text_rejected() {
        for text in ["", "   ", "\n\t "] {
            assert_eq!(CommentText::new(text), Err(EmptyCommentTextError));
        }
    }
}

use crate::model::{Id, post::MediaKind, user::UserSummary};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;
use time::{Duration, UtcDateTime};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct StoryMarker;

/// Fixed cutoff for story *listings* ("my stories", the story feed). This is
/// independent from the per-story expiry: a story with a longer duration
/// drops out of listings after 24 hours but stays individually viewable
/// until its own `expires_at`.
pub const STORY_LISTING_WINDOW: Duration = Duration::hours(24);

pub const DEFAULT_STORY_DURATION_HOURS: i64 = 24;

/// Story lifetime in whole hours, strictly positive.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct StoryDuration(i64);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The story duration must be a positive number of hours: {0}")]
pub struct NonPositiveStoryDurationError(i64);

impl StoryDuration {
    #[must_use]
    pub fn new(hours: i64) -> Option<Self> {
        (hours > 0).then_some(Self(hours))
    }

    #[must_use]
    pub fn hours(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::hours(self.0)
    }
}

impl Default for StoryDuration {
    fn default() -> Self {
        Self(DEFAULT_STORY_DURATION_HOURS)
    }
}

impl TryFrom<i64> for StoryDuration {
    type Error = NonPositiveStoryDurationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(NonPositiveStoryDurationError(value))
    }
}

impl<'de> Deserialize<'de> for StoryDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = i64::deserialize(deserializer)?;
        StoryDuration::new(inner)
            .ok_or_else(|| Error::invalid_value(Unexpected::Signed(inner), &"StoryDuration"))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Story {
    pub id: Id<StoryMarker>,
    pub author: UserSummary,
    pub content: Option<String>,
    pub media_key: String,
    pub media_kind: MediaKind,
    pub duration: StoryDuration,
    pub is_public: bool,
    pub created_at: UtcDateTime,
}

impl Story {
    #[must_use]
    pub fn expires_at(&self) -> UtcDateTime {
        self.created_at + self.duration.as_duration()
    }

    #[must_use]
    pub fn is_expired(&self, now: UtcDateTime) -> bool {
        now > self.expires_at()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct NewStory {
    pub content: Option<String>,
    pub media_key: String,
    pub media_kind: MediaKind,
    #[serde(default)]
    pub duration: StoryDuration,
    pub is_public: bool,
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        post::MediaKind,
        story::{DEFAULT_STORY_DURATION_HOURS, STORY_LISTING_WINDOW, Story, StoryDuration},
        user::UserSummary,
    };
    use time::{Duration, macros::utc_datetime};

    fn story(duration_hours: i64) -> Story {
        Story {
            id: Id::default(),
            author: UserSummary::default(),
            content: None,
            media_key: "stories/a".to_owned(),
            media_kind: MediaKind::Image,
            duration: StoryDuration::new(duration_hours).unwrap(),
            is_public: true,
            created_at: utc_datetime!(2025-06-01 12:00),
        }
    }

    #[test]
    fn legal_durations() {
        let legal = [1, 24, 48];
        let illegal = [0, -1, -24];

        for hours in legal {
            assert!(StoryDuration::new(hours).is_some());
        }
        for hours in illegal {
            assert!(StoryDuration::new(hours).is_none());
        }

        assert_eq!(
            StoryDuration::default().hours(),
            DEFAULT_STORY_DURATION_HOURS
        );
    }

    #[test]
    fn expiry_follows_per_story_duration() {
        let story = story(6);

        assert_eq!(story.expires_at(), utc_datetime!(2025-06-01 18:00));
        assert!(!story.is_expired(utc_datetime!(2025-06-01 18:00)));
        assert!(story.is_expired(utc_datetime!(2025-06-01 18:00:01)));
    }

    #[test]
    fn expiry_is_independent_from_listing_window() {
        // A 48h story is past the listing window after 30h yet not expired.
        let story = story(48);
        let at = story.created_at + Duration::hours(30);

        assert!(!story.is_expired(at));
        assert!(at - story.created_at > STORY_LISTING_WINDOW);
    }
}

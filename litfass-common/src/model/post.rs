use crate::model::{Id, user::UserSummary};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct MediaMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown media kind: {0:?}")]
pub struct UnknownMediaKindError(String);

impl MediaKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = UnknownMediaKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(UnknownMediaKindError(other.to_owned())),
        }
    }
}

/// A media attachment. The storage key points into the external blob store;
/// serving bytes behind it is not this core's concern.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct MediaItem {
    pub id: Id<MediaMarker>,
    pub storage_key: String,
    pub kind: MediaKind,
    pub is_main: bool,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: UserSummary,
    pub caption: Option<String>,
    pub location_name: Option<String>,
    pub is_public: bool,
    pub allow_comments: bool,
    pub allow_likes: bool,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
    /// Ordered main-first, then by creation time.
    pub media: Vec<MediaItem>,
}

impl Post {
    #[must_use]
    pub fn main_media(&self) -> Option<&MediaItem> {
        self.media.iter().find(|media| media.is_main)
    }

    pub fn additional_media(&self) -> impl Iterator<Item = &MediaItem> {
        self.media.iter().filter(|media| !media.is_main)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct NewPost {
    pub caption: Option<String>,
    pub location_name: Option<String>,
    pub is_public: bool,
    pub allow_comments: bool,
    pub allow_likes: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct NewMediaItem {
    pub storage_key: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub is_main: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("A post requires at least one media item")]
pub struct NoMediaError;

/// Settles the main flag before storage: a post carries exactly one main
/// item. When the caller marks none or several, the first supplied item
/// wins and the rest are demoted.
pub fn normalize_media(mut items: Vec<NewMediaItem>) -> Result<Vec<NewMediaItem>, NoMediaError> {
    if items.is_empty() {
        return Err(NoMediaError);
    }

    let main_count = items.iter().filter(|item| item.is_main).count();
    if main_count != 1 {
        for item in &mut items {
            item.is_main = false;
        }
        items[0].is_main = true;
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use crate::model::post::{MediaKind, NewMediaItem, NoMediaError, normalize_media};
    use std::str::FromStr;

    fn item(key: &str, is_main: bool) -> NewMediaItem {
        NewMediaItem {
            storage_key: key.to_owned(),
            kind: MediaKind::Image,
            is_main,
        }
    }

    #[test]
    fn media_kind_round_trip() {
        assert_eq!(MediaKind::from_str("image"), Ok(MediaKind::Image));
        assert_eq!(MediaKind::from_str("video"), Ok(MediaKind::Video));
        assert!(MediaKind::from_str("gif").is_err());
        assert!(MediaKind::from_str("Image").is_err());
        assert_eq!(MediaKind::Video.as_str(), "video");
    }

    #[test]
    fn empty_media_rejected() {
        assert_eq!(normalize_media(Vec::new()), Err(NoMediaError));
    }

    #[test]
    fn single_main_kept_in_place() {
        let items = vec![item("a", false), item("b", true), item("c", false)];
        let normalized = normalize_media(items).unwrap();

        let mains: Vec<&str> = normalized
            .iter()
            .filter(|item| item.is_main)
            .map(|item| item.storage_key.as_str())
            .collect();
        assert_eq!(mains, ["b"]);
    }

    #[test]
    fn zero_mains_forces_first() {
        let items = vec![item("a", false), item("b", false)];
        let normalized = normalize_media(items).unwrap();

        assert!(normalized[0].is_main);
        assert!(!normalized[1].is_main);
    }

    #[test]
    fn multiple_mains_forces_first() {
        let items = vec![item("a", false), item("b", true), item("c", true)];
        let normalized = normalize_media(items).unwrap();

        let mains: Vec<&str> = normalized
            .iter()
            .filter(|item| item.is_main)
            .map(|item| item.storage_key.as_str())
            .collect();
        assert_eq!(mains, ["a"]);
    }
}

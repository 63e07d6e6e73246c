use crate::model::user::UserSummary;
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

/// Which way a follow toggle flipped.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowAction {
    Followed,
    Unfollowed,
}

/// One edge of the follow graph as shown in follower/following listings.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct FollowEntry {
    pub user: UserSummary,
    pub followed_at: UtcDateTime,
}

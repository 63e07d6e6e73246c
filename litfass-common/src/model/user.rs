use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;

pub const USERNAME_MAX_LEN: usize = 50;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// Read-side mirror of an identity managed by the external identity system.
/// This core never mints identities, it only consumes and re-exposes them.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct UserSummary {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Display attributes pushed by the identity system when a profile changes.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct UpsertUser {
    pub username: Username,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The username is invalid: {0:?}")]
pub struct InvalidUsernameError(String);

impl Username {
    pub fn new(username: String) -> Result<Self, InvalidUsernameError> {
        if !username.is_empty() && username.chars().count() <= USERNAME_MAX_LEN {
            Ok(Username(username))
        } else {
            Err(InvalidUsernameError(username))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Username::new(inner).map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Username"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::user::{USERNAME_MAX_LEN, Username};

    #[test]
    fn legal_usernames() {
        let legal = ["a", "karl.kranz", &"x".repeat(USERNAME_MAX_LEN)];
        let illegal = ["", &"x".repeat(USERNAME_MAX_LEN + 1)];

        for username in legal {
            assert!(Username::new(username.to_owned()).is_ok());
        }
        for username in illegal {
            assert!(Username::new(username.to_owned()).is_err());
        }
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        // 50 two-byte characters exceed 50 bytes but stay within the limit
        let username = "ä".repeat(USERNAME_MAX_LEN);
        assert!(Username::new(username).is_ok());
    }
}

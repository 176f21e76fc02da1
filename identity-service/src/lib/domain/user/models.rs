use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::TwitterIdError;
use crate::user::errors::UserError;
use crate::user::errors::UserIdError;
use crate::user::errors::UsernameError;

/// User aggregate entity.
///
/// A user carries local credentials, a linked Twitter identity, or both.
/// The constructors below are the only way the service creates users, and
/// each of them populates at least one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub local: Option<LocalIdentity>,
    pub twitter: Option<TwitterIdentity>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// New account created by local signup.
    pub fn with_local(local: LocalIdentity) -> Self {
        Self {
            id: UserId::new(),
            local: Some(local),
            twitter: None,
            created_at: Utc::now(),
        }
    }

    /// New account created by a first Twitter sign-in.
    pub fn with_twitter(twitter: TwitterIdentity) -> Self {
        Self {
            id: UserId::new(),
            local: None,
            twitter: Some(twitter),
            created_at: Utc::now(),
        }
    }

    /// Rebuild a stored record.
    ///
    /// # Errors
    /// * `MissingIdentity` - Neither sub-record is present
    pub fn from_parts(
        id: UserId,
        local: Option<LocalIdentity>,
        twitter: Option<TwitterIdentity>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        if local.is_none() && twitter.is_none() {
            return Err(UserError::MissingIdentity(id.to_string()));
        }

        Ok(Self {
            id,
            local,
            twitter,
            created_at,
        })
    }

    pub fn local_username(&self) -> Option<&Username> {
        self.local.as_ref().map(|local| &local.username)
    }

    pub fn twitter_id(&self) -> Option<&TwitterId> {
        self.twitter.as_ref().map(|twitter| &twitter.id)
    }

    /// Attach a Twitter identity, replacing any previously linked one.
    pub fn link_twitter(&mut self, twitter: TwitterIdentity) {
        self.twitter = Some(twitter);
    }

    /// Name to greet the user with: local username first, then Twitter display name.
    pub fn display_name(&self) -> &str {
        match (&self.local, &self.twitter) {
            (Some(local), _) => local.username.as_str(),
            (None, Some(twitter)) => &twitter.display_name,
            (None, None) => "",
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Local account username.
///
/// Compared byte for byte: no case folding and no trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// # Errors
    /// * `Empty` - Username is the empty string
    pub fn new(username: String) -> Result<Self, UsernameError> {
        if username.is_empty() {
            return Err(UsernameError::Empty);
        }
        Ok(Self(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username and password hash of a local account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub username: Username,
    /// PHC string; never the plaintext.
    pub password_hash: String,
}

/// Provider-assigned Twitter account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TwitterId(String);

impl TwitterId {
    /// # Errors
    /// * `Empty` - Identifier is the empty string
    pub fn new(id: String) -> Result<Self, TwitterIdError> {
        if id.is_empty() {
            return Err(TwitterIdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TwitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Twitter sub-record stored on a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwitterIdentity {
    pub id: TwitterId,
    pub token: String,
    pub username: String,
    pub display_name: String,
}

impl TwitterIdentity {
    pub fn from_profile(profile: TwitterProfile, token: String) -> Self {
        Self {
            id: profile.id,
            token,
            username: profile.username,
            display_name: profile.display_name,
        }
    }
}

/// Profile returned by Twitter at the end of the OAuth handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwitterProfile {
    pub id: TwitterId,
    pub username: String,
    pub display_name: String,
}

//! User identity bound to a connection session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::role::Role;

/// Maximum accepted user id length, in bytes.
pub const MAX_USER_ID_LEN: usize = 128;

/// Identifier of a platform user.
///
/// Always non-empty and at most [`MAX_USER_ID_LEN`] bytes; construct through
/// [`UserId::new`] (or `TryFrom`) so those limits hold everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdentityError::EmptyUserId);
        }
        if id.len() > MAX_USER_ID_LEN {
            return Err(IdentityError::UserIdTooLong(id.len()));
        }
        Ok(UserId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserId::new(value)
    }
}

impl TryFrom<&str> for UserId {
    type Error = IdentityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        UserId::new(value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(user id, role)` pair a session announces.
///
/// A session holds at most one identity at a time; a later announce replaces
/// the earlier one entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Identity { user_id, role }
    }

    /// Convenience: validate a raw user id and pair it with a role.
    pub fn parse(user_id: &str, role: &str) -> Result<Self, IdentityError> {
        Ok(Identity {
            user_id: UserId::new(user_id)?,
            role: role.parse()?,
        })
    }
}

//! Error types for the notification core.
//!
//! Routing itself is infallible: unreachable sessions and empty rooms are
//! normal outcomes, not errors. Only identity construction can fail, and
//! callers at the edge are expected to log and drop the offending input.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The user id was empty or whitespace only.
    #[error("user id must not be empty")]
    EmptyUserId,

    /// The user id exceeded the maximum length.
    #[error("user id is {0} bytes, maximum is {max}", max = crate::identity::MAX_USER_ID_LEN)]
    UserIdTooLong(usize),

    /// The role name is not one of the known roles.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

//! User roles on the platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Role bound to a session at announce time.
///
/// Every role has its own broadcast room (`role:<name>`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Coach,
    Scout,
    Admin,
    Parent,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Player, Role::Coach, Role::Scout, Role::Admin, Role::Parent];

    /// Lowercase wire name (`"player"`, `"coach"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Coach => "coach",
            Role::Scout => "scout",
            Role::Admin => "admin",
            Role::Parent => "parent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| IdentityError::UnknownRole(s.to_string()))
    }
}

//! Shared domain enumerations aligned with persisted database enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Caller role carried inside every issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
    Client,
    Moderator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Moderator => "moderator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role `{}`", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "client" => Ok(Role::Client),
            "moderator" => Ok(Role::Moderator),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Moderation state of a flat.
///
/// Wire and storage names keep the space in `on moderation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "flat_status")]
pub enum FlatStatus {
    #[serde(rename = "created")]
    #[sqlx(rename = "created")]
    Created,
    #[serde(rename = "on moderation")]
    #[sqlx(rename = "on moderation")]
    OnModeration,
    #[serde(rename = "approved")]
    #[sqlx(rename = "approved")]
    Approved,
    #[serde(rename = "declined")]
    #[sqlx(rename = "declined")]
    Declined,
}

impl FlatStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FlatStatus::Created => "created",
            FlatStatus::OnModeration => "on moderation",
            FlatStatus::Approved => "approved",
            FlatStatus::Declined => "declined",
        }
    }

    /// Whether clients may see a flat in this state.
    pub fn is_public(self) -> bool {
        matches!(self, FlatStatus::Approved)
    }
}

impl fmt::Display for FlatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

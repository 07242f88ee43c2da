//! User model for storage.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role. New accounts default to `Writer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    #[default]
    Writer,
    Reader,
    Collaborator,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Writer" => Ok(Role::Writer),
            "Reader" => Ok(Role::Reader),
            "Collaborator" => Ok(Role::Collaborator),
            "Admin" => Ok(Role::Admin),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

/// User document stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Login name (unique)
    pub username: String,
    /// bcrypt hash, never sent to clients
    pub password: String,
    /// Public path of the uploaded profile picture (e.g. `/uploads/profile_pics/...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new user with a fresh id and timestamps.
    pub fn new(name: String, username: String, password_hash: String, role: Role) -> Self {
        let now = crate::time_utils::now_millis();
        Self {
            id: ObjectId::new(),
            name,
            username,
            password: password_hash,
            profile_pic: None,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

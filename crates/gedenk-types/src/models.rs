use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Public,
    Private,
}

impl PrivacyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyLevel::Public => "public",
            PrivacyLevel::Private => "private",
        }
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(PrivacyLevel::Public),
            "private" => Ok(PrivacyLevel::Private),
            other => Err(format!("invalid privacy level: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemorialKind {
    Person,
    Pet,
}

impl MemorialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemorialKind::Person => "person",
            MemorialKind::Pet => "pet",
        }
    }
}

impl FromStr for MemorialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" => Ok(MemorialKind::Person),
            "pet" => Ok(MemorialKind::Pet),
            other => Err(format!("invalid memorial kind: '{}'", other)),
        }
    }
}

/// Role granted to a collaborator on a private memorial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    Administrator,
    Member,
}

impl CollaboratorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaboratorRole::Administrator => "administrator",
            CollaboratorRole::Member => "member",
        }
    }
}

impl FromStr for CollaboratorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrator" => Ok(CollaboratorRole::Administrator),
            "member" => Ok(CollaboratorRole::Member),
            other => Err(format!("invalid collaborator role: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            other => Err(format!("invalid invitation status: '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memorial {
    pub id: Uuid,
    pub subject_name: String,
    pub kind: MemorialKind,
    pub privacy: PrivacyLevel,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A grant of access to a private memorial. Only `Accepted` status ever
/// grants anything; `Pending` exists so the invitee can accept later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub memorial_id: Uuid,
    pub invited_user_id: Uuid,
    pub role: CollaboratorRole,
    pub status: InvitationStatus,
}

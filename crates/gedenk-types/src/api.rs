use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CollaboratorRole, InvitationStatus, MemorialKind, PrivacyLevel};
use crate::reaction::ReactionSnapshot;

// -- JWT Claims --

/// JWT claims shared between token minting (auth handlers) and the
/// bearer-extracting middleware. Canonical definition lives here in
/// gedenk-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Response envelope --

/// Every successful JSON response is wrapped as `{ "success": true, "data": … }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Memorials --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateMemorialRequest {
    pub subject_name: String,
    pub kind: MemorialKind,
    pub privacy: PrivacyLevel,
}

/// A memorial as returned to a caller who passed access resolution.
/// `viewer_role` is `administrator` for the creator (and accepted admin
/// invitees on private pages) so the UI can show administrative affordances.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorialResponse {
    pub id: Uuid,
    pub subject_name: String,
    pub kind: MemorialKind,
    pub privacy: PrivacyLevel,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub viewer_role: Option<CollaboratorRole>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePrivacyRequest {
    pub privacy: PrivacyLevel,
}

// -- Invitations --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InviteRequest {
    pub invited_user_id: Uuid,
    pub role: CollaboratorRole,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub memorial_id: Uuid,
    pub invited_user_id: Uuid,
    pub role: CollaboratorRole,
    pub status: InvitationStatus,
}

// -- Guestbook --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEntryRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestbookEntryResponse {
    pub id: Uuid,
    pub memorial_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// -- Reactions --

/// `reactionType` stays a plain string here so the handler can reject unknown
/// values with a 400 instead of a generic deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToggleReactionRequest {
    pub reaction_type: String,
}

/// Both reaction endpoints answer with the authoritative post-call snapshot.
pub type ReactionsResponse = ReactionSnapshot;

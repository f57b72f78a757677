use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use gedenk_types::api::{Claims, Envelope, InvitationResponse, InviteRequest};
use gedenk_types::models::{InvitationStatus, PrivacyLevel};

use crate::access::resolve_viewer;
use crate::auth::AppStateInner;
use crate::error::ApiError;

/// POST /memorials/{id}/invitations — the creator of a private memorial
/// grants an actor a collaborator role. The invitation starts pending and
/// grants nothing until accepted.
pub async fn invite(
    State(state): State<Arc<AppStateInner>>,
    Path(memorial_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<InviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (memorial, decision) = resolve_viewer(&state.db, memorial_id, Some(claims.sub))?;

    if !decision.granted() {
        return Err(ApiError::NotFound);
    }
    let memorial = memorial.ok_or(ApiError::NotFound)?;

    if memorial.creator_id != claims.sub {
        return Err(ApiError::Forbidden);
    }
    if memorial.privacy != PrivacyLevel::Private {
        return Err(ApiError::Validation(
            "public memorials do not take invitations".into(),
        ));
    }
    if req.invited_user_id == claims.sub {
        return Err(ApiError::Validation("cannot invite yourself".into()));
    }

    if state
        .db
        .get_user_by_id(&req.invited_user_id.to_string())?
        .is_none()
    {
        return Err(ApiError::Validation("invited user does not exist".into()));
    }

    if state
        .db
        .get_invitation(&memorial_id.to_string(), &req.invited_user_id.to_string())?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "an invitation for this user already exists".into(),
        ));
    }

    state.db.create_invitation(
        &Uuid::new_v4().to_string(),
        &memorial_id.to_string(),
        &req.invited_user_id.to_string(),
        req.role.as_str(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(InvitationResponse {
            memorial_id,
            invited_user_id: req.invited_user_id,
            role: req.role,
            status: InvitationStatus::Pending,
        })),
    ))
}

/// POST /memorials/{id}/invitations/accept — the invited actor accepts their
/// own pending invitation. This is the only status transition; there is no
/// invitation to accept once it has been consumed.
pub async fn accept(
    State(state): State<Arc<AppStateInner>>,
    Path(memorial_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // No access resolution here: the invitee has no access until accepting.
    // The memorial's existence is still required.
    if state.db.get_memorial(&memorial_id.to_string())?.is_none() {
        return Err(ApiError::NotFound);
    }

    let accepted = state
        .db
        .accept_invitation(&memorial_id.to_string(), &claims.sub.to_string())?;
    if !accepted {
        return Err(ApiError::NotFound);
    }

    let row = state
        .db
        .get_invitation(&memorial_id.to_string(), &claims.sub.to_string())?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(Envelope::ok(InvitationResponse {
        memorial_id,
        invited_user_id: claims.sub,
        role: row
            .role
            .parse()
            .map_err(|e: String| ApiError::Internal(anyhow::anyhow!(e)))?,
        status: InvitationStatus::Accepted,
    })))
}

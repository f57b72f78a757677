use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use gedenk_types::api::{
    Claims, CreateMemorialRequest, Envelope, MemorialResponse, UpdatePrivacyRequest,
};
use gedenk_types::models::{CollaboratorRole, Memorial};

use crate::access::resolve_viewer;
use crate::auth::AppStateInner;
use crate::error::ApiError;
use crate::middleware::OptionalClaims;

pub async fn create_memorial(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateMemorialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.subject_name.trim();
    if name.is_empty() || name.len() > 200 {
        return Err(ApiError::Validation(
            "subject name must be 1-200 characters".into(),
        ));
    }

    let memorial_id = Uuid::new_v4();
    state.db.create_memorial(
        &memorial_id.to_string(),
        name,
        req.kind.as_str(),
        req.privacy.as_str(),
        &claims.sub.to_string(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(MemorialResponse {
            id: memorial_id,
            subject_name: name.to_string(),
            kind: req.kind,
            privacy: req.privacy,
            creator_id: claims.sub,
            created_at: chrono::Utc::now(),
            viewer_role: Some(CollaboratorRole::Administrator),
        })),
    ))
}

pub async fn get_memorial(
    State(state): State<Arc<AppStateInner>>,
    Path(memorial_id): Path<Uuid>,
    Extension(OptionalClaims(claims)): Extension<OptionalClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.map(|c| c.sub);
    let (memorial, decision) = resolve_viewer(&state.db, memorial_id, actor)?;

    if !decision.granted() {
        return Err(ApiError::NotFound);
    }
    let memorial = memorial.ok_or(ApiError::NotFound)?;

    Ok(Json(Envelope::ok(response_for(memorial, decision.role()))))
}

/// Privacy level is mutable by the creator only. A granted non-creator viewer
/// gets 403; anyone the resolver turns away gets the usual 404.
pub async fn update_privacy(
    State(state): State<Arc<AppStateInner>>,
    Path(memorial_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePrivacyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (memorial, decision) = resolve_viewer(&state.db, memorial_id, Some(claims.sub))?;

    if !decision.granted() {
        return Err(ApiError::NotFound);
    }
    let mut memorial = memorial.ok_or(ApiError::NotFound)?;

    if memorial.creator_id != claims.sub {
        return Err(ApiError::Forbidden);
    }

    state
        .db
        .set_memorial_privacy(&memorial_id.to_string(), req.privacy.as_str())?;
    memorial.privacy = req.privacy;

    Ok(Json(Envelope::ok(response_for(
        memorial,
        Some(CollaboratorRole::Administrator),
    ))))
}

fn response_for(memorial: Memorial, viewer_role: Option<CollaboratorRole>) -> MemorialResponse {
    MemorialResponse {
        id: memorial.id,
        subject_name: memorial.subject_name,
        kind: memorial.kind,
        privacy: memorial.privacy,
        creator_id: memorial.creator_id,
        created_at: memorial.created_at,
        viewer_role,
    }
}

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::{error, warn};
use uuid::Uuid;

use gedenk_db::Database;
use gedenk_types::api::{Claims, Envelope, ToggleReactionRequest};
use gedenk_types::reaction::{ReactionSnapshot, ReactionType};

use crate::access::resolve_viewer;
use crate::auth::AppStateInner;
use crate::error::ApiError;
use crate::middleware::OptionalClaims;

/// GET /memorials/{id}/reactions — counts for everyone, plus the caller's own
/// active types when a valid credential was supplied.
pub async fn get_reactions(
    State(state): State<Arc<AppStateInner>>,
    Path(memorial_id): Path<Uuid>,
    Extension(OptionalClaims(claims)): Extension<OptionalClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.map(|c| c.sub);

    let snapshot = tokio::task::spawn_blocking(move || -> Result<ReactionSnapshot, ApiError> {
        let (_, decision) = resolve_viewer(&state.db, memorial_id, actor)?;
        if !decision.granted() {
            return Err(ApiError::NotFound);
        }
        Ok(build_snapshot(&state.db, memorial_id, actor)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(Envelope::ok(snapshot)))
}

/// POST /memorials/{id}/reactions — the single mutation primitive. The store
/// decides flip direction from current presence; the response carries the
/// authoritative post-toggle state the client reconciles against.
pub async fn toggle_reaction(
    State(state): State<Arc<AppStateInner>>,
    Path(memorial_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ToggleReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ty: ReactionType = req
        .reaction_type
        .parse()
        .map_err(|e: gedenk_types::reaction::UnknownReaction| {
            ApiError::Validation(e.to_string())
        })?;

    let actor = claims.sub;
    let reaction_id = Uuid::new_v4();

    let snapshot = tokio::task::spawn_blocking(move || -> Result<ReactionSnapshot, ApiError> {
        let (_, decision) = resolve_viewer(&state.db, memorial_id, Some(actor))?;
        if !decision.granted() {
            return Err(ApiError::NotFound);
        }

        state.db.toggle_reaction(
            &reaction_id.to_string(),
            &memorial_id.to_string(),
            &actor.to_string(),
            ty.as_str(),
        )?;

        Ok(build_snapshot(&state.db, memorial_id, Some(actor))?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(Envelope::ok(snapshot)))
}

/// Assemble the authoritative snapshot: all five counts (zero-filled) plus
/// the actor's active types in canonical priority order.
pub(crate) fn build_snapshot(
    db: &Database,
    memorial_id: Uuid,
    actor: Option<Uuid>,
) -> anyhow::Result<ReactionSnapshot> {
    let mut snapshot = ReactionSnapshot::empty();

    for (name, count) in db.reaction_counts(&memorial_id.to_string())? {
        match name.parse::<ReactionType>() {
            Ok(ty) => {
                snapshot.counts.insert(ty, count);
            }
            Err(_) => warn!("Ignoring unknown reaction '{}' in store", name),
        }
    }

    if let Some(actor) = actor {
        let mut active: Vec<ReactionType> = db
            .active_reactions(&memorial_id.to_string(), &actor.to_string())?
            .into_iter()
            .filter_map(|name| name.parse().ok())
            .collect();
        active.sort_by_key(|ty: &ReactionType| ty.priority());
        snapshot.user_reactions = active;
    }

    Ok(snapshot)
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {}", e);
    ApiError::Internal(anyhow::anyhow!("task join error: {}", e))
}

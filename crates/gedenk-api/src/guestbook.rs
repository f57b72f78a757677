use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use gedenk_types::api::{Claims, CreateEntryRequest, Envelope, GuestbookEntryResponse};

use crate::access::{parse_sqlite_timestamp, resolve_viewer};
use crate::auth::AppStateInner;
use crate::error::ApiError;
use crate::middleware::OptionalClaims;

#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn list_entries(
    State(state): State<Arc<AppStateInner>>,
    Path(memorial_id): Path<Uuid>,
    Query(query): Query<EntryQuery>,
    Extension(OptionalClaims(claims)): Extension<OptionalClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = claims.map(|c| c.sub);
    let (_, decision) = resolve_viewer(&state.db, memorial_id, actor)?;
    if !decision.granted() {
        return Err(ApiError::NotFound);
    }

    let rows = state
        .db
        .list_guestbook_entries(&memorial_id.to_string(), query.limit.min(200))?;

    let entries: Vec<GuestbookEntryResponse> = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id.parse().ok()?;
            let author_id = row.author_id.parse().ok()?;
            Some(GuestbookEntryResponse {
                id,
                memorial_id,
                author_id,
                author_username: row.author_username,
                message: row.message,
                created_at: parse_sqlite_timestamp(&row.created_at),
            })
        })
        .collect();

    Ok(Json(Envelope::ok(entries)))
}

pub async fn create_entry(
    State(state): State<Arc<AppStateInner>>,
    Path(memorial_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = req.message.trim();
    if message.is_empty() || message.len() > 2000 {
        return Err(ApiError::Validation(
            "message must be 1-2000 characters".into(),
        ));
    }

    let (_, decision) = resolve_viewer(&state.db, memorial_id, Some(claims.sub))?;
    if !decision.granted() {
        return Err(ApiError::NotFound);
    }

    let entry_id = Uuid::new_v4();
    state.db.insert_guestbook_entry(
        &entry_id.to_string(),
        &memorial_id.to_string(),
        &claims.sub.to_string(),
        message,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(GuestbookEntryResponse {
            id: entry_id,
            memorial_id,
            author_id: claims.sub,
            author_username: claims.username,
            message: message.to_string(),
            created_at: chrono::Utc::now(),
        })),
    ))
}

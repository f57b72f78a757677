use anyhow::{Context, Result};
use uuid::Uuid;

use gedenk_core::AccessDecision;
use gedenk_db::Database;
use gedenk_db::models::{InvitationRow, MemorialRow};
use gedenk_types::models::{Invitation, Memorial};

/// Load the memorial and the actor's invitation (if any) and run the access
/// resolver over them. Called per request — grants are never cached, since
/// privacy level or invitation status may change between calls.
///
/// Returns the parsed memorial alongside the decision so granted handlers do
/// not have to reload it. A missing memorial comes back as `(None, Denied)`.
pub fn resolve_viewer(
    db: &Database,
    memorial_id: Uuid,
    actor: Option<Uuid>,
) -> Result<(Option<Memorial>, AccessDecision)> {
    let memorial = db
        .get_memorial(&memorial_id.to_string())?
        .map(memorial_from_row)
        .transpose()?;

    let invitation = match (&memorial, actor) {
        (Some(m), Some(actor)) => db
            .get_invitation(&m.id.to_string(), &actor.to_string())?
            .map(invitation_from_row)
            .transpose()?,
        _ => None,
    };

    let decision = gedenk_core::resolve_access(memorial.as_ref(), actor, invitation.as_ref());
    Ok((memorial, decision))
}

fn memorial_from_row(row: MemorialRow) -> Result<Memorial> {
    Ok(Memorial {
        id: row
            .id
            .parse()
            .with_context(|| format!("corrupt memorial id '{}'", row.id))?,
        subject_name: row.subject_name,
        kind: row
            .kind
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?,
        privacy: row
            .privacy
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?,
        creator_id: row
            .creator_id
            .parse()
            .with_context(|| format!("corrupt creator id '{}'", row.creator_id))?,
        created_at: parse_sqlite_timestamp(&row.created_at),
    })
}

fn invitation_from_row(row: InvitationRow) -> Result<Invitation> {
    Ok(Invitation {
        memorial_id: row
            .memorial_id
            .parse()
            .with_context(|| format!("corrupt memorial id '{}'", row.memorial_id))?,
        invited_user_id: row
            .invited_user_id
            .parse()
            .with_context(|| format!("corrupt user id '{}'", row.invited_user_id))?,
        role: row.role.parse().map_err(|e: String| anyhow::anyhow!(e))?,
        status: row.status.parse().map_err(|e: String| anyhow::anyhow!(e))?,
    })
}

/// SQLite's datetime('now') stores "YYYY-MM-DD HH:MM:SS" without a timezone;
/// values written through chrono round-trip as RFC 3339.
pub(crate) fn parse_sqlite_timestamp(raw: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::warn!("Corrupt created_at '{}': {}", raw, e);
            chrono::DateTime::default()
        })
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS memorials (
            id              TEXT PRIMARY KEY,
            subject_name    TEXT NOT NULL,
            kind            TEXT NOT NULL DEFAULT 'person',
            privacy         TEXT NOT NULL DEFAULT 'public',
            creator_id      TEXT NOT NULL REFERENCES users(id),
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS invitations (
            id                  TEXT PRIMARY KEY,
            memorial_id         TEXT NOT NULL REFERENCES memorials(id),
            invited_user_id     TEXT NOT NULL REFERENCES users(id),
            role                TEXT NOT NULL,
            status              TEXT NOT NULL DEFAULT 'pending',
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(memorial_id, invited_user_id)
        );

        -- One row per (memorial, actor, type): presence means the reaction is
        -- active. The uniqueness constraint is what serializes concurrent
        -- toggles from two sessions of the same actor.
        CREATE TABLE IF NOT EXISTS reactions (
            id          TEXT PRIMARY KEY,
            memorial_id TEXT NOT NULL REFERENCES memorials(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            reaction    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(memorial_id, user_id, reaction)
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_memorial
            ON reactions(memorial_id);

        CREATE TABLE IF NOT EXISTS guestbook_entries (
            id          TEXT PRIMARY KEY,
            memorial_id TEXT NOT NULL REFERENCES memorials(id),
            author_id   TEXT NOT NULL REFERENCES users(id),
            message     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_guestbook_memorial
            ON guestbook_entries(memorial_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

use crate::Database;
use crate::models::{GuestbookRow, InvitationRow, MemorialRow, UserRow};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_username_by_id(&self, id: &str) -> Result<String> {
        self.with_conn(|conn| {
            conn.query_row("SELECT username FROM users WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .map_err(|_| anyhow!("User not found: {}", id))
        })
    }

    // -- Memorials --

    pub fn create_memorial(
        &self,
        id: &str,
        subject_name: &str,
        kind: &str,
        privacy: &str,
        creator_id: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO memorials (id, subject_name, kind, privacy, creator_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, subject_name, kind, privacy, creator_id),
            )?;
            Ok(())
        })
    }

    pub fn get_memorial(&self, id: &str) -> Result<Option<MemorialRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, subject_name, kind, privacy, creator_id, created_at
                 FROM memorials WHERE id = ?1",
            )?;

            let row = stmt
                .query_row([id], |row| {
                    Ok(MemorialRow {
                        id: row.get(0)?,
                        subject_name: row.get(1)?,
                        kind: row.get(2)?,
                        privacy: row.get(3)?,
                        creator_id: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    pub fn set_memorial_privacy(&self, id: &str, privacy: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE memorials SET privacy = ?2 WHERE id = ?1",
                (id, privacy),
            )?;
            Ok(())
        })
    }

    // -- Invitations --

    pub fn create_invitation(
        &self,
        id: &str,
        memorial_id: &str,
        invited_user_id: &str,
        role: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO invitations (id, memorial_id, invited_user_id, role, status)
                 VALUES (?1, ?2, ?3, ?4, 'pending')",
                (id, memorial_id, invited_user_id, role),
            )?;
            Ok(())
        })
    }

    pub fn get_invitation(&self, memorial_id: &str, user_id: &str) -> Result<Option<InvitationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, memorial_id, invited_user_id, role, status
                 FROM invitations WHERE memorial_id = ?1 AND invited_user_id = ?2",
            )?;

            let row = stmt
                .query_row([memorial_id, user_id], |row| {
                    Ok(InvitationRow {
                        id: row.get(0)?,
                        memorial_id: row.get(1)?,
                        invited_user_id: row.get(2)?,
                        role: row.get(3)?,
                        status: row.get(4)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    /// Accept a pending invitation. Returns false when no pending invitation
    /// exists — the only legal transition is pending -> accepted.
    pub fn accept_invitation(&self, memorial_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE invitations SET status = 'accepted'
                 WHERE memorial_id = ?1 AND invited_user_id = ?2 AND status = 'pending'",
                (memorial_id, user_id),
            )?;
            Ok(changed > 0)
        })
    }

    // -- Reactions --

    /// The single reaction mutation primitive: the store reads current
    /// presence and flips it inside one transaction, so the flip decision is
    /// made exactly once per request even with concurrent sessions.
    /// Returns true when the reaction was added, false when removed.
    pub fn toggle_reaction(
        &self,
        id: &str,
        memorial_id: &str,
        user_id: &str,
        reaction: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM reactions
                     WHERE memorial_id = ?1 AND user_id = ?2 AND reaction = ?3",
                    rusqlite::params![memorial_id, user_id, reaction],
                    |row| row.get(0),
                )
                .optional()?;

            let added = if let Some(existing_id) = existing {
                tx.execute("DELETE FROM reactions WHERE id = ?1", [&existing_id])?;
                false
            } else {
                tx.execute(
                    "INSERT INTO reactions (id, memorial_id, user_id, reaction)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![id, memorial_id, user_id, reaction],
                )?;
                true
            };

            tx.commit()?;
            Ok(added)
        })
    }

    /// Per-type count of distinct reacting actors. Types with no reactions
    /// are absent; callers zero-fill.
    pub fn reaction_counts(&self, memorial_id: &str) -> Result<Vec<(String, u64)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT reaction, COUNT(DISTINCT user_id)
                 FROM reactions WHERE memorial_id = ?1
                 GROUP BY reaction",
            )?;

            let rows = stmt
                .query_map([memorial_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// The reaction types one actor currently holds on a memorial.
    pub fn active_reactions(&self, memorial_id: &str, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT reaction FROM reactions
                 WHERE memorial_id = ?1 AND user_id = ?2",
            )?;

            let rows = stmt
                .query_map([memorial_id, user_id], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Guestbook --

    pub fn insert_guestbook_entry(
        &self,
        id: &str,
        memorial_id: &str,
        author_id: &str,
        message: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO guestbook_entries (id, memorial_id, author_id, message)
                 VALUES (?1, ?2, ?3, ?4)",
                (id, memorial_id, author_id, message),
            )?;
            Ok(())
        })
    }

    pub fn list_guestbook_entries(&self, memorial_id: &str, limit: u32) -> Result<Vec<GuestbookRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch author_username in a single query
            let mut stmt = conn.prepare(
                "SELECT g.id, g.memorial_id, g.author_id, u.username, g.message, g.created_at
                 FROM guestbook_entries g
                 LEFT JOIN users u ON g.author_id = u.id
                 WHERE g.memorial_id = ?1
                 ORDER BY g.created_at DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![memorial_id, limit], |row| {
                    Ok(GuestbookRow {
                        id: row.get(0)?,
                        memorial_id: row.get(1)?,
                        author_id: row.get(2)?,
                        author_username: row
                            .get::<_, Option<String>>(3)?
                            .unwrap_or_else(|| "unknown".to_string()),
                        message: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use uuid::Uuid;

    fn db_with_memorial() -> (Database, String, String) {
        let db = Database::open_in_memory().unwrap();
        let creator = Uuid::new_v4().to_string();
        db.create_user(&creator, "ersteller", "hash").unwrap();

        let memorial = Uuid::new_v4().to_string();
        db.create_memorial(&memorial, "Anna Beispiel", "person", "public", &creator)
            .unwrap();
        (db, memorial, creator)
    }

    fn add_user(db: &Database, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, name, "hash").unwrap();
        id
    }

    #[test]
    fn toggle_pair_restores_state() {
        let (db, memorial, user) = db_with_memorial();

        let added = db
            .toggle_reaction(&Uuid::new_v4().to_string(), &memorial, &user, "kerze")
            .unwrap();
        assert!(added);
        assert_eq!(db.active_reactions(&memorial, &user).unwrap(), vec!["kerze"]);

        let added = db
            .toggle_reaction(&Uuid::new_v4().to_string(), &memorial, &user, "kerze")
            .unwrap();
        assert!(!added);
        assert!(db.active_reactions(&memorial, &user).unwrap().is_empty());
        assert!(db.reaction_counts(&memorial).unwrap().is_empty());
    }

    #[test]
    fn counts_equal_distinct_actor_cardinality() {
        let (db, memorial, creator) = db_with_memorial();
        let u1 = add_user(&db, "besucher1");
        let u2 = add_user(&db, "besucher2");

        for user in [&creator, &u1, &u2] {
            db.toggle_reaction(&Uuid::new_v4().to_string(), &memorial, user, "liebe")
                .unwrap();
        }
        db.toggle_reaction(&Uuid::new_v4().to_string(), &memorial, &u1, "blume")
            .unwrap();

        let mut counts = db.reaction_counts(&memorial).unwrap();
        counts.sort();
        assert_eq!(
            counts,
            vec![("blume".to_string(), 1), ("liebe".to_string(), 3)]
        );

        // One actor withdraws; the count follows the set cardinality.
        db.toggle_reaction(&Uuid::new_v4().to_string(), &memorial, &u2, "liebe")
            .unwrap();
        let counts = db.reaction_counts(&memorial).unwrap();
        assert!(counts.contains(&("liebe".to_string(), 2)));
    }

    #[test]
    fn reactions_across_types_are_independent() {
        let (db, memorial, user) = db_with_memorial();

        for ty in ["kerze", "liebe", "blume", "taube", "stern"] {
            db.toggle_reaction(&Uuid::new_v4().to_string(), &memorial, &user, ty)
                .unwrap();
        }
        assert_eq!(db.active_reactions(&memorial, &user).unwrap().len(), 5);

        db.toggle_reaction(&Uuid::new_v4().to_string(), &memorial, &user, "taube")
            .unwrap();
        let active = db.active_reactions(&memorial, &user).unwrap();
        assert_eq!(active.len(), 4);
        assert!(!active.contains(&"taube".to_string()));
    }

    #[test]
    fn invitation_accept_is_pending_to_accepted_only() {
        let (db, memorial, _creator) = db_with_memorial();
        let invitee = add_user(&db, "gast");

        db.create_invitation(&Uuid::new_v4().to_string(), &memorial, &invitee, "member")
            .unwrap();
        let inv = db.get_invitation(&memorial, &invitee).unwrap().unwrap();
        assert_eq!(inv.status, "pending");

        assert!(db.accept_invitation(&memorial, &invitee).unwrap());
        let inv = db.get_invitation(&memorial, &invitee).unwrap().unwrap();
        assert_eq!(inv.status, "accepted");

        // Accepting again is a no-op, not an error.
        assert!(!db.accept_invitation(&memorial, &invitee).unwrap());

        // No invitation row at all.
        let stranger = add_user(&db, "fremder");
        assert!(!db.accept_invitation(&memorial, &stranger).unwrap());
    }

    #[test]
    fn privacy_is_mutable() {
        let (db, memorial, _creator) = db_with_memorial();
        db.set_memorial_privacy(&memorial, "private").unwrap();
        let row = db.get_memorial(&memorial).unwrap().unwrap();
        assert_eq!(row.privacy, "private");
    }

    #[test]
    fn guestbook_entries_come_back_newest_first() {
        let (db, memorial, user) = db_with_memorial();

        // created_at has second resolution; force distinct ordering values.
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO guestbook_entries (id, memorial_id, author_id, message, created_at)
                 VALUES (?1, ?2, ?3, 'In stillem Gedenken', '2026-01-01 10:00:00')",
                (Uuid::new_v4().to_string(), &memorial, &user),
            )?;
            conn.execute(
                "INSERT INTO guestbook_entries (id, memorial_id, author_id, message, created_at)
                 VALUES (?1, ?2, ?3, 'Unvergessen', '2026-01-02 10:00:00')",
                (Uuid::new_v4().to_string(), &memorial, &user),
            )?;
            Ok(())
        })
        .unwrap();

        let entries = db.list_guestbook_entries(&memorial, 50).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Unvergessen");
        assert_eq!(entries[0].author_username, "ersteller");
    }
}

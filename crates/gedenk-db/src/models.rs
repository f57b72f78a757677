/// Database row types — these map directly to SQLite rows.
/// Distinct from gedenk-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct MemorialRow {
    pub id: String,
    pub subject_name: String,
    pub kind: String,
    pub privacy: String,
    pub creator_id: String,
    pub created_at: String,
}

pub struct InvitationRow {
    pub id: String,
    pub memorial_id: String,
    pub invited_user_id: String,
    pub role: String,
    pub status: String,
}

pub struct GuestbookRow {
    pub id: String,
    pub memorial_id: String,
    pub author_id: String,
    pub author_username: String,
    pub message: String,
    pub created_at: String,
}

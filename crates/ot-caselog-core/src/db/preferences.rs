//! User preference operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::UserPreferences;

impl Database {
    /// Load preferences for a user. Unknown users get defaults.
    pub fn get_preferences(&self, user_id: &str) -> DbResult<UserPreferences> {
        let last_used_technique: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT last_used_technique FROM user_preferences WHERE user_id = ?",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(UserPreferences {
            last_used_technique: last_used_technique.flatten(),
        })
    }

    /// Store preferences for a user, replacing any previous value.
    pub fn save_preferences(&self, user_id: &str, prefs: &UserPreferences) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO user_preferences (user_id, last_used_technique, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(user_id) DO UPDATE SET
                last_used_technique = excluded.last_used_technique,
                updated_at = excluded.updated_at
            "#,
            params![user_id, prefs.last_used_technique],
        )?;
        Ok(())
    }
}

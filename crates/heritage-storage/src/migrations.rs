//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use heritage_core::error::HeritageError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), HeritageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| HeritageError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| HeritageError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: rules, blog posts, artifacts.
///
/// Timestamps are epoch milliseconds. Rule patterns and replies, and post
/// comments, are JSON documents.
fn apply_v1(conn: &Connection) -> Result<(), HeritageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS response_rules (
            id          TEXT PRIMARY KEY NOT NULL,
            intent      TEXT NOT NULL,
            patterns    TEXT NOT NULL DEFAULT '[]',
            replies     TEXT NOT NULL,
            priority    INTEGER NOT NULL DEFAULT 0,
            active      INTEGER NOT NULL DEFAULT 1,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_rules_active_priority
            ON response_rules (active, priority DESC, created_at ASC);

        CREATE TABLE IF NOT EXISTS blog_posts (
            id          TEXT PRIMARY KEY NOT NULL,
            title       TEXT NOT NULL,
            body        TEXT NOT NULL DEFAULT '',
            author      TEXT NOT NULL DEFAULT '',
            image_url   TEXT,
            comments    TEXT NOT NULL DEFAULT '[]',
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_blog_posts_created
            ON blog_posts (created_at DESC);

        CREATE TABLE IF NOT EXISTS artifacts (
            id          TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            period      TEXT NOT NULL DEFAULT '',
            origin      TEXT NOT NULL DEFAULT '',
            image_url   TEXT,
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_artifacts_created
            ON artifacts (created_at DESC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| HeritageError::Storage(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_rule_table_defaults() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO response_rules (id, intent, replies, created_at)
             VALUES ('r1', 'greeting', '{\"en\":\"Hi\"}', 0)",
            [],
        )
        .unwrap();

        let (patterns, active): (String, i64) = conn
            .query_row(
                "SELECT patterns, active FROM response_rules WHERE id = 'r1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(patterns, "[]");
        assert_eq!(active, 1);
    }
}

//! Version-tracked migrations for the local lead store.
//!
//! `run_migrations()` reads the highest applied version from `_migrations`
//! and applies only the newer entries, in order.

use libsql::Connection;

use crate::error::LeadError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "leads",
        sql: r#"
            CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                campaign TEXT NOT NULL,
                row_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_leads_campaign ON leads(campaign);
            CREATE INDEX IF NOT EXISTS idx_leads_created_at ON leads(created_at);
        "#,
    },
    Migration {
        version: 2,
        name: "lead_email",
        sql: r#"
            ALTER TABLE leads ADD COLUMN email TEXT;
            CREATE INDEX IF NOT EXISTS idx_leads_email ON leads(email);
        "#,
    },
];

pub async fn run_migrations(conn: &Connection) -> Result<(), LeadError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| LeadError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let current_version = current_version(conn).await?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            conn.execute_batch(migration.sql).await.map_err(|e| {
                LeadError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            conn.execute(
                "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
                libsql::params![migration.version, migration.name],
            )
            .await
            .map_err(|e| {
                LeadError::Migration(format!("Failed to record migration V{}: {e}", migration.version))
            })?;
        }
    }

    Ok(())
}

pub(crate) async fn current_version(conn: &Connection) -> Result<i64, LeadError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| LeadError::Migration(format!("Failed to query migration version: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => row
            .get::<i64>(0)
            .map_err(|e| LeadError::Migration(format!("Failed to parse migration version: {e}"))),
        Ok(None) => Ok(0),
        Err(e) => Err(LeadError::Migration(format!("Failed to read migration version: {e}"))),
    }
}

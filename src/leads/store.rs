//! libSQL lead store — keeps lead rows in a local database when no sheet
//! is configured.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use super::migrations;
use super::model::{LeadRecord, column};
use super::sink::LeadSink;
use crate::error::LeadError;

/// A lead row read back from the store.
#[derive(Debug, Clone)]
pub struct StoredLead {
    pub id: String,
    pub campaign: String,
    pub email: Option<String>,
    pub row: Vec<Option<String>>,
    pub created_at: DateTime<Utc>,
}

pub struct LibSqlLeadStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlLeadStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, LeadError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LeadError::Database(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LeadError::Database(format!("Failed to open libSQL database: {e}")))?;
        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Lead store opened");
        Ok(store)
    }

    /// Create an in-memory store.
    pub async fn new_memory() -> Result<Self, LeadError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| LeadError::Database(format!("Failed to create in-memory database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, LeadError> {
        let conn = db
            .connect()
            .map_err(|e| LeadError::Database(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    pub async fn count(&self) -> Result<u64, LeadError> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM leads", ())
            .await
            .map_err(|e| LeadError::Database(format!("count: {e}")))?;
        match rows.next().await {
            Ok(Some(row)) => {
                let n: i64 = row
                    .get(0)
                    .map_err(|e| LeadError::Database(format!("count row parse: {e}")))?;
                Ok(n.max(0) as u64)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(LeadError::Database(format!("count: {e}"))),
        }
    }

    /// Most recent leads first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<StoredLead>, LeadError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, campaign, email, row_json, created_at FROM leads
                 ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                params![i64::from(limit)],
            )
            .await
            .map_err(|e| LeadError::Database(format!("recent: {e}")))?;

        let mut leads = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let id: String = row
                .get(0)
                .map_err(|e| LeadError::Database(format!("recent row parse: {e}")))?;
            let campaign: String = row
                .get(1)
                .map_err(|e| LeadError::Database(format!("recent row parse: {e}")))?;
            let email: Option<String> = row.get(2).ok();
            let row_json: String = row
                .get(3)
                .map_err(|e| LeadError::Database(format!("recent row parse: {e}")))?;
            let created_at: String = row
                .get(4)
                .map_err(|e| LeadError::Database(format!("recent row parse: {e}")))?;

            let cells: Vec<Option<String>> = serde_json::from_str(&row_json)
                .map_err(|e| LeadError::Serialization(e.to_string()))?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);

            leads.push(StoredLead {
                id,
                campaign,
                email,
                row: cells,
                created_at,
            });
        }
        Ok(leads)
    }
}

fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

#[async_trait]
impl LeadSink for LibSqlLeadStore {
    fn name(&self) -> &str {
        "libsql"
    }

    async fn append(&self, record: &LeadRecord) -> Result<(), LeadError> {
        let row_json = serde_json::to_string(&record.row_json())
            .map_err(|e| LeadError::Serialization(e.to_string()))?;
        let email = opt_text(record.cell(column::EMAIL));

        self.conn
            .execute(
                "INSERT INTO leads (id, campaign, row_json, created_at, email)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.to_string(),
                    record.campaign.id(),
                    row_json,
                    record.created_at.to_rfc3339(),
                    email
                ],
            )
            .await
            .map_err(|e| LeadError::Database(format!("insert lead: {e}")))?;

        debug!(lead_id = %record.id, "Lead stored");
        Ok(())
    }
}

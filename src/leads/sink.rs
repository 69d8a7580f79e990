//! Lead sink trait and the in-memory implementation.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::model::LeadRecord;
use crate::error::LeadError;

/// Append-only destination for lead rows.
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Append one row.
    async fn append(&self, record: &LeadRecord) -> Result<(), LeadError>;
}

/// Keeps leads in memory.
#[derive(Default)]
pub struct MemoryLeadSink {
    records: RwLock<Vec<LeadRecord>>,
}

impl MemoryLeadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<LeadRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl LeadSink for MemoryLeadSink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append(&self, record: &LeadRecord) -> Result<(), LeadError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}

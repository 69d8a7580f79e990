//! Background lead writer.
//!
//! Dialog handlers hand rows to `LeadWriter::submit`, which never blocks.
//! A spawned task drains the queue into the sink in order. Sink failures
//! are logged and dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::model::LeadRecord;
use super::sink::LeadSink;

/// Handle for queueing lead rows.
#[derive(Clone)]
pub struct LeadWriter {
    tx: mpsc::UnboundedSender<LeadRecord>,
}

impl LeadWriter {
    /// Spawn the writer task for `sink`.
    pub fn spawn(sink: Arc<dyn LeadSink>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<LeadRecord>();
        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                match sink.append(&record).await {
                    Ok(()) => info!(
                        lead_id = %record.id,
                        campaign = %record.campaign,
                        sink = sink.name(),
                        "Lead appended"
                    ),
                    Err(e) => error!(
                        lead_id = %record.id,
                        campaign = %record.campaign,
                        sink = sink.name(),
                        error = %e,
                        "Failed to append lead"
                    ),
                }
            }
            debug!("Lead writer stopped");
        });
        (Self { tx }, handle)
    }

    /// Queue a row. Returns `false` if the writer task has gone away.
    pub fn submit(&self, record: LeadRecord) -> bool {
        self.tx.send(record).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::campaigns::CampaignKind;
    use crate::error::LeadError;
    use crate::leads::sink::MemoryLeadSink;
    use crate::orchestrator::model::Profile;

    struct FailingSink;

    #[async_trait]
    impl LeadSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }
        async fn append(&self, _record: &LeadRecord) -> Result<(), LeadError> {
            Err(LeadError::Http("connection refused".into()))
        }
    }

    fn record(kind: CampaignKind) -> LeadRecord {
        LeadRecord::new(&Profile::default(), kind, &[])
    }

    #[tokio::test]
    async fn writes_in_submission_order() {
        let sink = Arc::new(MemoryLeadSink::new());
        let (writer, handle) = LeadWriter::spawn(sink.clone());

        assert!(writer.submit(record(CampaignKind::Medical)));
        assert!(writer.submit(record(CampaignKind::Combo)));
        drop(writer);
        handle.await.unwrap();

        let records = sink.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].campaign, CampaignKind::Medical);
        assert_eq!(records[1].campaign, CampaignKind::Combo);
    }

    #[tokio::test]
    async fn sink_failures_do_not_stop_the_writer() {
        let (writer, handle) = LeadWriter::spawn(Arc::new(FailingSink));
        assert!(writer.submit(record(CampaignKind::Legacy)));
        assert!(writer.submit(record(CampaignKind::Legacy)));
        drop(writer);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("writer should drain and stop")
            .unwrap();
    }

    #[tokio::test]
    async fn submit_after_writer_stops_reports_false() {
        let sink = Arc::new(MemoryLeadSink::new());
        let (writer, handle) = LeadWriter::spawn(sink);
        handle.abort();
        let _ = handle.await;
        assert!(!writer.submit(record(CampaignKind::Education)));
    }
}

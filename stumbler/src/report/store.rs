//! Persistence collaborator interfaces.
//!
//! The core never stores reports itself. A [`ReportSink`] receives freshly
//! assembled data and assigns identity; a [`ReportStore`] hands pending
//! reports to the uploader and records confirmed uploads.

use std::future::Future;

use thiserror::Error;

use super::{Report, ReportData};

/// Errors surfaced by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend failed to read or write.
    #[error("Report storage failed: {0}")]
    Backend(String),

    /// The store is closed.
    #[error("Report storage is closed")]
    Closed,
}

/// Consumer of assembled reports (persistence).
pub trait ReportSink: Send + Sync {
    /// Persist one report, returning the id it was stored under.
    fn save(&self, data: ReportData) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

/// Source of reports awaiting upload.
pub trait ReportStore: Send + Sync {
    /// Up to `limit` reports not yet uploaded, oldest first.
    fn pending(&self, limit: usize) -> impl Future<Output = Result<Vec<Report>, StoreError>> + Send;

    /// Mark reports uploaded after a confirmed successful transfer.
    fn mark_uploaded(
        &self,
        ids: &[i64],
        upload_timestamp_ms: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove reports that can never be uploaded (no emitters), so they no
    /// longer come back from [`pending`](Self::pending).
    fn discard(&self, ids: &[i64]) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Forwards assembled reports to a sink, dropping empty ones.
pub struct ReportCollector<S> {
    sink: S,
}

impl<S: ReportSink> ReportCollector<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Store `data` unless it has no emitters.
    ///
    /// Returns the stored id, or `None` for an empty report.
    pub async fn collect(&self, data: ReportData) -> Result<Option<i64>, StoreError> {
        if data.is_empty() {
            tracing::debug!("Discarding report without emitters");
            return Ok(None);
        }

        let cells = data.cell_towers.len();
        let wifis = data.wifi_access_points.len();
        let beacons = data.bluetooth_beacons.len();
        let id = self.sink.save(data).await?;

        tracing::info!(id, cells, wifis, beacons, "Report stored");
        Ok(Some(id))
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

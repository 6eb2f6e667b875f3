//! Batch upload of pending reports.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{GeosubmitClient, HttpTransport, SubmitError};
use crate::clock::{Clock, WallClock};
use crate::report::{Report, ReportStore, StoreError};

/// Default number of reports per request.
pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl UploadError {
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Submit(e) => e.is_retryable(),
            UploadError::Store(_) => false,
        }
    }
}

/// Result of one upload pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Reports read from the store.
    pub fetched: usize,
    /// Reports sent and marked uploaded.
    pub submitted: usize,
    /// Empty reports discarded from the store instead of sent.
    pub skipped: usize,
}

/// Moves pending reports from a [`ReportStore`] to the geosubmit service.
///
/// Reports are marked uploaded only after the service accepted them.
pub struct Uploader<S, T> {
    store: S,
    client: GeosubmitClient<T>,
    clock: Arc<dyn Clock>,
    batch_size: usize,
}

impl<S: ReportStore, T: HttpTransport> Uploader<S, T> {
    pub fn new(store: S, client: GeosubmitClient<T>) -> Self {
        Self {
            store,
            client,
            clock: Arc::new(WallClock),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Clock used for upload timestamps (wall clock by default).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Upload one batch.
    pub async fn upload_batch(&self) -> Result<UploadSummary, UploadError> {
        let batch = self.store.pending(self.batch_size).await?;
        let fetched = batch.len();

        let (sendable, empty): (Vec<Report>, Vec<Report>) =
            batch.into_iter().partition(|r| !r.is_empty());
        if !empty.is_empty() {
            warn!(count = empty.len(), "Discarding empty reports in upload batch");
            let ids: Vec<i64> = empty.iter().map(|r| r.id).collect();
            self.store.discard(&ids).await?;
        }

        let summary = UploadSummary {
            fetched,
            submitted: sendable.len(),
            skipped: empty.len(),
        };
        if sendable.is_empty() {
            debug!(fetched, "Nothing to upload");
            return Ok(summary);
        }

        self.client.send_reports(&sendable).await?;

        let ids: Vec<i64> = sendable.iter().map(|r| r.id).collect();
        self.store.mark_uploaded(&ids, self.clock.now_ms()).await?;

        info!(submitted = summary.submitted, "Upload batch complete");
        Ok(summary)
    }

    /// Upload batches until the store has nothing more to send.
    ///
    /// A short batch means the store is drained. Stops at the first error;
    /// batches already confirmed stay marked.
    pub async fn upload_all(&self) -> Result<UploadSummary, UploadError> {
        let mut total = UploadSummary::default();
        loop {
            let batch = self.upload_batch().await?;
            total.fetched += batch.fetched;
            total.submitted += batch.submitted;
            total.skipped += batch.skipped;

            if batch.fetched < self.batch_size {
                return Ok(total);
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &GeosubmitClient<T> {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geosubmit::transport::tests::RecordingTransport;
    use crate::geosubmit::{GeosubmitConfig, TransportError};
    use crate::observation::{
        CellRadioType, CellTower, Coordinate, EmitterObservation, PositionObservation,
        PositionSource,
    };
    use crate::report::ReportData;
    use std::sync::Mutex;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        reports: Mutex<Vec<Report>>,
    }

    impl MemoryStore {
        fn with(reports: Vec<Report>) -> Self {
            Self {
                reports: Mutex::new(reports),
            }
        }

        fn uploaded(&self) -> Vec<(i64, Option<i64>)> {
            self.reports
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.uploaded)
                .map(|r| (r.id, r.upload_timestamp))
                .collect()
        }
    }

    impl ReportStore for MemoryStore {
        async fn pending(&self, limit: usize) -> Result<Vec<Report>, StoreError> {
            Ok(self
                .reports
                .lock()
                .unwrap()
                .iter()
                .filter(|r| !r.uploaded)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn mark_uploaded(&self, ids: &[i64], at: i64) -> Result<(), StoreError> {
            for report in self.reports.lock().unwrap().iter_mut() {
                if ids.contains(&report.id) {
                    report.mark_uploaded(at);
                }
            }
            Ok(())
        }

        async fn discard(&self, ids: &[i64]) -> Result<(), StoreError> {
            self.reports.lock().unwrap().retain(|r| !ids.contains(&r.id));
            Ok(())
        }
    }

    fn report(id: i64) -> Report {
        ReportData {
            position: PositionObservation::new(
                Coordinate::new(1.0, 1.0).unwrap(),
                PositionSource::Gps,
                0,
            ),
            cell_towers: vec![EmitterObservation::new(CellTower::new(CellRadioType::Nr), 0)],
            wifi_access_points: vec![],
            bluetooth_beacons: vec![],
        }
        .into_report(id, id)
    }

    fn empty_report(id: i64) -> Report {
        let mut report = report(id);
        report.cell_towers.clear();
        report
    }

    fn uploader(
        store: MemoryStore,
        transport: RecordingTransport,
    ) -> Uploader<MemoryStore, RecordingTransport> {
        Uploader::new(store, GeosubmitClient::new(transport, GeosubmitConfig::default()))
            .with_clock(Arc::new(FixedClock(42)))
    }

    #[tokio::test]
    async fn test_successful_upload_marks_reports() {
        let uploader = uploader(MemoryStore::with(vec![report(1), report(2)]), RecordingTransport::default());

        let summary = uploader.upload_batch().await.unwrap();
        assert_eq!(summary.submitted, 2);
        assert_eq!(uploader.store().uploaded(), vec![(1, Some(42)), (2, Some(42))]);
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_reports_pending() {
        let uploader = uploader(
            MemoryStore::with(vec![report(1)]),
            RecordingTransport::answering(Err(TransportError::Connection("refused".into()))),
        );

        let err = uploader.upload_batch().await.unwrap_err();
        assert!(!err.is_retryable());
        assert!(uploader.store().uploaded().is_empty());
    }

    #[tokio::test]
    async fn test_upload_all_drains_in_batches() {
        let reports = (1..=5).map(report).collect();
        let uploader = uploader(MemoryStore::with(reports), RecordingTransport::default()).with_batch_size(2);

        let total = uploader.upload_all().await.unwrap();
        assert_eq!(total.submitted, 5);
        assert_eq!(uploader.store().uploaded().len(), 5);

        let requests = uploader.client().transport().requests.lock().unwrap().len();
        assert_eq!(requests, 3);
    }

    #[tokio::test]
    async fn test_empty_store_is_a_no_op() {
        let uploader = uploader(MemoryStore::default(), RecordingTransport::default());

        assert_eq!(uploader.upload_all().await.unwrap(), UploadSummary::default());
        assert!(uploader.client().transport().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_reports_at_head_do_not_block_upload() {
        let store = MemoryStore::with(vec![empty_report(1), empty_report(2), report(3)]);
        let uploader = uploader(store, RecordingTransport::default()).with_batch_size(2);

        let total = uploader.upload_all().await.unwrap();
        assert_eq!(total.skipped, 2);
        assert_eq!(total.submitted, 1);
        assert_eq!(uploader.store().uploaded(), vec![(3, Some(42))]);
        assert!(uploader.store().pending(10).await.unwrap().is_empty());

        let requests = uploader.client().transport().requests.lock().unwrap().len();
        assert_eq!(requests, 1);
    }

    #[tokio::test]
    async fn test_all_empty_batch_sends_nothing() {
        let uploader = uploader(
            MemoryStore::with(vec![empty_report(1)]),
            RecordingTransport::default(),
        );

        let summary = uploader.upload_batch().await.unwrap();
        assert_eq!(summary, UploadSummary { fetched: 1, submitted: 0, skipped: 1 });
        assert!(uploader.client().transport().requests.lock().unwrap().is_empty());
        assert!(uploader.store().reports.lock().unwrap().is_empty());
    }
}

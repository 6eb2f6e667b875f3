//! `stumbler submit`: upload reports from a JSON file.
//!
//! The file holds an array of reports as exported by the report store.
//! Uploaded reports are marked in place, so running the command again only
//! sends what is still pending.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use stumbler::config::ConfigFile;
use stumbler::geosubmit::{encode_submission, GeosubmitRequest, Uploader};
use stumbler::report::{Report, ReportStore, StoreError};

use super::common::{build_client, read_json};
use crate::error::CliError;

/// Options for `submit`.
#[derive(Debug, Clone)]
pub struct SubmitArgs {
    pub file: PathBuf,
    pub dry_run: bool,
    pub batch_size: Option<usize>,
}

/// Run `submit`.
pub async fn run(args: SubmitArgs, config: &ConfigFile) -> Result<(), CliError> {
    let store = JsonFileStore::open(&args.file)?;
    let batch_size = args.batch_size.unwrap_or(config.submission.batch_size);

    if args.dry_run {
        return dry_run(&store, batch_size).await;
    }

    let uploader = Uploader::new(store, build_client(config)?).with_batch_size(batch_size);
    let summary = uploader.upload_all().await?;

    println!(
        "Submitted {} report(s) from {} ({} empty discarded)",
        summary.submitted,
        args.file.display(),
        summary.skipped
    );
    Ok(())
}

async fn dry_run(store: &JsonFileStore, batch_size: usize) -> Result<(), CliError> {
    let pending = store.pending(usize::MAX).await.map_err(input_error(&store.path))?;
    let sendable: Vec<Report> = pending.into_iter().filter(|r| !r.is_empty()).collect();

    let mut bytes = 0;
    for batch in sendable.chunks(batch_size.max(1)) {
        bytes += encode_submission(&GeosubmitRequest::from_reports(batch))?.len();
    }

    println!(
        "Would submit {} report(s) in {} request(s), {} bytes compressed",
        sendable.len(),
        sendable.len().div_ceil(batch_size.max(1)),
        bytes
    );
    Ok(())
}

fn input_error(path: &Path) -> impl Fn(StoreError) -> CliError + '_ {
    move |e| CliError::Input {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Report store backed by a JSON array file.
pub struct JsonFileStore {
    path: PathBuf,
    reports: Mutex<Vec<Report>>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self, CliError> {
        let reports: Vec<Report> = read_json(path)?;
        tracing::debug!(path = %path.display(), count = reports.len(), "Loaded reports");
        Ok(Self {
            path: path.to_path_buf(),
            reports: Mutex::new(reports),
        })
    }

    fn with_reports<R>(&self, f: impl FnOnce(&mut Vec<Report>) -> R) -> Result<R, StoreError> {
        let mut reports = self
            .reports
            .lock()
            .map_err(|_| StoreError::Backend("report store lock poisoned".to_string()))?;
        Ok(f(&mut reports))
    }

    fn persist(&self, json: serde_json::Result<String>) -> Result<(), StoreError> {
        let json = json.map_err(|e| StoreError::Backend(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

impl ReportStore for JsonFileStore {
    async fn pending(&self, limit: usize) -> Result<Vec<Report>, StoreError> {
        self.with_reports(|reports| {
            reports
                .iter()
                .filter(|r| !r.uploaded)
                .take(limit)
                .cloned()
                .collect()
        })
    }

    async fn mark_uploaded(&self, ids: &[i64], upload_timestamp_ms: i64) -> Result<(), StoreError> {
        let json = self.with_reports(|reports| {
            for report in reports.iter_mut().filter(|r| ids.contains(&r.id)) {
                report.mark_uploaded(upload_timestamp_ms);
            }
            serde_json::to_string_pretty(reports)
        })?;
        self.persist(json)
    }

    async fn discard(&self, ids: &[i64]) -> Result<(), StoreError> {
        let json = self.with_reports(|reports| {
            reports.retain(|r| !ids.contains(&r.id));
            serde_json::to_string_pretty(reports)
        })?;
        self.persist(json)
    }
}

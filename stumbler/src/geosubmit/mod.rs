//! Geosubmit v2 upload and geolocate client.
//!
//! Reports are serialized to the geosubmit wire shape, gzip-compressed and
//! posted through an [`HttpTransport`]. Failures are classified as
//! retryable or fatal; retry policy belongs to the caller.

mod client;
mod dto;
mod error;
mod transport;
mod uploader;
mod url;

pub use client::{
    encode_submission, GeosubmitClient, GeosubmitConfig, DEFAULT_BASE_URL, DEFAULT_LOCATE_PATH,
    DEFAULT_SUBMISSION_PATH,
};
pub use dto::{
    BluetoothBeaconDto, CellTowerDto, GeosubmitRequest, LatLng, LocateRequest, LocateResponse,
    LocationEstimate, PositionDto, ReportDto, WifiAccessPointDto,
};
pub use error::SubmitError;
pub use transport::{HttpTransport, ReqwestTransport, TransportError, DEFAULT_TIMEOUT};
pub use uploader::{UploadError, UploadSummary, Uploader, DEFAULT_BATCH_SIZE};
pub use url::join_url;

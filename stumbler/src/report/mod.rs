//! Report assembly.
//!
//! Merges one reference position fix with the emitters captured around it
//! into an immutable [`ReportData`], reconciling missing cell fields along
//! the way. Persistence is an external collaborator (see [`ReportSink`] and
//! [`ReportStore`]); it turns `ReportData` into a [`Report`] with identity.

mod assembler;
mod drift;
mod model;
mod store;

pub use assembler::{reconcile_cell_towers, ReportAssembler};
pub use drift::{correct_capture_time, ClockReadings, FixTimestamps, MAX_CLOCK_DRIFT_MS};
pub use model::{age_ms, Report, ReportData, ReportEmitter, ReportPosition};
pub use store::{ReportCollector, ReportSink, ReportStore, StoreError};

//! Discovery layer: walks numbered UN document series, downloads new files,
//! and persists per-pattern progress.
//!
//! The HTTP oracle and its wiremock tests sit behind the `http` feature:
//! run `cargo test -p mandate-sync --features http` to include them.

pub mod crawler;
pub mod cursor;
mod error;
pub mod local;
pub mod oracle;
pub mod state;

#[cfg(feature = "http")]
pub mod http;

pub use crawler::{Crawler, PatternReport, ScanOutcome, SyncOptions, SyncReport};
pub use cursor::{LocalHitPolicy, Probe, ScanCursor};
pub use error::{OracleError, SyncError};
#[cfg(feature = "http")]
pub use http::HttpOracle;
pub use local::{DocumentStore, LocalStore};
pub use oracle::ExistenceOracle;
pub use state::{PatternState, SyncState};

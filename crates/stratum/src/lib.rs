//! Stratum - filesystem-driven SQL migration reconciler.
//!
//! Discovers `.sql` scripts in a directory, compares them against the
//! `migrations` bookkeeping table, and applies the difference in name order.
//! The whole pass is meant to run inside one caller-provided transaction:
//! commit and rollback stay with the caller, and a failed run leaves the
//! transaction uncommitted.

pub mod error;
pub mod reconcile;
pub mod script;

pub use error::{StratumError, StratumResult};
pub use reconcile::{
    applied_history, apply, compute_pending, ensure_bookkeeping_table, load_applied,
    pending_scripts, reconcile, AppliedRecord, Report,
};
pub use script::{discover_scripts, Migration};

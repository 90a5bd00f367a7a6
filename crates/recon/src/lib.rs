//! `rankmerge-recon`: priority-based keyed record reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded record sets, returns the updated
//! target. No CLI or filesystem dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod ranking;
pub mod table;

pub use config::ReconConfig;
pub use engine::Reconciler;
pub use error::{ReconError, Side};
pub use model::{ReconReport, ReconSummary, Reconciliation, RowDecision, RowOutcome};
pub use ranking::PriorityRanking;
pub use table::{RecordSet, Value};

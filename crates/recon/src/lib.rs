//! `rosterline-recon` — employee roster reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns classified results.
//! No CLI dependencies and no filesystem access; the CSV loader takes text.

pub mod aggregate;
pub mod census;
pub mod classify;
pub mod config;
pub mod dedupe;
pub mod engine;
pub mod error;
pub mod key;
pub mod mapping;
pub mod model;
pub mod normalize;
pub mod table;

pub use config::{ReconConfig, RulePolicy};
pub use engine::run;
pub use error::ReconError;
pub use model::{ReconInput, ReconResult, Status};
pub use table::load_csv_table;

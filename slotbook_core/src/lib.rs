#![forbid(unsafe_code)]

//! Data-consistency core for the Slotbook appointment backend.
//!
//! This crate provides:
//! - Domain types (appointments, recurrence patterns, time ranges)
//! - Half-open interval overlap tests
//! - Recurrence expansion with a safety cap
//! - Conflict detection against committed records
//! - Atomic snapshot persistence
//! - The store that ties them together under a single lock

pub mod types;
pub mod error;
pub mod interval;
pub mod recurrence;
pub mod conflict;
pub mod snapshot;
pub mod store;
pub mod config;
pub mod logging;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use config::Config;
pub use recurrence::{expand, MAX_OCCURRENCES};
pub use snapshot::Snapshot;
pub use store::{AppointmentRepository, Store};
pub use csv_export::export_csv;

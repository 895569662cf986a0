//! lendmetrics-core — reporting core for a lending business drawing on two
//! upstream sources (AP and CN).
//!
//! The heart of the crate is the insurance ledger rollforward
//! ([`rollforward`]) and the three-dimensional reconciliation cube
//! ([`cube`]); the lending dashboard aggregates ([`reports`]) consume the
//! same store. All state lives in SQLite behind [`store::LedgerStore`];
//! every report recomputes from source facts on each call.

pub mod alias;
pub mod config;
pub mod cube;
pub mod dense;
pub mod engine;
pub mod error;
pub mod period;
pub mod reports;
pub mod rollforward;
pub mod store;
pub mod types;

pub use config::RollforwardConfig;
pub use engine::MetricsEngine;
pub use error::{MetricsError, MetricsResult};
pub use period::Period;

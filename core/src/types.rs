//! Shared primitive types used across the reporting core.

/// A canonical bank account identifier.
pub type Account = String;

/// A lender code or display name, depending on the source table.
pub type Lender = String;

/// Upstream source identifier ("AP" or "CN" in production data).
pub type SourceId = String;

/// A monetary amount. Sums arrive from SQL aggregates already coalesced to 0.
pub type Amount = f64;

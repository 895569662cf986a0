//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Engines call store methods — they never execute SQL directly.
//!
//! Every aggregate is COALESCEd to 0 in SQL: a missing SUM means zero
//! exposure for that key, never an error. The claim-account alias is applied
//! here, at the single point where claim rows are read.

mod reporting;

pub use reporting::{GroupedLabel, OutstandingRow, SourceFilter};

use crate::{
    alias::canonical_account,
    error::MetricsResult,
    period::Period,
    types::{Account, Amount},
};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One premium obligation row, as the upstream ledger stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumRecord {
    pub source_id: Option<String>,
    pub lender_code: Option<String>,
    pub bank_account: Option<String>,
    pub status: String,
    pub gross_amount: Amount,
    pub net_amount: Amount,
    pub created_date: NaiveDate,
    pub transfer_date: Option<NaiveDate>,
}

/// One claim payout row. `bank_account` is raw; the store aliases it on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub source_id: Option<String>,
    pub lender_name: Option<String>,
    pub bank_account: String,
    pub claim_amount: Amount,
    pub claim_date: NaiveDate,
}

/// A grouped aggregate cell keyed by (source, lender, account). Group keys
/// are optional because the underlying rows may carry nulls; the cube
/// builder decides what to do with those.
#[derive(Debug, Clone)]
pub struct GroupedAmount {
    pub source_id: Option<String>,
    pub lender: Option<String>,
    pub account: Option<String>,
    pub amount: Amount,
}

pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    /// Open (or create) the metrics database at `path`.
    pub fn open(path: &str) -> MetricsResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance for real files.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> MetricsResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> MetricsResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_insurance_ledger.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_lending_facts.sql"))?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Ingest helpers (seeding and tests) ─────────────────────────

    pub fn insert_premium(&self, r: &PremiumRecord) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT INTO premium_record
             (source_id, lender_code, bank_account, status, gross_amount, net_amount,
              created_date, transfer_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                r.source_id,
                r.lender_code,
                r.bank_account,
                r.status,
                r.gross_amount,
                r.net_amount,
                r.created_date.to_string(),
                r.transfer_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }

    pub fn insert_claim(&self, r: &ClaimRecord) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT INTO claim_record
             (source_id, lender_name, bank_account, claim_amount, claim_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                r.source_id,
                r.lender_name,
                r.bank_account,
                r.claim_amount,
                r.claim_date.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn insert_epoch_balance(&self, account: &str, amount: Amount) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT INTO epoch_balance (bank_account, amount) VALUES (?1, ?2)
             ON CONFLICT(bank_account) DO UPDATE SET amount = excluded.amount",
            params![account, amount],
        )?;
        Ok(())
    }

    // ── Epoch anchor ───────────────────────────────────────────────

    /// The full anchor table, no date filter. This is the only non-derived
    /// balance fact in the system.
    pub fn epoch_balances(&self) -> MetricsResult<BTreeMap<Account, Amount>> {
        let mut stmt = self
            .conn
            .prepare("SELECT bank_account, amount FROM epoch_balance")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().collect())
    }

    // ── Premium aggregates ─────────────────────────────────────────

    /// Net premium received per bank account for one calendar month.
    /// Only PAID rows count; only their transfer_date places them in time.
    /// Rows with a null account cannot be keyed and are dropped with a
    /// data-quality warning.
    pub fn premium_paid_by_account(
        &self,
        period: Period,
    ) -> MetricsResult<BTreeMap<Account, Amount>> {
        let mut stmt = self.conn.prepare(
            "SELECT bank_account, COALESCE(SUM(net_amount), 0.0)
             FROM premium_record
             WHERE status = 'PAID'
               AND transfer_date IS NOT NULL
               AND CAST(strftime('%Y', transfer_date) AS INTEGER) = ?1
               AND CAST(strftime('%m', transfer_date) AS INTEGER) = ?2
             GROUP BY bank_account",
        )?;
        let rows = stmt
            .query_map(params![period.year, period.month], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = BTreeMap::new();
        for (account, amount) in rows {
            match account {
                Some(account) => {
                    out.insert(account, amount);
                }
                None => log::warn!(
                    "premium_paid {period}: dropping {amount:.2} with null bank_account"
                ),
            }
        }
        Ok(out)
    }

    /// Premiums for one month grouped by (source, lender, account), filtered
    /// to PAID rows. Group keys stay raw; nulls come through as None.
    pub fn premium_paid_by_key(&self, period: Period) -> MetricsResult<Vec<GroupedAmount>> {
        self.premium_grouped(period, "status = 'PAID'")
    }

    /// As above but for the unpaid statuses (PENDING, UNINVOICED). Unpaid
    /// rows have no transfer_date yet, so they are placed in time by the
    /// month the obligation was booked, and summed at gross.
    pub fn premium_unpaid_by_key(&self, period: Period) -> MetricsResult<Vec<GroupedAmount>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_id, lender_code, bank_account, COALESCE(SUM(gross_amount), 0.0)
             FROM premium_record
             WHERE status IN ('PENDING', 'UNINVOICED')
               AND CAST(strftime('%Y', created_date) AS INTEGER) = ?1
               AND CAST(strftime('%m', created_date) AS INTEGER) = ?2
             GROUP BY source_id, lender_code, bank_account",
        )?;
        let rows = stmt
            .query_map(params![period.year, period.month], |row| {
                Ok(GroupedAmount {
                    source_id: row.get(0)?,
                    lender: row.get(1)?,
                    account: row.get(2)?,
                    amount: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn premium_grouped(
        &self,
        period: Period,
        status_filter: &str,
    ) -> MetricsResult<Vec<GroupedAmount>> {
        let sql = format!(
            "SELECT source_id, lender_code, bank_account, COALESCE(SUM(net_amount), 0.0)
             FROM premium_record
             WHERE {status_filter}
               AND transfer_date IS NOT NULL
               AND CAST(strftime('%Y', transfer_date) AS INTEGER) = ?1
               AND CAST(strftime('%m', transfer_date) AS INTEGER) = ?2
             GROUP BY source_id, lender_code, bank_account"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![period.year, period.month], |row| {
                Ok(GroupedAmount {
                    source_id: row.get(0)?,
                    lender: row.get(1)?,
                    account: row.get(2)?,
                    amount: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Claim aggregates ───────────────────────────────────────────

    /// Claims paid per bank account for one calendar month, keyed by the
    /// canonical (aliased) account. Two raw accounts mapping to the same
    /// canonical account are folded together.
    pub fn claims_by_account(&self, period: Period) -> MetricsResult<BTreeMap<Account, Amount>> {
        let mut stmt = self.conn.prepare(
            "SELECT bank_account, COALESCE(SUM(claim_amount), 0.0)
             FROM claim_record
             WHERE CAST(strftime('%Y', claim_date) AS INTEGER) = ?1
               AND CAST(strftime('%m', claim_date) AS INTEGER) = ?2
             GROUP BY bank_account",
        )?;
        let rows = stmt
            .query_map(params![period.year, period.month], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out: BTreeMap<Account, Amount> = BTreeMap::new();
        for (raw, amount) in rows {
            *out.entry(canonical_account(&raw)).or_insert(0.0) += amount;
        }
        Ok(out)
    }

    /// Claims for one month grouped by (source, claim lender name, aliased
    /// account).
    pub fn claims_by_key(&self, period: Period) -> MetricsResult<Vec<GroupedAmount>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_id, lender_name, bank_account, COALESCE(SUM(claim_amount), 0.0)
             FROM claim_record
             WHERE CAST(strftime('%Y', claim_date) AS INTEGER) = ?1
               AND CAST(strftime('%m', claim_date) AS INTEGER) = ?2
             GROUP BY source_id, lender_name, bank_account",
        )?;
        let rows = stmt
            .query_map(params![period.year, period.month], |row| {
                Ok(GroupedAmount {
                    source_id: row.get(0)?,
                    lender: row.get(1)?,
                    account: row.get::<_, Option<String>>(2)?,
                    amount: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|mut g| {
                g.account = g.account.map(|a| canonical_account(&a));
                g
            })
            .collect())
    }
}

//! Lending-side report queries: disbursement, repayment, outstanding.
//!
//! These are the stateless single-period aggregates behind the dashboard.
//! Lender and channel aliases are applied here, at the read point, and rows
//! folding onto the same canonical label are summed together.

use super::LedgerStore;
use crate::{
    alias::{canonical_channel, canonical_lender},
    error::MetricsResult,
    period::Period,
    types::Amount,
};
use chrono::NaiveDate;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filter on the upstream source. `None` means both.
pub type SourceFilter = Option<&'static str>;

/// A labelled aggregate for breakdown charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedLabel {
    pub label: String,
    pub value: Amount,
}

/// One pre-aggregated outstanding position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingRow {
    pub source: String,
    pub group_name: String,
    pub label: String,
    pub total_outstanding: Amount,
    pub month: NaiveDate,
}

// Disbursement rows only count toward reports when they reached a final
// state and came through a real channel.
const DISBURSEMENT_FILTER: &str = "status = 'SUCCEED' AND (method IS NULL OR method != 'FAKE')";

impl LedgerStore {
    // ── Ingest helpers ─────────────────────────────────────────────

    pub fn insert_disbursement(
        &self,
        source: &str,
        lender: Option<&str>,
        method: Option<&str>,
        status: &str,
        amount: Amount,
        disbursed_on: NaiveDate,
    ) -> MetricsResult<()> {
        self.conn().execute(
            "INSERT INTO disbursement (source, lender, method, status, amount, disbursed_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![source, lender, method, status, amount, disbursed_on.to_string()],
        )?;
        Ok(())
    }

    pub fn insert_repayment(
        &self,
        source: &str,
        channel: Option<&str>,
        method: Option<&str>,
        amount: Amount,
        received_on: NaiveDate,
    ) -> MetricsResult<()> {
        self.conn().execute(
            "INSERT INTO repayment (source, channel, method, amount, received_on)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![source, channel, method, amount, received_on.to_string()],
        )?;
        Ok(())
    }

    pub fn insert_outstanding(&self, row: &OutstandingRow) -> MetricsResult<()> {
        self.conn().execute(
            "INSERT INTO outstanding (source, group_name, label, total_outstanding, month)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.source,
                row.group_name,
                row.label,
                row.total_outstanding,
                row.month.to_string(),
            ],
        )?;
        Ok(())
    }

    // ── Disbursement ───────────────────────────────────────────────

    /// Succeeded disbursement total for one month (`through_month` false) or
    /// year-to-date through that month (`through_month` true).
    pub fn sum_disbursement(
        &self,
        year: i32,
        month: u32,
        through_month: bool,
        source: SourceFilter,
    ) -> MetricsResult<Amount> {
        self.sum_amounts(
            "disbursement",
            "disbursed_on",
            DISBURSEMENT_FILTER,
            year,
            month,
            through_month,
            source,
        )
    }

    /// Monthly succeeded disbursement per source for a full year,
    /// keyed by month 1..=12 (months with no rows are absent).
    pub fn disbursement_monthly(
        &self,
        year: i32,
        source: &str,
    ) -> MetricsResult<BTreeMap<u32, Amount>> {
        let sql = format!(
            "SELECT CAST(strftime('%m', disbursed_on) AS INTEGER),
                    COALESCE(SUM(amount), 0.0)
             FROM disbursement
             WHERE {DISBURSEMENT_FILTER}
               AND source = ?1
               AND CAST(strftime('%Y', disbursed_on) AS INTEGER) = ?2
             GROUP BY 1"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(params![source, year], |row| {
                Ok((row.get::<_, u32>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().collect())
    }

    /// Yearly disbursement grouped by canonical lender, descending by value.
    pub fn disbursement_by_lender(&self, year: i32) -> MetricsResult<Vec<GroupedLabel>> {
        let sql = format!(
            "SELECT lender, COALESCE(SUM(amount), 0.0)
             FROM disbursement
             WHERE {DISBURSEMENT_FILTER}
               AND lender IS NOT NULL
               AND CAST(strftime('%Y', disbursed_on) AS INTEGER) = ?1
             GROUP BY lender"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(params![year], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fold_by_label(rows, canonical_lender))
    }

    /// Daily succeeded disbursement for one month, keyed by ISO date.
    pub fn disbursement_daily(
        &self,
        year: i32,
        month: u32,
        source: &str,
    ) -> MetricsResult<BTreeMap<String, Amount>> {
        let sql = format!(
            "SELECT disbursed_on, COALESCE(SUM(amount), 0.0)
             FROM disbursement
             WHERE {DISBURSEMENT_FILTER}
               AND source = ?1
               AND CAST(strftime('%Y', disbursed_on) AS INTEGER) = ?2
               AND CAST(strftime('%m', disbursed_on) AS INTEGER) = ?3
             GROUP BY disbursed_on"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(params![source, year, month], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().collect())
    }

    /// Per-month lender breakdown of succeeded disbursement, canonical
    /// lender labels.
    pub fn disbursement_lenders_for_month(
        &self,
        year: i32,
        month: u32,
        source: SourceFilter,
    ) -> MetricsResult<Vec<GroupedLabel>> {
        let rows = self.grouped_month(
            "disbursement",
            "lender",
            "disbursed_on",
            DISBURSEMENT_FILTER,
            year,
            month,
            source,
        )?;
        Ok(fold_by_label(rows, canonical_lender))
    }

    /// Per-month payout-method breakdown of succeeded disbursement.
    pub fn disbursement_methods_for_month(
        &self,
        year: i32,
        month: u32,
        source: SourceFilter,
    ) -> MetricsResult<Vec<GroupedLabel>> {
        let rows = self.grouped_month(
            "disbursement",
            "method",
            "disbursed_on",
            DISBURSEMENT_FILTER,
            year,
            month,
            source,
        )?;
        Ok(fold_by_label(rows, |s| s.to_string()))
    }

    // ── Repayment ──────────────────────────────────────────────────

    pub fn sum_repayment(
        &self,
        year: i32,
        month: u32,
        through_month: bool,
        source: SourceFilter,
    ) -> MetricsResult<Amount> {
        self.sum_amounts("repayment", "received_on", "1=1", year, month, through_month, source)
    }

    pub fn repayment_monthly(
        &self,
        year: i32,
        source: &str,
    ) -> MetricsResult<BTreeMap<u32, Amount>> {
        let mut stmt = self.conn().prepare(
            "SELECT CAST(strftime('%m', received_on) AS INTEGER),
                    COALESCE(SUM(amount), 0.0)
             FROM repayment
             WHERE source = ?1
               AND CAST(strftime('%Y', received_on) AS INTEGER) = ?2
             GROUP BY 1",
        )?;
        let rows = stmt
            .query_map(params![source, year], |row| {
                Ok((row.get::<_, u32>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().collect())
    }

    /// Yearly repayment grouped by canonical deposit channel, descending.
    pub fn repayment_by_channel(&self, year: i32) -> MetricsResult<Vec<GroupedLabel>> {
        let mut stmt = self.conn().prepare(
            "SELECT COALESCE(channel, 'UNKNOWN'), COALESCE(SUM(amount), 0.0)
             FROM repayment
             WHERE CAST(strftime('%Y', received_on) AS INTEGER) = ?1
             GROUP BY 1",
        )?;
        let rows = stmt
            .query_map(params![year], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fold_by_label(rows, canonical_channel))
    }

    /// Per-month repayment breakdown by canonical channel.
    pub fn repayment_channels_for_month(
        &self,
        year: i32,
        month: u32,
        source: SourceFilter,
    ) -> MetricsResult<Vec<GroupedLabel>> {
        let rows =
            self.grouped_month("repayment", "channel", "received_on", "1=1", year, month, source)?;
        Ok(fold_by_label(rows, canonical_channel))
    }

    /// Per-month repayment breakdown by deposit method. Only rows that carry
    /// a method participate; the CN source records none.
    pub fn repayment_methods_for_month(
        &self,
        year: i32,
        month: u32,
        source: SourceFilter,
    ) -> MetricsResult<Vec<GroupedLabel>> {
        let rows = self.grouped_month(
            "repayment",
            "method",
            "received_on",
            "method IS NOT NULL",
            year,
            month,
            source,
        )?;
        Ok(fold_by_label(rows, |s| s.to_string()))
    }

    pub fn repayment_daily(
        &self,
        year: i32,
        month: u32,
        source: &str,
    ) -> MetricsResult<BTreeMap<String, Amount>> {
        let mut stmt = self.conn().prepare(
            "SELECT received_on, COALESCE(SUM(amount), 0.0)
             FROM repayment
             WHERE source = ?1
               AND CAST(strftime('%Y', received_on) AS INTEGER) = ?2
               AND CAST(strftime('%m', received_on) AS INTEGER) = ?3
             GROUP BY received_on",
        )?;
        let rows = stmt
            .query_map(params![source, year, month], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().collect())
    }

    // ── Outstanding ────────────────────────────────────────────────

    /// Total outstanding for a month-end position, summed over the Gender
    /// grouping (its labels partition the book, so the sum is the total).
    pub fn outstanding_total(
        &self,
        period: Period,
        source: SourceFilter,
    ) -> MetricsResult<Amount> {
        let (filter, src) = match source {
            Some(s) => ("AND source = ?3", s),
            None => ("", ""),
        };
        let sql = format!(
            "SELECT COALESCE(SUM(total_outstanding), 0.0)
             FROM outstanding
             WHERE group_name = 'Gender'
               AND CAST(strftime('%Y', month) AS INTEGER) = ?1
               AND CAST(strftime('%m', month) AS INTEGER) = ?2
               {filter}"
        );
        let total: f64 = if source.is_some() {
            self.conn()
                .query_row(&sql, params![period.year, period.month, src], |row| {
                    row.get(0)
                })?
        } else {
            self.conn()
                .query_row(&sql, params![period.year, period.month], |row| row.get(0))?
        };
        Ok(total)
    }

    /// Month-end outstanding per source for a full year, keyed by month
    /// 1..=12, summed over the Gender grouping.
    pub fn outstanding_monthly(
        &self,
        year: i32,
        source: &str,
    ) -> MetricsResult<BTreeMap<u32, Amount>> {
        let mut stmt = self.conn().prepare(
            "SELECT CAST(strftime('%m', month) AS INTEGER),
                    COALESCE(SUM(total_outstanding), 0.0)
             FROM outstanding
             WHERE group_name = 'Gender'
               AND source = ?1
               AND CAST(strftime('%Y', month) AS INTEGER) = ?2
             GROUP BY 1",
        )?;
        let rows = stmt
            .query_map(params![source, year], |row| {
                Ok((row.get::<_, u32>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().collect())
    }

    /// Month-end outstanding grouped by one dimension ('Lender', 'Age', ...),
    /// descending by value.
    pub fn outstanding_by_group(
        &self,
        period: Period,
        group_name: &str,
    ) -> MetricsResult<Vec<GroupedLabel>> {
        let mut stmt = self.conn().prepare(
            "SELECT label, COALESCE(SUM(total_outstanding), 0.0)
             FROM outstanding
             WHERE group_name = ?1
               AND CAST(strftime('%Y', month) AS INTEGER) = ?2
               AND CAST(strftime('%m', month) AS INTEGER) = ?3
             GROUP BY label",
        )?;
        let rows = stmt
            .query_map(params![group_name, period.year, period.month], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fold_by_label(rows, |s| s.to_string()))
    }

    // ── Shared aggregate helpers ───────────────────────────────────

    /// One month's amounts grouped by a single dimension column, nulls
    /// folded onto 'UNKNOWN'.
    #[allow(clippy::too_many_arguments)]
    fn grouped_month(
        &self,
        table: &str,
        dim_col: &str,
        date_col: &str,
        row_filter: &str,
        year: i32,
        month: u32,
        source: SourceFilter,
    ) -> MetricsResult<Vec<(String, f64)>> {
        let source_filter = if source.is_some() { "AND source = ?3" } else { "" };
        let sql = format!(
            "SELECT COALESCE({dim_col}, 'UNKNOWN'), COALESCE(SUM(amount), 0.0)
             FROM {table}
             WHERE {row_filter}
               AND CAST(strftime('%Y', {date_col}) AS INTEGER) = ?1
               AND CAST(strftime('%m', {date_col}) AS INTEGER) = ?2
               {source_filter}
             GROUP BY 1"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = match source {
            Some(s) => stmt
                .query_map(params![year, month, s], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map(params![year, month], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(rows)
    }

    #[allow(clippy::too_many_arguments)]
    fn sum_amounts(
        &self,
        table: &str,
        date_col: &str,
        row_filter: &str,
        year: i32,
        month: u32,
        through_month: bool,
        source: SourceFilter,
    ) -> MetricsResult<Amount> {
        let month_op = if through_month { "<=" } else { "=" };
        let source_filter = if source.is_some() { "AND source = ?3" } else { "" };
        let sql = format!(
            "SELECT COALESCE(SUM(amount), 0.0)
             FROM {table}
             WHERE {row_filter}
               AND CAST(strftime('%Y', {date_col}) AS INTEGER) = ?1
               AND CAST(strftime('%m', {date_col}) AS INTEGER) {month_op} ?2
               {source_filter}"
        );
        let total: f64 = match source {
            Some(s) => self
                .conn()
                .query_row(&sql, params![year, month, s], |row| row.get(0))?,
            None => self
                .conn()
                .query_row(&sql, params![year, month], |row| row.get(0))?,
        };
        Ok(total)
    }
}

/// Fold raw labels onto canonical labels, summing collisions, and sort
/// descending by value (ties broken by label for determinism).
fn fold_by_label<F>(rows: Vec<(String, f64)>, canon: F) -> Vec<GroupedLabel>
where
    F: Fn(&str) -> String,
{
    let mut folded: BTreeMap<String, f64> = BTreeMap::new();
    for (raw, amount) in rows {
        *folded.entry(canon(&raw)).or_insert(0.0) += amount;
    }
    let mut out: Vec<GroupedLabel> = folded
        .into_iter()
        .map(|(label, value)| GroupedLabel { label, value })
        .collect();
    out.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    out
}

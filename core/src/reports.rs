//! Dashboard report assembly.
//!
//! Stateless single-period aggregates over the lending fact tables. Each
//! function runs its queries, reshapes rows for the transport layer, and
//! holds no state between calls. The caller supplies the (year, month)
//! anchor; the core never reads the wall clock.

use crate::{
    error::MetricsResult,
    period::Period,
    store::{GroupedLabel, LedgerStore, SourceFilter},
    types::Amount,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const SOURCE_AP: &str = "AP";
pub const SOURCE_CN: &str = "CN";

/// Display names for the two upstream sources.
fn source_display(source: &str) -> &'static str {
    match source {
        SOURCE_AP => "Adapundi",
        SOURCE_CN => "Credinex",
        _ => "Total",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub year: i32,
    pub disbursement_ytd: Amount,
    pub disbursement_mtd: Amount,
    pub repayment_ytd: Amount,
    /// Month-end position of the month before the anchor month; January
    /// falls back to December of the prior year.
    pub outstanding_prior_month: Amount,
}

/// One month on a per-source line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub label: String,
    pub ap: Amount,
    pub cn: Amount,
}

/// One day on a daily series chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: String,
    pub amount: Amount,
    pub source: String,
}

/// Source filter accepted by the daily series and breakdown reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceSelector {
    All,
    Ap,
    Cn,
}

fn selector_filter(selector: SourceSelector) -> SourceFilter {
    match selector {
        SourceSelector::All => None,
        SourceSelector::Ap => Some(SOURCE_AP),
        SourceSelector::Cn => Some(SOURCE_CN),
    }
}

/// One amount split by upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSplit {
    pub total: Amount,
    pub ap: Amount,
    pub cn: Amount,
}

/// MTD and YTD disbursement/repayment roll-ups for one anchor month,
/// each split by source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyTotals {
    pub year: i32,
    pub month: u32,
    pub disbursement_mtd: SourceSplit,
    pub disbursement_ytd: SourceSplit,
    pub repayment_mtd: SourceSplit,
    pub repayment_ytd: SourceSplit,
}

/// One month's disbursement sliced two ways.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisbursementBreakdown {
    pub lender: Vec<GroupedLabel>,
    pub method: Vec<GroupedLabel>,
}

/// One month's repayment sliced two ways.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentBreakdown {
    pub channel: Vec<GroupedLabel>,
    pub method: Vec<GroupedLabel>,
}

pub fn dashboard(store: &LedgerStore, year: i32, month: u32) -> MetricsResult<DashboardSummary> {
    let prior = Period::new(year, month).prev();
    Ok(DashboardSummary {
        year,
        disbursement_ytd: store.sum_disbursement(year, 12, true, None)?,
        disbursement_mtd: store.sum_disbursement(year, month, false, None)?,
        repayment_ytd: store.sum_repayment(year, 12, true, None)?,
        outstanding_prior_month: store.outstanding_total(prior, None)?,
    })
}

/// MTD totals for the anchor month and YTD totals through it, per source.
pub fn monthly_totals(store: &LedgerStore, year: i32, month: u32) -> MetricsResult<MonthlyTotals> {
    fn split<F>(sum: F) -> MetricsResult<SourceSplit>
    where
        F: Fn(SourceFilter) -> MetricsResult<Amount>,
    {
        Ok(SourceSplit {
            total: sum(None)?,
            ap: sum(Some(SOURCE_AP))?,
            cn: sum(Some(SOURCE_CN))?,
        })
    }
    Ok(MonthlyTotals {
        year,
        month,
        disbursement_mtd: split(|s| store.sum_disbursement(year, month, false, s))?,
        disbursement_ytd: split(|s| store.sum_disbursement(year, month, true, s))?,
        repayment_mtd: split(|s| store.sum_repayment(year, month, false, s))?,
        repayment_ytd: split(|s| store.sum_repayment(year, month, true, s))?,
    })
}

/// Twelve labelled points, Jan..Dec, zero where a source had no activity.
pub fn disbursement_series(store: &LedgerStore, year: i32) -> MetricsResult<Vec<MonthlyPoint>> {
    let ap = store.disbursement_monthly(year, SOURCE_AP)?;
    let cn = store.disbursement_monthly(year, SOURCE_CN)?;
    Ok(monthly_points(year, &ap, &cn))
}

pub fn repayment_series(store: &LedgerStore, year: i32) -> MetricsResult<Vec<MonthlyPoint>> {
    let ap = store.repayment_monthly(year, SOURCE_AP)?;
    let cn = store.repayment_monthly(year, SOURCE_CN)?;
    Ok(monthly_points(year, &ap, &cn))
}

/// Month-end outstanding per source across the year. Months whose position
/// was never loaded stay at zero.
pub fn outstanding_series(store: &LedgerStore, year: i32) -> MetricsResult<Vec<MonthlyPoint>> {
    let ap = store.outstanding_monthly(year, SOURCE_AP)?;
    let cn = store.outstanding_monthly(year, SOURCE_CN)?;
    Ok(monthly_points(year, &ap, &cn))
}

pub fn disbursement_by_lender(store: &LedgerStore, year: i32) -> MetricsResult<Vec<GroupedLabel>> {
    store.disbursement_by_lender(year)
}

pub fn repayment_by_channel(store: &LedgerStore, year: i32) -> MetricsResult<Vec<GroupedLabel>> {
    store.repayment_by_channel(year)
}

/// One month's disbursement by lender and by payout method.
pub fn disbursement_breakdown(
    store: &LedgerStore,
    year: i32,
    month: u32,
    selector: SourceSelector,
) -> MetricsResult<DisbursementBreakdown> {
    let source = selector_filter(selector);
    Ok(DisbursementBreakdown {
        lender: store.disbursement_lenders_for_month(year, month, source)?,
        method: store.disbursement_methods_for_month(year, month, source)?,
    })
}

/// One month's repayment by canonical channel and by deposit method.
pub fn repayment_breakdown(
    store: &LedgerStore,
    year: i32,
    month: u32,
    selector: SourceSelector,
) -> MetricsResult<RepaymentBreakdown> {
    let source = selector_filter(selector);
    Ok(RepaymentBreakdown {
        channel: store.repayment_channels_for_month(year, month, source)?,
        method: store.repayment_methods_for_month(year, month, source)?,
    })
}

pub fn outstanding_by_lender(
    store: &LedgerStore,
    year: i32,
    month: u32,
) -> MetricsResult<Vec<GroupedLabel>> {
    let prior = Period::new(year, month).prev();
    store.outstanding_by_group(prior, "Lender")
}

/// Daily disbursement for one month. For `All` the AP and CN day sets are
/// unioned and summed, so a date present in only one source still appears.
pub fn disbursement_daily(
    store: &LedgerStore,
    year: i32,
    month: u32,
    selector: SourceSelector,
) -> MetricsResult<Vec<DailyPoint>> {
    let ap = store.disbursement_daily(year, month, SOURCE_AP)?;
    let cn = store.disbursement_daily(year, month, SOURCE_CN)?;
    Ok(daily_points(&ap, &cn, selector))
}

pub fn repayment_daily(
    store: &LedgerStore,
    year: i32,
    month: u32,
    selector: SourceSelector,
) -> MetricsResult<Vec<DailyPoint>> {
    let ap = store.repayment_daily(year, month, SOURCE_AP)?;
    let cn = store.repayment_daily(year, month, SOURCE_CN)?;
    Ok(daily_points(&ap, &cn, selector))
}

fn monthly_points(
    year: i32,
    ap: &std::collections::BTreeMap<u32, Amount>,
    cn: &std::collections::BTreeMap<u32, Amount>,
) -> Vec<MonthlyPoint> {
    (1..=12u32)
        .map(|m| MonthlyPoint {
            label: Period::new(year, m).label().to_string(),
            ap: ap.get(&m).copied().unwrap_or(0.0),
            cn: cn.get(&m).copied().unwrap_or(0.0),
        })
        .collect()
}

fn daily_points(
    ap: &std::collections::BTreeMap<String, Amount>,
    cn: &std::collections::BTreeMap<String, Amount>,
    selector: SourceSelector,
) -> Vec<DailyPoint> {
    match selector {
        SourceSelector::All => {
            let dates: BTreeSet<&String> = ap.keys().chain(cn.keys()).collect();
            dates
                .into_iter()
                .map(|date| DailyPoint {
                    date: date.clone(),
                    amount: ap.get(date).copied().unwrap_or(0.0)
                        + cn.get(date).copied().unwrap_or(0.0),
                    source: source_display("").to_string(),
                })
                .collect()
        }
        SourceSelector::Ap => ap
            .iter()
            .map(|(date, amount)| DailyPoint {
                date: date.clone(),
                amount: *amount,
                source: source_display(SOURCE_AP).to_string(),
            })
            .collect(),
        SourceSelector::Cn => cn
            .iter()
            .map(|(date, amount)| DailyPoint {
                date: date.clone(),
                amount: *amount,
                source: source_display(SOURCE_CN).to_string(),
            })
            .collect(),
    }
}

//! The report engine — the core's single entry point for the transport
//! layer.
//!
//! RULES:
//!   - The engine owns the store; callers never touch SQL.
//!   - Every operation recomputes from source facts. No cache, no write
//!     path, no state across calls.
//!   - (year, month) pairs are passed through as given; range and type
//!     validation is the transport layer's responsibility.

use crate::{
    config::RollforwardConfig,
    cube::{CubeBuilder, ReconciliationCube},
    error::MetricsResult,
    period::Period,
    reports::{
        self, DailyPoint, DashboardSummary, DisbursementBreakdown, MonthlyPoint, MonthlyTotals,
        RepaymentBreakdown, SourceSelector,
    },
    rollforward::{AccountBalanceSnapshot, BalanceRollforward},
    store::{GroupedLabel, LedgerStore},
};

pub struct MetricsEngine {
    store: LedgerStore,
    config: RollforwardConfig,
}

impl MetricsEngine {
    pub fn new(store: LedgerStore, config: RollforwardConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn config(&self) -> &RollforwardConfig {
        &self.config
    }

    // ── Insurance ledger (rollforward core) ────────────────────────

    /// Per-account balance snapshot for one month: beginning balance rolled
    /// forward from the epoch, plus that month's premium and claim activity.
    pub fn account_balance(
        &self,
        year: i32,
        month: u32,
    ) -> MetricsResult<Vec<AccountBalanceSnapshot>> {
        BalanceRollforward::new(&self.store, &self.config).snapshot(Period::new(year, month))
    }

    /// Full (source, lender, account) reconciliation cube for one month.
    pub fn reconciliation_cube(
        &self,
        year: i32,
        month: u32,
    ) -> MetricsResult<ReconciliationCube> {
        CubeBuilder::new(&self.store, &self.config).build(Period::new(year, month))
    }

    // ── Lending dashboard ──────────────────────────────────────────

    pub fn dashboard(&self, year: i32, month: u32) -> MetricsResult<DashboardSummary> {
        reports::dashboard(&self.store, year, month)
    }

    pub fn monthly_totals(&self, year: i32, month: u32) -> MetricsResult<MonthlyTotals> {
        reports::monthly_totals(&self.store, year, month)
    }

    pub fn disbursement_series(&self, year: i32) -> MetricsResult<Vec<MonthlyPoint>> {
        reports::disbursement_series(&self.store, year)
    }

    pub fn repayment_series(&self, year: i32) -> MetricsResult<Vec<MonthlyPoint>> {
        reports::repayment_series(&self.store, year)
    }

    pub fn outstanding_series(&self, year: i32) -> MetricsResult<Vec<MonthlyPoint>> {
        reports::outstanding_series(&self.store, year)
    }

    pub fn disbursement_breakdown(
        &self,
        year: i32,
        month: u32,
        selector: SourceSelector,
    ) -> MetricsResult<DisbursementBreakdown> {
        reports::disbursement_breakdown(&self.store, year, month, selector)
    }

    pub fn repayment_breakdown(
        &self,
        year: i32,
        month: u32,
        selector: SourceSelector,
    ) -> MetricsResult<RepaymentBreakdown> {
        reports::repayment_breakdown(&self.store, year, month, selector)
    }

    pub fn disbursement_by_lender(&self, year: i32) -> MetricsResult<Vec<GroupedLabel>> {
        reports::disbursement_by_lender(&self.store, year)
    }

    pub fn repayment_by_channel(&self, year: i32) -> MetricsResult<Vec<GroupedLabel>> {
        reports::repayment_by_channel(&self.store, year)
    }

    pub fn outstanding_by_lender(&self, year: i32, month: u32) -> MetricsResult<Vec<GroupedLabel>> {
        reports::outstanding_by_lender(&self.store, year, month)
    }

    pub fn disbursement_daily(
        &self,
        year: i32,
        month: u32,
        selector: SourceSelector,
    ) -> MetricsResult<Vec<DailyPoint>> {
        reports::disbursement_daily(&self.store, year, month, selector)
    }

    pub fn repayment_daily(
        &self,
        year: i32,
        month: u32,
        selector: SourceSelector,
    ) -> MetricsResult<Vec<DailyPoint>> {
        reports::repayment_daily(&self.store, year, month, selector)
    }
}

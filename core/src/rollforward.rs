//! Insurance account balance rollforward.
//!
//! Each month's beginning balance derives from the previous month:
//!
//!   begin(m+1)[acct] = begin(m)[acct] + premium_paid(m)[acct] − claims(m)[acct]
//!
//! anchored at the epoch month, whose beginning balances are externally
//! supplied facts (the epoch_balance table). The walk is iterative, forward
//! from the epoch: the cost is one pair of grouped aggregate queries per
//! month of distance, bounded by RollforwardConfig::max_horizon_months.
//!
//! Nothing here is cached or persisted. Every call recomputes from source
//! facts, so there is no stale-balance invalidation problem; an error in the
//! walk would otherwise compound through every later month.

use crate::{
    config::RollforwardConfig,
    dense::{at, key_union},
    error::{MetricsError, MetricsResult},
    period::Period,
    store::LedgerStore,
    types::{Account, Amount},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Derived per-account position for one month. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalanceSnapshot {
    pub account: Account,
    pub period: Period,
    pub beginning_balance: Amount,
    pub premium_paid: Amount,
    pub claim_paid: Amount,
    pub available_balance: Amount,
}

pub struct BalanceRollforward<'a> {
    store: &'a LedgerStore,
    config: &'a RollforwardConfig,
}

impl<'a> BalanceRollforward<'a> {
    pub fn new(store: &'a LedgerStore, config: &'a RollforwardConfig) -> Self {
        Self { store, config }
    }

    /// Beginning balance per account as of `period`.
    ///
    /// The union of account keys grows as the walk encounters activity: an
    /// account with only a claim and no prior balance still yields a
    /// (possibly negative) beginning balance rather than being dropped.
    pub fn beginning_balance(
        &self,
        period: Period,
    ) -> MetricsResult<BTreeMap<Account, Amount>> {
        let epoch = self.config.epoch;
        let distance = period.months_since(epoch);

        if distance < 0 {
            return Err(MetricsError::PeriodBeforeEpoch {
                requested: period,
                epoch,
            });
        }
        if distance > self.config.max_horizon_months {
            return Err(MetricsError::HorizonExceeded {
                requested: period,
                epoch,
                distance,
                max_months: self.config.max_horizon_months,
            });
        }

        // Anchor: the one month whose balances are facts, not derivations.
        let mut balances = self.store.epoch_balances()?;
        let mut month = epoch;

        while month < period {
            let paid = self.store.premium_paid_by_account(month)?;
            let claimed = self.store.claims_by_account(month)?;

            let mut next = BTreeMap::new();
            for account in key_union(&[&balances, &paid, &claimed]) {
                let balance =
                    at(&balances, &account) + at(&paid, &account) - at(&claimed, &account);
                next.insert(account, balance);
            }

            balances = next;
            month = month.next();
        }

        log::debug!(
            "rollforward {period}: {} accounts, {} months from epoch",
            balances.len(),
            distance
        );
        Ok(balances)
    }

    /// Full snapshot for `period`: beginning balance plus that month's own
    /// premium and claim activity, one row per account in the union of the
    /// three maps, sorted by account ascending.
    pub fn snapshot(&self, period: Period) -> MetricsResult<Vec<AccountBalanceSnapshot>> {
        let beginning = self.beginning_balance(period)?;
        let paid = self.store.premium_paid_by_account(period)?;
        let claimed = self.store.claims_by_account(period)?;

        let rows = key_union(&[&beginning, &paid, &claimed])
            .into_iter()
            .map(|account| {
                let beginning_balance = at(&beginning, &account);
                let premium_paid = at(&paid, &account);
                let claim_paid = at(&claimed, &account);
                AccountBalanceSnapshot {
                    account,
                    period,
                    beginning_balance,
                    premium_paid,
                    claim_paid,
                    available_balance: beginning_balance + premium_paid - claim_paid,
                }
            })
            .collect();
        Ok(rows)
    }
}

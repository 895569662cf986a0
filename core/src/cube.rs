//! Three-dimensional reconciliation breakdown.
//!
//! For one month, three independently grouped aggregate sets — unpaid
//! premium, paid premium, claims — are reported over the complete
//! (source, lender, account) key universe. A triple present in any one set
//! appears in all three, zero-filled where absent: a reconciler must see the
//! absence of expected activity as an explicit zero, not a missing key.
//!
//! The flat beginning-balance map rides alongside at account grain; it is a
//! different grain and is never exploded into the triple structure.

use crate::{
    config::RollforwardConfig,
    dense::{at, key_union},
    error::MetricsResult,
    period::Period,
    rollforward::BalanceRollforward,
    store::{GroupedAmount, LedgerStore},
    types::{Account, Amount, Lender, SourceId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// source → lender → account → amount.
pub type CubeMap = BTreeMap<SourceId, BTreeMap<Lender, BTreeMap<Account, Amount>>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationCube {
    pub period: Period,
    pub beginning_balance: BTreeMap<Account, Amount>,
    pub premium_unpaid: CubeMap,
    pub premium_paid: CubeMap,
    pub claim: CubeMap,
}

pub struct CubeBuilder<'a> {
    store: &'a LedgerStore,
    config: &'a RollforwardConfig,
}

impl<'a> CubeBuilder<'a> {
    pub fn new(store: &'a LedgerStore, config: &'a RollforwardConfig) -> Self {
        Self { store, config }
    }

    pub fn build(&self, period: Period) -> MetricsResult<ReconciliationCube> {
        let unpaid = collect(self.store.premium_unpaid_by_key(period)?, "premium_unpaid");
        let paid = collect(self.store.premium_paid_by_key(period)?, "premium_paid");
        let claim = collect(self.store.claims_by_key(period)?, "claim");

        // The key universe spans all three sets; every (map, triple) cell is
        // then populated, defaulting absent entries to zero.
        let triples = key_union(&[&unpaid, &paid, &claim]);

        let mut cube = ReconciliationCube {
            period,
            beginning_balance: BalanceRollforward::new(self.store, self.config)
                .beginning_balance(period)?,
            premium_unpaid: CubeMap::new(),
            premium_paid: CubeMap::new(),
            claim: CubeMap::new(),
        };

        for triple in &triples {
            insert_cell(&mut cube.premium_unpaid, triple, at(&unpaid, triple));
            insert_cell(&mut cube.premium_paid, triple, at(&paid, triple));
            insert_cell(&mut cube.claim, triple, at(&claim, triple));
        }

        Ok(cube)
    }
}

type Triple = (SourceId, Lender, Account);

/// Flatten grouped rows into a triple-keyed sparse map. Rows missing a
/// source or lender are malformed at this grain and are excluded — logged as
/// a data-quality signal, not an error. A missing account is kept under an
/// empty-string account so the (source, lender) pair still reconciles.
fn collect(rows: Vec<GroupedAmount>, set_name: &str) -> BTreeMap<Triple, Amount> {
    let mut map = BTreeMap::new();
    for row in rows {
        let (source, lender) = match (row.source_id, row.lender) {
            (Some(s), Some(l)) => (s, l),
            (source, lender) => {
                log::warn!(
                    "{set_name}: dropping {:.2} with null group key (source={source:?}, lender={lender:?})",
                    row.amount
                );
                continue;
            }
        };
        let account = row.account.unwrap_or_default();
        *map.entry((source, lender, account)).or_insert(0.0) += row.amount;
    }
    map
}

fn insert_cell(cube: &mut CubeMap, (source, lender, account): &Triple, amount: Amount) {
    cube.entry(source.clone())
        .or_default()
        .entry(lender.clone())
        .or_default()
        .insert(account.clone(), amount);
}

//! Integration tests for the reconciliation cube.
//!
//! The cube must report every (source, lender, account) triple seen in any
//! of the three aggregate sets across all three sets, zero-filled where a
//! set had no activity, with claim accounts aliased and null group keys
//! excluded.

use chrono::NaiveDate;
use lendmetrics_core::{
    store::{ClaimRecord, LedgerStore, PremiumRecord},
    MetricsEngine, RollforwardConfig,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn premium(
    source: &str,
    lender: &str,
    account: &str,
    status: &str,
    gross: f64,
    net: f64,
    on: NaiveDate,
) -> PremiumRecord {
    PremiumRecord {
        source_id: Some(source.into()),
        lender_code: Some(lender.into()),
        bank_account: Some(account.into()),
        status: status.into(),
        gross_amount: gross,
        net_amount: net,
        created_date: on,
        transfer_date: if status == "PAID" { Some(on) } else { None },
    }
}

fn claim(source: &str, lender: &str, account: &str, amount: f64, on: NaiveDate) -> ClaimRecord {
    ClaimRecord {
        source_id: Some(source.into()),
        lender_name: Some(lender.into()),
        bank_account: account.into(),
        claim_amount: amount,
        claim_date: on,
    }
}

fn build() -> MetricsEngine {
    let store = LedgerStore::in_memory().expect("in-memory store");
    store.migrate().expect("migrate");
    MetricsEngine::new(store, RollforwardConfig::default())
}

fn cell(
    map: &lendmetrics_core::cube::CubeMap,
    source: &str,
    lender: &str,
    account: &str,
) -> Option<f64> {
    map.get(source)?.get(lender)?.get(account).copied()
}

#[test]
fn every_triple_appears_in_all_three_maps() {
    let engine = build();
    let store = engine.store();
    store.insert_epoch_balance("BANK_A", 100.0).unwrap();

    // Three disjoint triples, one per set.
    store
        .insert_premium(&premium("AP", "ADAPUNDI", "BANK_A", "PENDING", 200.0, 0.0, date(2024, 7, 1)))
        .unwrap();
    store
        .insert_premium(&premium("AP", "SEABANK", "BANK_B", "PAID", 330.0, 300.0, date(2024, 7, 5)))
        .unwrap();
    store
        .insert_claim(&claim("CN", "Credinex", "BANK_C", 80.0, date(2024, 7, 20)))
        .unwrap();

    let cube = engine.reconciliation_cube(2024, 7).unwrap();

    for (source, lender, account) in [
        ("AP", "ADAPUNDI", "BANK_A"),
        ("AP", "SEABANK", "BANK_B"),
        ("CN", "Credinex", "BANK_C"),
    ] {
        for (name, map) in [
            ("premium_unpaid", &cube.premium_unpaid),
            ("premium_paid", &cube.premium_paid),
            ("claim", &cube.claim),
        ] {
            assert!(
                cell(map, source, lender, account).is_some(),
                "{name} missing ({source}, {lender}, {account})"
            );
        }
    }

    // The populated cells carry their sums, the backfilled ones are zero.
    assert_eq!(cell(&cube.premium_unpaid, "AP", "ADAPUNDI", "BANK_A"), Some(200.0));
    assert_eq!(cell(&cube.premium_paid, "AP", "ADAPUNDI", "BANK_A"), Some(0.0));
    assert_eq!(cell(&cube.claim, "AP", "ADAPUNDI", "BANK_A"), Some(0.0));
    assert_eq!(cell(&cube.premium_paid, "AP", "SEABANK", "BANK_B"), Some(300.0));
    assert_eq!(cell(&cube.claim, "CN", "Credinex", "BANK_C"), Some(80.0));
    assert_eq!(cell(&cube.premium_unpaid, "CN", "Credinex", "BANK_C"), Some(0.0));
}

#[test]
fn claim_accounts_are_aliased_in_the_cube() {
    let engine = build();
    engine
        .store()
        .insert_claim(&claim("AP", "Adapundi", "STAR_DANA", 60.0, date(2024, 7, 3)))
        .unwrap();

    let cube = engine.reconciliation_cube(2024, 7).unwrap();
    assert_eq!(cell(&cube.claim, "AP", "Adapundi", "NDTL"), Some(60.0));
    assert_eq!(cell(&cube.claim, "AP", "Adapundi", "STAR_DANA"), None);
}

#[test]
fn rows_with_null_group_keys_are_excluded() {
    let engine = build();
    let store = engine.store();

    // Null lender: the whole row is malformed at cube grain.
    store
        .insert_premium(&PremiumRecord {
            source_id: Some("AP".into()),
            lender_code: None,
            bank_account: Some("BANK_A".into()),
            status: "PAID".into(),
            gross_amount: 110.0,
            net_amount: 100.0,
            created_date: date(2024, 7, 1),
            transfer_date: Some(date(2024, 7, 1)),
        })
        .unwrap();
    // Null source on a claim.
    store
        .insert_claim(&ClaimRecord {
            source_id: None,
            lender_name: Some("Adapundi".into()),
            bank_account: "BANK_A".into(),
            claim_amount: 40.0,
            claim_date: date(2024, 7, 2),
        })
        .unwrap();
    // One well-formed row so the cube is not empty.
    store
        .insert_premium(&premium("CN", "CREDINEX", "BANK_B", "PAID", 55.0, 50.0, date(2024, 7, 9)))
        .unwrap();

    let cube = engine.reconciliation_cube(2024, 7).unwrap();
    assert_eq!(cube.premium_paid.len(), 1);
    assert_eq!(cell(&cube.premium_paid, "CN", "CREDINEX", "BANK_B"), Some(50.0));
    assert!(cube.claim.get("AP").is_none());
}

#[test]
fn beginning_balance_rides_alongside_at_account_grain() {
    let engine = build();
    let store = engine.store();
    store.insert_epoch_balance("BANK_A", 1000.0).unwrap();
    store
        .insert_premium(&premium("AP", "ADAPUNDI", "BANK_A", "PAID", 330.0, 300.0, date(2024, 7, 10)))
        .unwrap();

    let cube = engine.reconciliation_cube(2024, 8).unwrap();
    // Flat map keyed only by account: July's paid premium has rolled in.
    assert_eq!(cube.beginning_balance.get("BANK_A"), Some(&1300.0));
    assert_eq!(cube.beginning_balance.len(), 1);
}

#[test]
fn unpaid_and_paid_are_grouped_independently() {
    let engine = build();
    let store = engine.store();

    // Same triple in both premium states; unpaid sums gross, paid sums net.
    store
        .insert_premium(&premium("AP", "ADAPUNDI", "BANK_A", "UNINVOICED", 150.0, 0.0, date(2024, 7, 2)))
        .unwrap();
    store
        .insert_premium(&premium("AP", "ADAPUNDI", "BANK_A", "PENDING", 50.0, 0.0, date(2024, 7, 4)))
        .unwrap();
    store
        .insert_premium(&premium("AP", "ADAPUNDI", "BANK_A", "PAID", 220.0, 200.0, date(2024, 7, 6)))
        .unwrap();

    let cube = engine.reconciliation_cube(2024, 7).unwrap();
    assert_eq!(cell(&cube.premium_unpaid, "AP", "ADAPUNDI", "BANK_A"), Some(200.0));
    assert_eq!(cell(&cube.premium_paid, "AP", "ADAPUNDI", "BANK_A"), Some(200.0));
    assert_eq!(cell(&cube.claim, "AP", "ADAPUNDI", "BANK_A"), Some(0.0));
}

//! metrics-runner: headless report runner for the lending metrics core.
//!
//! Usage:
//!   metrics-runner --db metrics.db --report account-balance --year 2024 --month 8
//!   metrics-runner --db metrics.db --report cube --year 2024 --month 7
//!   metrics-runner --db metrics.db --report dashboard --year 2024 --month 8
//!
//! Prints the selected report as JSON on stdout, standing in for the HTTP
//! layer that consumes the core in production.

use anyhow::{bail, Result};
use lendmetrics_core::{
    reports::SourceSelector, store::LedgerStore, MetricsEngine, RollforwardConfig,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let report = str_arg(&args, "--report").unwrap_or("dashboard");
    let year: i32 = parse_arg(&args, "--year", 2024);
    let month: u32 = parse_arg(&args, "--month", 6);
    let source = match str_arg(&args, "--source").unwrap_or("ALL") {
        "AP" => SourceSelector::Ap,
        "CN" => SourceSelector::Cn,
        _ => SourceSelector::All,
    };

    let store = LedgerStore::open(db)?;
    store.migrate()?;
    let engine = MetricsEngine::new(store, RollforwardConfig::default());

    let output = match report {
        "account-balance" => serde_json::to_string_pretty(&engine.account_balance(year, month)?)?,
        "cube" => serde_json::to_string_pretty(&engine.reconciliation_cube(year, month)?)?,
        "dashboard" => serde_json::to_string_pretty(&engine.dashboard(year, month)?)?,
        "monthly-totals" => serde_json::to_string_pretty(&engine.monthly_totals(year, month)?)?,
        "disbursement-series" => serde_json::to_string_pretty(&engine.disbursement_series(year)?)?,
        "repayment-series" => serde_json::to_string_pretty(&engine.repayment_series(year)?)?,
        "outstanding-series" => serde_json::to_string_pretty(&engine.outstanding_series(year)?)?,
        "disbursement-breakdown" => {
            serde_json::to_string_pretty(&engine.disbursement_breakdown(year, month, source)?)?
        }
        "repayment-breakdown" => {
            serde_json::to_string_pretty(&engine.repayment_breakdown(year, month, source)?)?
        }
        "disbursement-by-lender" => {
            serde_json::to_string_pretty(&engine.disbursement_by_lender(year)?)?
        }
        "repayment-by-channel" => {
            serde_json::to_string_pretty(&engine.repayment_by_channel(year)?)?
        }
        "outstanding-by-lender" => {
            serde_json::to_string_pretty(&engine.outstanding_by_lender(year, month)?)?
        }
        "disbursement-daily" => {
            serde_json::to_string_pretty(&engine.disbursement_daily(year, month, source)?)?
        }
        "repayment-daily" => {
            serde_json::to_string_pretty(&engine.repayment_daily(year, month, source)?)?
        }
        other => bail!("unknown report: {other}"),
    };

    println!("{output}");
    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    str_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

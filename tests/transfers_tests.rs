// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use hearthbook::commands::{reports, transactions, transfers};
use hearthbook::config::EngineConfig;
use hearthbook::ledger::TransferStatus;
use hearthbook::{cli, db};
use rusqlite::Connection;
use rust_decimal_macros::dec;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn leaf(args: &[&str]) -> clap::ArgMatches {
    let m = cli::build_cli().get_matches_from(std::iter::once("hearthbook").chain(args.iter().copied()));
    let (_, group) = m.subcommand().unwrap();
    let (_, leaf) = group.subcommand().unwrap();
    leaf.clone()
}

fn transfer(conn: &Connection, cfg: &EngineConfig, id: &str, date: &str, amount: &str, account: &str) {
    let m = leaf(&[
        "tx", "add", "--id", id, "--date", date, "--amount", amount, "--account", account,
        "--category", "Transfer", "--transfer",
    ]);
    transactions::add(conn, cfg, &m).unwrap();
}

fn seed(conn: &Connection, cfg: &EngineConfig, inflow_amount: &str) {
    transfer(conn, cfg, "out", "2024-03-01", "-1000", "Current");
    transfer(conn, cfg, "in", "03/03/2024", inflow_amount, "Savings");
    let m = leaf(&[
        "tx", "add", "--id", "shop", "--date", "2024-03-02", "--amount", "-40", "--account",
        "Current", "--category", "Groceries",
    ]);
    transactions::add(conn, cfg, &m).unwrap();
}

#[test]
fn review_suggests_within_tolerance() {
    let conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg, "1005");

    let data = transfers::review_data(&conn, &cfg, &leaf(&["transfers", "review"])).unwrap();
    assert_eq!(data.suggestions.len(), 1);
    let s = &data.suggestions[0];
    assert_eq!(s.outflow.id, "out");
    assert_eq!(s.inflow.id, "in");
    assert_eq!(s.inflow.date, "2024-03-03");
    assert_eq!(s.date_diff_days, 2);
    assert_eq!(s.amount_diff, dec!(5));
    assert!(data.unmatched.is_empty());
    assert!(data.paired.is_empty());
}

#[test]
fn review_is_idempotent() {
    let conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg, "1005");
    let m = leaf(&["transfers", "review"]);
    let a = serde_json::to_value(transfers::review_data(&conn, &cfg, &m).unwrap()).unwrap();
    let b = serde_json::to_value(transfers::review_data(&conn, &cfg, &m).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn outside_tolerance_is_explained() {
    let conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg, "1006");

    let data = transfers::review_data(&conn, &cfg, &leaf(&["transfers", "review"])).unwrap();
    assert!(data.suggestions.is_empty());
    assert_eq!(data.unmatched.len(), 2);
    for t in &data.unmatched {
        assert!(t.debug_reason.as_deref().unwrap().contains("amount tolerance"));
    }
}

#[test]
fn confirm_then_unpair() {
    let conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg, "1005");

    let pair = transfers::confirm(
        &conn,
        &cfg,
        &leaf(&["transfers", "confirm", "--outflow", "out", "--inflow", "in"]),
    )
    .unwrap();
    assert_eq!(pair.from_transaction_id, "out");
    assert_eq!(pair.to_transaction_id, "in");

    let data = transfers::review_data(&conn, &cfg, &leaf(&["transfers", "review"])).unwrap();
    assert!(data.suggestions.is_empty());
    assert!(data.unmatched.is_empty());
    assert_eq!(data.paired.len(), 1);
    assert_eq!(data.paired[0].outflow.as_ref().unwrap().id, "out");

    let rows = transactions::query_rows(&conn, &cfg, &leaf(&["tx", "list"])).unwrap();
    let out_row = rows.iter().find(|r| r.id == "out").unwrap();
    assert_eq!(out_row.transfer_status, TransferStatus::Paired);

    // a pair can't be confirmed twice
    assert!(
        transfers::confirm(
            &conn,
            &cfg,
            &leaf(&["transfers", "confirm", "--outflow", "out", "--inflow", "in"]),
        )
        .is_err()
    );

    let unpair = cli::build_cli().get_matches_from([
        "hearthbook", "transfers", "unpair", "--id", pair.id.as_str(),
    ]);
    let (_, group) = unpair.subcommand().unwrap();
    transfers::handle(&conn, &cfg, group).unwrap();
    let data = transfers::review_data(&conn, &cfg, &leaf(&["transfers", "review"])).unwrap();
    assert_eq!(data.suggestions.len(), 1);
    assert!(data.paired.is_empty());
}

#[test]
fn manual_pair_outside_tolerance() {
    let conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg, "1200");

    let m = leaf(&["transfers", "confirm", "--outflow", "in", "--inflow", "out"]);
    assert!(transfers::confirm(&conn, &cfg, &m).is_err());

    let m = leaf(&["transfers", "confirm", "--outflow", "out", "--inflow", "in"]);
    transfers::confirm(&conn, &cfg, &m).unwrap();
    assert_eq!(db::load_pairs(&conn, "default").unwrap().len(), 1);
}

#[test]
fn confirm_unknown_transaction_fails() {
    let conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg, "1005");
    let m = leaf(&["transfers", "confirm", "--outflow", "shop", "--inflow", "in"]);
    assert!(transfers::confirm(&conn, &cfg, &m).is_err());
    assert!(db::load_pairs(&conn, "default").unwrap().is_empty());
}

#[test]
fn confirm_all_accepts_suggestions() {
    let conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg, "1000");
    transfer(&conn, &cfg, "out2", "2024-03-20", "-50", "Current");
    transfer(&conn, &cfg, "in2", "2024-03-21", "50", "Savings");

    let pairs = transfers::confirm_all(&conn, &cfg, &leaf(&["transfers", "confirm-all"])).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(db::load_pairs(&conn, "default").unwrap().len(), 2);
}

#[test]
fn confirm_all_is_all_or_nothing() {
    let conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg, "1000");
    transfer(&conn, &cfg, "out2", "2024-03-20", "-50", "Current");
    transfer(&conn, &cfg, "in2", "2024-03-21", "50", "Savings");
    conn.execute_batch(
        "CREATE TRIGGER one_pair_only BEFORE INSERT ON transfer_pairs
         WHEN (SELECT COUNT(*) FROM transfer_pairs) >= 1
         BEGIN SELECT RAISE(ABORT, 'pair limit'); END;",
    )
    .unwrap();

    assert!(transfers::confirm_all(&conn, &cfg, &leaf(&["transfers", "confirm-all"])).is_err());
    assert!(db::load_pairs(&conn, "default").unwrap().is_empty());
}

#[test]
fn paired_and_transfer_rows_stay_out_of_spending() {
    let conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg, "1005");
    let m = leaf(&["report", "expenses", "--month", "2024-03"]);
    let report = reports::expenses_report(&conn, &cfg, &m).unwrap().report;
    assert_eq!(report.total_amount, dec!(-40));
    assert_eq!(report.categories.len(), 1);
    assert_eq!(report.categories[0].name, "Groceries");
}

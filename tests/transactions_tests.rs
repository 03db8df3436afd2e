// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use hearthbook::config::EngineConfig;
use hearthbook::ledger::TransferStatus;
use hearthbook::{cli, commands::transactions, db};
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

fn add(conn: &Connection, cfg: &EngineConfig, date: &str, amount: &str, category: &str) {
    let mut args = vec![
        "tx", "add", "--date", date, "--amount", amount, "--account", "Current", "--description",
        "test",
    ];
    if !category.is_empty() {
        args.extend(["--category", category]);
    }
    transactions::add(conn, cfg, &leaf(&args)).unwrap();
}

#[test]
fn list_limit_respected() {
    let conn = setup();
    let cfg = EngineConfig::default();
    for d in ["2025-01-01", "02/01/2025", "2025-01-03"] {
        add(&conn, &cfg, d, "-10", "Groceries");
    }
    let rows = transactions::query_rows(&conn, &cfg, &leaf(&["tx", "list", "--limit", "2"])).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2025-01-03");
    assert_eq!(rows[1].date, "2025-01-02");
    assert_eq!(rows[0].amount, Some(dec!(-10)));
    assert_eq!(rows[0].currency, "GBP");
    assert_eq!(rows[0].direction, "Debit");
}

#[test]
fn list_filters_by_month() {
    let conn = setup();
    let cfg = EngineConfig::default();
    add(&conn, &cfg, "2025-01-31", "-10", "Groceries");
    add(&conn, &cfg, "01/02/2025", "-20", "Groceries");
    let rows =
        transactions::query_rows(&conn, &cfg, &leaf(&["tx", "list", "--month", "2025-02"])).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "2025-02-01");
}

#[test]
fn transfer_category_flags_transaction() {
    let conn = setup();
    let cfg = EngineConfig::default();
    add(&conn, &cfg, "2025-01-05", "-250", "Transfer to savings");
    let txs = db::load_transactions(&conn, "default").unwrap();
    assert!(txs[0].is_transfer);
    let rows = transactions::query_rows(&conn, &cfg, &leaf(&["tx", "list"])).unwrap();
    assert_eq!(rows[0].transfer_status, TransferStatus::Unmatched);
}

#[test]
fn review_queue_excludes_categorised() {
    let conn = setup();
    let cfg = EngineConfig::default();
    add(&conn, &cfg, "2025-01-05", "-12", "");
    add(&conn, &cfg, "2025-01-06", "-15", "Fuel");
    let flagged = leaf(&[
        "tx", "add", "--date", "2025-01-07", "--amount", "-3", "--account", "Card", "--category",
        "Fuel", "--review",
    ]);
    transactions::add(&conn, &cfg, &flagged).unwrap();

    let items = transactions::review_items(&conn, &cfg, &leaf(&["tx", "review"])).unwrap();
    let reasons: Vec<&str> = items.iter().map(|i| i.reason.as_str()).collect();
    assert_eq!(reasons, vec!["Flagged for review", "Uncategorised"]);
}

#[test]
fn workspaces_are_isolated() {
    let conn = setup();
    let cfg = EngineConfig::default();
    add(&conn, &cfg, "2025-01-05", "-12", "Fuel");
    let other = leaf(&["tx", "list", "--workspace", "other"]);
    assert!(transactions::query_rows(&conn, &cfg, &other).unwrap().is_empty());
}

#[test]
fn add_through_handler_records_row() {
    let conn = setup();
    let cfg = EngineConfig::default();
    let m = cli::build_cli().get_matches_from([
        "hearthbook", "tx", "add", "--date", "2025-01-09", "--amount", "-4.20", "--account", "Card",
    ]);
    let (_, tx_m) = m.subcommand().unwrap();
    transactions::handle(&conn, &cfg, tx_m).unwrap();
    let txs = db::load_transactions(&conn, "default").unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, "-4.20");
}

#[test]
fn add_rejects_unreadable_date() {
    let conn = setup();
    let cfg = EngineConfig::default();
    let m = leaf(&["tx", "add", "--date", "31/02/2025", "--amount", "-1", "--account", "Card"]);
    assert!(transactions::add(&conn, &cfg, &m).is_err());
    assert!(db::load_transactions(&conn, "default").unwrap().is_empty());
}

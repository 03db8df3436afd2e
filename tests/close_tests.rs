// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use hearthbook::commands::{close, transactions};
use hearthbook::config::EngineConfig;
use hearthbook::error::CloseError;
use hearthbook::models::CloseStatus;
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

fn add(conn: &Connection, cfg: &EngineConfig, date: &str, amount: &str, category: &str) {
    let m = leaf(&[
        "tx", "add", "--date", date, "--amount", amount, "--account", "Current", "--category",
        category,
    ]);
    transactions::add(conn, cfg, &m).unwrap();
}

fn seed(conn: &Connection, cfg: &EngineConfig) {
    add(conn, cfg, "2024-03-01", "2000", "Income");
    add(conn, cfg, "2024-03-04", "-150", "Groceries");
    add(conn, cfg, "2024-03-18", "-50", "Groceries");
}

#[test]
fn close_freezes_totals() {
    let mut conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg);

    let (record, snapshot) =
        close::close(&mut conn, &cfg, &leaf(&["close", "close", "--month", "2024-03", "--by", "sam"]))
            .unwrap();
    assert_eq!(record.status, CloseStatus::Closed);
    assert_eq!(record.closed_by.as_deref(), Some("sam"));
    assert_eq!(snapshot.payload.income_total, dec!(2000));
    assert_eq!(snapshot.payload.expense_total, dec!(-200));
    assert_eq!(snapshot.payload.net_cash_flow, dec!(1800));
    assert_eq!(snapshot.payload.category_breakdown["Groceries"], dec!(-200));
    assert_eq!(snapshot.payload.transaction_count, 3);

    // late arrival does not move a closed month
    add(&conn, &cfg, "2024-03-20", "-75", "Dining");
    let status = leaf(&["close", "status", "--month", "2024-03"]);
    let s = close::summary(&conn, &cfg, &status).unwrap();
    assert!(s.frozen);
    assert_eq!(s.snapshot_id.as_deref(), Some(snapshot.id.as_str()));
    assert_eq!(s.totals, snapshot.payload);
}

#[test]
fn close_reopen_close_keeps_both_snapshots() {
    let mut conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg);
    let month = ["--month", "2024-03"];

    let (_, first) =
        close::close(&mut conn, &cfg, &leaf(&["close", "close", month[0], month[1]])).unwrap();
    let reopened =
        close::reopen(&mut conn, &cfg, &leaf(&["close", "reopen", month[0], month[1], "--by", "alex"]))
            .unwrap();
    assert_eq!(reopened.status, CloseStatus::Open);
    assert_eq!(reopened.reopened_by.as_deref(), Some("alex"));

    add(&conn, &cfg, "2024-03-20", "-75", "Dining");
    let live = close::summary(&conn, &cfg, &leaf(&["close", "status", month[0], month[1]])).unwrap();
    assert!(!live.frozen);
    assert_eq!(live.status, CloseStatus::Open);
    assert_eq!(live.totals.expense_total, dec!(-275));

    let (record, second) =
        close::close(&mut conn, &cfg, &leaf(&["close", "close", month[0], month[1]])).unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(record.snapshot_id.as_deref(), Some(second.id.as_str()));
    assert_eq!(record.reopened_by.as_deref(), Some("alex"));

    let stored = db::load_snapshots(&conn, "default", Some("2024-03".parse().unwrap())).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].payload, first.payload);
    assert_eq!(stored[1].payload.expense_total, dec!(-275));
}

#[test]
fn invalid_transitions_are_rejected() {
    let mut conn = setup();
    let cfg = EngineConfig::default();
    seed(&conn, &cfg);
    let m = leaf(&["close", "reopen", "--month", "2024-03"]);
    let err = close::reopen(&mut conn, &cfg, &m).unwrap_err();
    assert_eq!(
        err.downcast_ref::<CloseError>(),
        Some(&CloseError::NotClosed("2024-03".parse().unwrap()))
    );

    let m = leaf(&["close", "close", "--month", "2024-03"]);
    close::close(&mut conn, &cfg, &m).unwrap();
    let err = close::close(&mut conn, &cfg, &m).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CloseError>(),
        Some(CloseError::AlreadyClosed(_))
    ));
    assert_eq!(db::load_snapshots(&conn, "default", None).unwrap().len(), 1);
}

#[test]
fn empty_month_closes_with_zero_totals() {
    let mut conn = setup();
    let cfg = EngineConfig::default();
    let (_, snapshot) =
        close::close(&mut conn, &cfg, &leaf(&["close", "close", "--month", "2023-12"])).unwrap();
    assert_eq!(snapshot.payload.net_cash_flow, dec!(0));
    assert_eq!(snapshot.payload.transaction_count, 0);
    assert!(snapshot.payload.category_breakdown.is_empty());
}

#[test]
fn bad_month_is_rejected() {
    let mut conn = setup();
    let cfg = EngineConfig::default();
    let m = leaf(&["close", "close", "--month", "2024-13"]);
    assert!(close::close(&mut conn, &cfg, &m).is_err());
}

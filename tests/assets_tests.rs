// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use hearthbook::commands::assets;
use hearthbook::config::EngineConfig;
use hearthbook::models::AssetStatus;
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

fn add_asset(conn: &Connection, cfg: &EngineConfig, id: &str, name: &str, asset_type: &str) {
    let m = leaf(&["asset", "add", "--id", id, "--name", name, "--type", asset_type]);
    assets::add(conn, cfg, &m).unwrap();
}

fn value(conn: &Connection, cfg: &EngineConfig, id: &str, v: &str, at: &str) {
    let m = leaf(&["asset", "value", "--asset", id, "--value", v, "--at", at]);
    assets::record_value(conn, cfg, &m).unwrap();
}

#[test]
fn liabilities_count_against_net_worth() {
    let conn = setup();
    let cfg = EngineConfig::default();
    add_asset(&conn, &cfg, "house", "House", "Mortgage");
    add_asset(&conn, &cfg, "cash", "Cash", "cash");
    value(&conn, &cfg, "house", "500000", "2024-01-10");
    value(&conn, &cfg, "cash", "500000", "2024-01-12");

    let overview = assets::overview_data(&conn, &cfg, &leaf(&["asset", "overview"])).unwrap();
    assert_eq!(overview.total_assets, dec!(500000));
    assert_eq!(overview.total_liabilities, dec!(500000));
    assert_eq!(overview.net_worth, dec!(0));
    let house = overview.cards.iter().find(|c| c.asset_id == "house").unwrap();
    assert_eq!(house.signed_value, Some(dec!(-500000)));

    let series = assets::networth_data(&conn, &cfg, &leaf(&["asset", "networth"])).unwrap();
    assert_eq!(series.points.len(), 1);
    assert_eq!(series.points[0].net_worth, dec!(0));
    assert_eq!(series.by_type["mortgage"][0].value, dec!(-500000));
}

#[test]
fn disposal_truncates_series() {
    let conn = setup();
    let cfg = EngineConfig::default();
    add_asset(&conn, &cfg, "car", "Car", "vehicle");
    add_asset(&conn, &cfg, "cash", "Cash", "cash");
    value(&conn, &cfg, "car", "8000", "2024-01-05");
    value(&conn, &cfg, "cash", "1000", "2024-01-05");
    value(&conn, &cfg, "cash", "1500", "2024-08-05");

    let m = leaf(&["asset", "dispose", "--id", "car", "--at", "15/06/2024"]);
    assets::dispose(&conn, &cfg, &m).unwrap();
    let stored = db::load_assets(&conn, "default").unwrap();
    let car = stored.iter().find(|a| a.id == "car").unwrap();
    assert_eq!(car.status, AssetStatus::Disposed);
    assert_eq!(car.disposed_at.as_deref(), Some("2024-06-15"));

    let series = assets::networth_data(&conn, &cfg, &leaf(&["asset", "networth"])).unwrap();
    let months: Vec<String> = series.points.iter().map(|p| p.month.to_string()).collect();
    assert_eq!(months.first().map(String::as_str), Some("2024-01"));
    assert_eq!(months.last().map(String::as_str), Some("2024-08"));
    assert_eq!(series.points.len(), 8);
    assert_eq!(series.points[4].net_worth, dec!(9000));
    assert_eq!(series.points[5].net_worth, dec!(1000));
    assert_eq!(series.points[7].net_worth, dec!(1500));
    assert_eq!(series.by_asset["car"].len(), 5);

    // disposed assets are closed to new valuations and to a second disposal
    let m = leaf(&["asset", "value", "--asset", "car", "--value", "7000"]);
    assert!(assets::record_value(&conn, &cfg, &m).is_err());
    let m = leaf(&["asset", "dispose", "--id", "car"]);
    assert!(assets::dispose(&conn, &cfg, &m).is_err());

    let overview = assets::overview_data(&conn, &cfg, &leaf(&["asset", "overview"])).unwrap();
    assert_eq!(overview.net_worth, dec!(1500));
    assert_eq!(overview.cards.last().unwrap().asset_id, "car");
}

#[test]
fn unlinked_values_become_placeholder_assets() {
    let conn = setup();
    let cfg = EngineConfig::default();
    let m = leaf(&[
        "asset", "value", "--name", "Premium Bonds", "--type", "savings", "--value", "250",
        "--at", "2024-02-01",
    ]);
    let v = assets::record_value(&conn, &cfg, &m).unwrap();
    assert_eq!(v.asset_id, None);
    assert_eq!(v.value_in_home_currency, Some(dec!(250)));

    let overview = assets::overview_data(&conn, &cfg, &leaf(&["asset", "overview"])).unwrap();
    assert!(overview.has_assets);
    assert_eq!(overview.cards[0].asset_id, "unlinked:premium bonds");
    assert!(!overview.cards[0].linked);
}

#[test]
fn foreign_values_use_fx_rate() {
    let conn = setup();
    let cfg = EngineConfig::default();
    let m = leaf(&[
        "asset", "add", "--id", "depot", "--name", "Depot", "--type", "investment", "--currency",
        "eur",
    ]);
    assets::add(&conn, &cfg, &m).unwrap();
    let m = leaf(&[
        "asset", "value", "--asset", "depot", "--value", "1000", "--fx-rate", "0.85", "--at",
        "2024-02-01",
    ]);
    let v = assets::record_value(&conn, &cfg, &m).unwrap();
    assert_eq!(v.currency, "EUR");
    assert_eq!(v.value_in_home_currency, Some(dec!(850)));

    let overview = assets::overview_data(&conn, &cfg, &leaf(&["asset", "overview"])).unwrap();
    assert_eq!(overview.net_worth, dec!(850));
}

#[test]
fn foreign_values_need_a_conversion() {
    let conn = setup();
    let cfg = EngineConfig::default();
    let m = leaf(&[
        "asset", "add", "--id", "yen", "--name", "Yen account", "--type", "cash", "--currency",
        "JPY",
    ]);
    assets::add(&conn, &cfg, &m).unwrap();

    let m = leaf(&["asset", "value", "--asset", "yen", "--value", "1000000", "--at", "2024-02-01"]);
    assert!(assets::record_value(&conn, &cfg, &m).is_err());
    assert!(db::load_asset_values(&conn, "default").unwrap().is_empty());

    let m = leaf(&[
        "asset", "value", "--asset", "yen", "--value", "1000000", "--home-value", "5200", "--at",
        "2024-02-01",
    ]);
    let v = assets::record_value(&conn, &cfg, &m).unwrap();
    assert_eq!(v.value_in_home_currency, Some(dec!(5200)));

    let overview = assets::overview_data(&conn, &cfg, &leaf(&["asset", "overview"])).unwrap();
    assert_eq!(overview.net_worth, dec!(5200));
}

#[test]
fn removed_values_are_ignored() {
    let conn = setup();
    let cfg = EngineConfig::default();
    add_asset(&conn, &cfg, "cash", "Cash", "cash");
    value(&conn, &cfg, "cash", "100", "2024-01-01");
    let records = db::load_asset_values(&conn, "default").unwrap();
    let id = records[0].id.clone();

    let removed = cli::build_cli().get_matches_from(["hearthbook", "asset", "remove-value", "--id", id.as_str()]);
    let (_, group) = removed.subcommand().unwrap();
    assets::handle(&conn, &cfg, group).unwrap();

    let records = db::load_asset_values(&conn, "default").unwrap();
    assert_eq!(records.len(), 1);
    assert!(!records[0].is_live());
    let overview = assets::overview_data(&conn, &cfg, &leaf(&["asset", "overview"])).unwrap();
    assert_eq!(overview.net_worth, dec!(0));
    assert_eq!(overview.cards[0].latest_value, None);
}

#[test]
fn no_assets_yields_empty_shapes() {
    let conn = setup();
    let cfg = EngineConfig::default();
    let overview = assets::overview_data(&conn, &cfg, &leaf(&["asset", "overview"])).unwrap();
    assert!(!overview.has_assets);
    let series = assets::networth_data(&conn, &cfg, &leaf(&["asset", "networth"])).unwrap();
    assert!(series.points.is_empty());
}

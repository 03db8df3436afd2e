// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use tracing::info;

use super::{home_currency, output_flags, required, workspace};
use crate::assets::{AssetOverview, NO_ASSETS, NetWorthSeries, asset_overview, net_worth_series};
use crate::config::EngineConfig;
use crate::db;
use crate::models::{AssetEntity, AssetStatus, AssetValueRecord};
use crate::normalize::{normalize_date_to_iso, parse_timestamp};
use crate::utils::{fmt_money, maybe_print_json, now_rfc3339, parse_decimal, pretty_table, today};

pub fn handle(conn: &Connection, cfg: &EngineConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let a = add(conn, cfg, sub)?;
            println!("Added {} '{}' ({})", a.asset_type, a.name, a.id);
        }
        Some(("value", sub)) => {
            let v = record_value(conn, cfg, sub)?;
            println!(
                "Recorded {} {} for '{}' at {}",
                v.value.map(|d| d.to_string()).unwrap_or_default(),
                v.currency,
                v.asset_name,
                v.recorded_at
            );
        }
        Some(("remove-value", sub)) => remove_value(conn, cfg, sub)?,
        Some(("dispose", sub)) => dispose(conn, cfg, sub)?,
        Some(("overview", sub)) => overview(conn, cfg, sub)?,
        Some(("networth", sub)) => networth(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn add(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<AssetEntity> {
    let ws = workspace(sub, cfg);
    let currency = match sub.get_one::<String>("currency") {
        Some(c) => c.to_uppercase(),
        None => home_currency(conn, cfg)?,
    };
    let a = AssetEntity {
        id: sub
            .get_one::<String>("id")
            .cloned()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: required(sub, "name")?.trim().to_string(),
        asset_type: required(sub, "type")?.trim().to_lowercase(),
        owner: sub.get_one::<String>("owner").cloned().unwrap_or_default(),
        status: AssetStatus::Active,
        currency,
        disposed_at: None,
    };
    db::insert_asset(conn, &ws, &a)?;
    Ok(a)
}

fn optional_decimal(sub: &clap::ArgMatches, name: &str) -> Result<Option<rust_decimal::Decimal>> {
    sub.get_one::<String>(name)
        .map(|s| parse_decimal(s))
        .transpose()
}

/// Append a valuation, linked to a registered asset when `--asset` is given.
pub fn record_value(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<AssetValueRecord> {
    let ws = workspace(sub, cfg);
    let home = home_currency(conn, cfg)?;
    let value = parse_decimal(required(sub, "value")?)?;

    let (asset_id, asset_name, asset_type, default_ccy) = match sub.get_one::<String>("asset") {
        Some(id) => {
            let assets = db::load_assets(conn, &ws)?;
            let a = assets
                .into_iter()
                .find(|a| &a.id == id)
                .with_context(|| format!("No asset '{}' in workspace '{}'", id, ws))?;
            if a.status == AssetStatus::Disposed {
                bail!("Asset '{}' is disposed", a.name);
            }
            (Some(a.id), a.name, a.asset_type, a.currency)
        }
        None => {
            let name = sub
                .get_one::<String>("name")
                .context("Either --asset or --name/--type is required")?;
            let asset_type = sub
                .get_one::<String>("type")
                .context("--type is required for a valuation without --asset")?;
            (None, name.clone(), asset_type.trim().to_lowercase(), home.clone())
        }
    };
    let currency = sub
        .get_one::<String>("currency")
        .map(|c| c.to_uppercase())
        .unwrap_or(default_ccy);

    let fx_rate = optional_decimal(sub, "fx-rate")?;
    let value_in_home_currency = match optional_decimal(sub, "home-value")? {
        Some(v) => v,
        None if currency == home => value,
        None => match fx_rate {
            Some(r) => value * r,
            None => bail!(
                "Value is in {} but the home currency is {}; pass --home-value or --fx-rate",
                currency,
                home
            ),
        },
    };

    let recorded_at = match sub.get_one::<String>("at") {
        Some(at) if parse_timestamp(at).is_some() => at.clone(),
        Some(at) => bail!("Unrecognised date or timestamp '{}'", at),
        None => now_rfc3339(),
    };

    let v = AssetValueRecord {
        id: uuid::Uuid::new_v4().to_string(),
        asset_id,
        asset_name,
        asset_type,
        value: Some(value),
        currency,
        value_in_home_currency: Some(value_in_home_currency),
        fx_rate,
        fx_source: sub.get_one::<String>("fx-source").cloned(),
        recorded_at,
        source: "manual".to_string(),
        notes: sub.get_one::<String>("notes").cloned(),
        deleted_at: None,
    };
    db::insert_asset_value(conn, &ws, &v)?;
    Ok(v)
}

fn remove_value(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let ws = workspace(sub, cfg);
    let id = required(sub, "id")?;
    if db::soft_delete_asset_value(conn, &ws, id, &now_rfc3339())? == 0 {
        bail!("No live valuation '{}' in workspace '{}'", id, ws);
    }
    println!("Removed valuation {}", id);
    Ok(())
}

pub fn dispose(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let ws = workspace(sub, cfg);
    let id = required(sub, "id")?;
    let at = match sub.get_one::<String>("at") {
        Some(at) if parse_timestamp(at).is_some() => normalize_date_to_iso(at),
        Some(at) => bail!("Unrecognised disposal date '{}'", at),
        None => today().format("%Y-%m-%d").to_string(),
    };
    if db::dispose_asset(conn, &ws, id, &at)? == 0 {
        bail!("No active asset '{}' in workspace '{}'", id, ws);
    }
    info!(workspace = %ws, asset = %id, disposed_at = %at, "asset disposed");
    println!("Disposed {} on {}", id, at);
    Ok(())
}

pub fn overview_data(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<AssetOverview> {
    let ws = workspace(sub, cfg);
    let records = db::load_asset_values(conn, &ws)?;
    let entities = db::load_assets(conn, &ws)?;
    Ok(asset_overview(&records, &entities))
}

fn overview(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let data = overview_data(conn, cfg, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &data)? {
        return Ok(());
    }
    if !data.has_assets {
        println!("{}", NO_ASSETS);
        return Ok(());
    }
    let ccy = home_currency(conn, cfg)?;
    let rows = data
        .cards
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.asset_type.clone(),
                c.owner.clone(),
                c.status.as_str().to_string(),
                c.display_value(),
                c.recorded_at.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Name", "Type", "Owner", "Status", "Value", "Recorded"], rows)
    );
    println!(
        "Assets {}  Liabilities {}  Net worth {}",
        fmt_money(&data.total_assets, &ccy),
        fmt_money(&data.total_liabilities, &ccy),
        fmt_money(&data.net_worth, &ccy)
    );
    Ok(())
}

pub fn networth_data(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<NetWorthSeries> {
    let ws = workspace(sub, cfg);
    let records = db::load_asset_values(conn, &ws)?;
    let entities = db::load_assets(conn, &ws)?;
    Ok(net_worth_series(&records, &entities))
}

fn networth(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let series = networth_data(conn, cfg, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &series)? {
        return Ok(());
    }
    let ccy = home_currency(conn, cfg)?;
    let rows = series
        .points
        .iter()
        .map(|p| {
            vec![
                p.month.to_string(),
                fmt_money(&p.assets, &ccy),
                fmt_money(&p.liabilities, &ccy),
                fmt_money(&p.net_worth, &ccy),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Assets", "Liabilities", "Net worth"], rows)
    );
    Ok(())
}

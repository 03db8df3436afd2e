// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use super::{required, workspace};
use crate::config::EngineConfig;
use crate::db;
use crate::ledger::ledger_rows;

pub fn handle(conn: &Connection, cfg: &EngineConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("ledger", sub)) => export_ledger(conn, cfg, sub),
        _ => Ok(()),
    }
}

fn export_ledger(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = required(sub, "format")?.to_lowercase();
    let out = required(sub, "out")?;
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let ws = workspace(sub, cfg);
    let txs = db::load_transactions(conn, &ws)?;
    let pairs = db::load_pairs(conn, &ws)?;
    let rows = ledger_rows(&txs, &pairs);

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record([
            "id",
            "date",
            "description",
            "account",
            "amount",
            "currency",
            "direction",
            "category",
            "transfer",
            "needs_review",
        ])?;
        for r in &rows {
            let amount = r.amount.map(|a| a.to_string()).unwrap_or_default();
            wtr.write_record([
                r.id.as_str(),
                r.date.as_str(),
                r.description.as_str(),
                r.account_name.as_str(),
                amount.as_str(),
                r.currency.as_str(),
                r.direction,
                r.category.as_str(),
                r.transfer_status.as_str(),
                if r.needs_review { "true" } else { "false" },
            ])?;
        }
        wtr.flush()?;
    } else {
        std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
    }
    println!("Exported {} ledger rows to {}", rows.len(), out);
    Ok(())
}

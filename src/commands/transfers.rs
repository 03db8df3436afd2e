// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use tracing::info;

use super::{output_flags, required, workspace};
use crate::config::EngineConfig;
use crate::db;
use crate::models::{Direction, TransferPair};
use crate::transfers::{TransferReviewData, TransferTransaction, review_transfers};
use crate::utils::{maybe_print_json, now_rfc3339, pretty_table};

pub fn handle(conn: &Connection, cfg: &EngineConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("review", sub)) => review(conn, cfg, sub)?,
        Some(("confirm", sub)) => {
            let pair = confirm(conn, cfg, sub)?;
            println!(
                "Paired {} -> {} (pair {})",
                pair.from_transaction_id, pair.to_transaction_id, pair.id
            );
        }
        Some(("confirm-all", sub)) => {
            let pairs = confirm_all(conn, cfg, sub)?;
            println!("Confirmed {} transfer pair(s)", pairs.len());
        }
        Some(("unpair", sub)) => unpair(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn review_data(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<TransferReviewData> {
    let ws = workspace(sub, cfg);
    let txs = db::load_transactions(conn, &ws)?;
    let pairs = db::load_pairs(conn, &ws)?;
    Ok(review_transfers(&txs, &pairs, &cfg.transfer))
}

fn side(t: &TransferTransaction) -> String {
    format!("{} {} {} ({})", t.date, t.account_name, t.amount, t.id)
}

fn review(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let data = review_data(conn, cfg, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &data)? {
        return Ok(());
    }

    println!("Suggested pairs");
    let rows = data
        .suggestions
        .iter()
        .map(|s| {
            vec![
                side(&s.outflow),
                side(&s.inflow),
                s.date_diff_days.to_string(),
                format!("{:.2}", s.amount_diff),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Outflow", "Inflow", "Days apart", "Amount diff"], rows)
    );

    println!("Unmatched");
    let rows = data
        .unmatched
        .iter()
        .map(|t| vec![side(t), t.debug_reason.clone().unwrap_or_default()])
        .collect();
    println!("{}", pretty_table(&["Transaction", "Reason"], rows));

    println!("Paired");
    let missing = || "(missing)".to_string();
    let rows = data
        .paired
        .iter()
        .map(|p| {
            vec![
                p.pair_id.clone(),
                p.outflow.as_ref().map(side).unwrap_or_else(missing),
                p.inflow.as_ref().map(side).unwrap_or_else(missing),
                p.matched_at.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Pair", "Outflow", "Inflow", "Matched at"], rows)
    );
    Ok(())
}

/// Pair two transactions. A current suggestion is taken as is; otherwise
/// both sides must be unpaired transfers moving in opposite directions.
pub fn confirm(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<TransferPair> {
    let ws = workspace(sub, cfg);
    let outflow = required(sub, "outflow")?;
    let inflow = required(sub, "inflow")?;
    let txs = db::load_transactions(conn, &ws)?;
    let pairs = db::load_pairs(conn, &ws)?;
    let now = now_rfc3339();

    let review = review_transfers(&txs, &pairs, &cfg.transfer);
    let suggested = review
        .suggestions
        .iter()
        .find(|s| &s.outflow.id == outflow && &s.inflow.id == inflow);

    let pair = match suggested {
        Some(s) => crate::transfers::confirm_suggestion(s, &now),
        None => {
            let find = |id: &str| {
                review
                    .unmatched
                    .iter()
                    .find(|t| t.id == id)
                    .with_context(|| format!("'{}' is not an unpaired transfer in workspace '{}'", id, ws))
            };
            let out_tx = find(outflow)?;
            let in_tx = find(inflow)?;
            if out_tx.direction != Direction::Debit || in_tx.direction != Direction::Credit {
                bail!("Outflow must be a debit and inflow a credit");
            }
            TransferPair {
                id: uuid::Uuid::new_v4().to_string(),
                from_transaction_id: outflow.clone(),
                to_transaction_id: inflow.clone(),
                matched_at: now,
            }
        }
    };
    db::insert_pair(conn, &ws, &pair)?;
    info!(workspace = %ws, pair = %pair.id, "transfer pair confirmed");
    Ok(pair)
}

pub fn confirm_all(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransferPair>> {
    let ws = workspace(sub, cfg);
    let review = review_data(conn, cfg, sub)?;
    let now = now_rfc3339();
    // all or nothing
    let tx = conn.unchecked_transaction()?;
    let mut out = Vec::new();
    for s in &review.suggestions {
        let pair = crate::transfers::confirm_suggestion(s, &now);
        db::insert_pair(&tx, &ws, &pair)?;
        out.push(pair);
    }
    tx.commit()?;
    info!(workspace = %ws, count = out.len(), "transfer suggestions confirmed");
    Ok(out)
}

fn unpair(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let ws = workspace(sub, cfg);
    let id = required(sub, "id")?;
    if db::delete_pair(conn, &ws, id)? == 0 {
        bail!("No transfer pair '{}' in workspace '{}'", id, ws);
    }
    info!(workspace = %ws, pair = %id, "transfer pair removed");
    println!("Unpaired {}", id);
    Ok(())
}

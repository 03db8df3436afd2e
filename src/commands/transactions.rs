// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;
use tracing::debug;

use super::{home_currency, output_flags, required, workspace};
use crate::classify::is_transfer_category;
use crate::config::EngineConfig;
use crate::db;
use crate::ledger::{LedgerRow, ReviewItem, ledger_rows, review_queue};
use crate::models::{Direction, Transaction};
use crate::normalize::{month_key_of, parse_date};
use crate::utils::{fmt_opt, maybe_print_json, parse_decimal, parse_month, pretty_table};

pub fn handle(conn: &Connection, cfg: &EngineConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            add(conn, cfg, sub)?;
        }
        Some(("list", sub)) => list(conn, cfg, sub)?,
        Some(("review", sub)) => review(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn add(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<Transaction> {
    let ws = workspace(sub, cfg);
    let date = required(sub, "date")?;
    if parse_date(date).is_none() {
        bail!("Unrecognised date '{}'", date);
    }
    let amount = parse_decimal(required(sub, "amount")?)?;
    let category = sub
        .get_one::<String>("category")
        .cloned()
        .unwrap_or_default();
    let currency = match sub.get_one::<String>("currency") {
        Some(c) => c.to_uppercase(),
        None => home_currency(conn, cfg)?,
    };

    let t = Transaction {
        id: sub
            .get_one::<String>("id")
            .cloned()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        description: sub
            .get_one::<String>("description")
            .cloned()
            .unwrap_or_default(),
        date: date.clone(),
        account_name: required(sub, "account")?.clone(),
        amount: amount.to_string(),
        currency,
        direction: sub
            .get_one::<String>("direction")
            .and_then(|d| Direction::parse(d)),
        is_transfer: sub.get_flag("transfer") || is_transfer_category(&category),
        category,
        needs_review: sub.get_flag("review"),
    };
    db::insert_transaction(conn, &ws, &t)?;
    debug!(workspace = %ws, id = %t.id, "transaction recorded");
    println!(
        "Recorded {} {} on {} at '{}' (acct: {})",
        t.amount, t.currency, t.date, t.description, t.account_name
    );
    Ok(t)
}

fn list(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let data = query_rows(conn, cfg, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.account_name.clone(),
                    r.description.clone(),
                    fmt_opt(r.amount),
                    r.currency.clone(),
                    r.direction.to_string(),
                    r.category.clone(),
                    r.transfer_status.as_str().to_string(),
                    if r.needs_review { "yes" } else { "" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Date", "Account", "Description", "Amount", "CCY", "Direction", "Category",
                    "Transfer", "Review"
                ],
                rows,
            )
        );
    }
    Ok(())
}

pub fn query_rows(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<Vec<LedgerRow>> {
    let ws = workspace(sub, cfg);
    let txs = db::load_transactions(conn, &ws)?;
    let pairs = db::load_pairs(conn, &ws)?;
    let mut rows = ledger_rows(&txs, &pairs);

    if let Some(month) = sub.get_one::<String>("month") {
        let month = parse_month(month)?;
        rows.retain(|r| month_key_of(&r.date) == Some(month));
    }
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }
    Ok(rows)
}

pub fn review_items(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<Vec<ReviewItem>> {
    let ws = workspace(sub, cfg);
    Ok(review_queue(&db::load_transactions(conn, &ws)?))
}

fn review(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let items = review_items(conn, cfg, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &items)? {
        return Ok(());
    }
    if items.is_empty() {
        println!("Nothing to review.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|i| {
            vec![
                i.date.clone(),
                i.account_name.clone(),
                i.description.clone(),
                fmt_opt(i.amount),
                i.category.clone(),
                i.reason.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Date", "Account", "Description", "Amount", "Category", "Reason"],
            rows
        )
    );
    Ok(())
}

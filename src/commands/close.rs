// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

use super::{output_flags, required, workspace};
use crate::close::{
    ChecklistStatus, MonthlyCloseSummary, build_snapshot_payload, close_month, month_summary,
    reopen_month,
};
use crate::config::EngineConfig;
use crate::db::{self, WorkspaceData};
use crate::models::{MonthKey, MonthlyCloseRecord, MonthlySnapshot, MonthlySnapshotPayload};
use crate::utils::{fmt_money, maybe_print_json, now_rfc3339, parse_month, pretty_table};

const DEFAULT_ACTOR: &str = "cli";

pub fn handle(conn: &mut Connection, cfg: &EngineConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("status", sub)) => status(conn, cfg, sub)?,
        Some(("close", sub)) => {
            let (record, snapshot) = close(conn, cfg, sub)?;
            println!(
                "Closed {} (snapshot {}, by {})",
                record.month,
                snapshot.id,
                record.closed_by.as_deref().unwrap_or_default()
            );
        }
        Some(("reopen", sub)) => {
            let record = reopen(conn, cfg, sub)?;
            println!(
                "Reopened {} (by {})",
                record.month,
                record.reopened_by.as_deref().unwrap_or_default()
            );
        }
        Some(("history", sub)) => history(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

fn month_of(sub: &clap::ArgMatches) -> Result<MonthKey> {
    parse_month(required(sub, "month")?)
}

fn actor(sub: &clap::ArgMatches) -> String {
    sub.get_one::<String>("by")
        .cloned()
        .unwrap_or_else(|| DEFAULT_ACTOR.to_string())
}

pub fn summary(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<MonthlyCloseSummary> {
    let ws = workspace(sub, cfg);
    let month = month_of(sub)?;
    let data = WorkspaceData::load(conn, &ws)?;
    let record = db::load_close_record(conn, &ws, month)?;
    let snapshots = db::load_snapshots(conn, &ws, Some(month))?;
    Ok(month_summary(
        record.as_ref(),
        &snapshots,
        &data.inputs(),
        month,
    ))
}

fn status(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let s = summary(conn, cfg, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &s)? {
        return Ok(());
    }
    let ccy = super::home_currency(conn, cfg)?;
    println!(
        "{} is {}{}",
        s.month,
        s.status.as_str(),
        if s.frozen { " (frozen snapshot)" } else { "" }
    );
    let rows = s
        .checklist
        .iter()
        .map(|c| {
            let mark = match c.status {
                ChecklistStatus::Complete => "ok",
                ChecklistStatus::Attention => "attention",
            };
            vec![c.label.to_string(), mark.to_string(), c.detail.clone()]
        })
        .collect();
    println!("{}", pretty_table(&["Check", "Status", "Detail"], rows));
    println!("{}", pretty_table(&["Total", "Amount"], totals_rows(&s.totals, &ccy)));
    Ok(())
}

fn totals_rows(p: &MonthlySnapshotPayload, ccy: &str) -> Vec<Vec<String>> {
    let money = |label: &str, d: &Decimal| vec![label.to_string(), fmt_money(d, ccy)];
    vec![
        money("Income", &p.income_total),
        money("Expenses", &p.expense_total),
        money("Net cash flow", &p.net_cash_flow),
        money("Transfers out", &p.transfer_outflow_total),
        money("Assets", &p.assets_total),
        money("Liabilities", &p.liabilities_total),
        money("Net worth", &p.net_worth),
        vec!["Transactions".to_string(), p.transaction_count.to_string()],
    ]
}

/// Close a month: compute live totals, then store the snapshot and the
/// updated record together.
pub fn close(
    conn: &mut Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<(MonthlyCloseRecord, MonthlySnapshot)> {
    let ws = workspace(sub, cfg);
    let month = month_of(sub)?;
    let existing = db::load_close_record(conn, &ws, month)?;
    let data = WorkspaceData::load(conn, &ws)?;
    let payload = build_snapshot_payload(&data.inputs(), month);
    let (record, snapshot) = close_month(
        existing.as_ref(),
        &ws,
        month,
        payload,
        &actor(sub),
        &now_rfc3339(),
    )?;
    db::save_close(conn, &record, Some(&snapshot))?;
    Ok((record, snapshot))
}

pub fn reopen(
    conn: &mut Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<MonthlyCloseRecord> {
    let ws = workspace(sub, cfg);
    let month = month_of(sub)?;
    let existing = db::load_close_record(conn, &ws, month)?;
    let record = reopen_month(existing.as_ref(), month, &actor(sub), &now_rfc3339())?;
    db::save_close(conn, &record, None)?;
    Ok(record)
}

fn history(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let ws = workspace(sub, cfg);
    let month = sub
        .get_one::<String>("month")
        .map(|m| parse_month(m))
        .transpose()?;
    let snapshots = db::load_snapshots(conn, &ws, month)?;
    if maybe_print_json(json_flag, jsonl_flag, &snapshots)? {
        return Ok(());
    }
    let ccy = super::home_currency(conn, cfg)?;
    let rows = snapshots
        .iter()
        .map(|s| {
            vec![
                s.month.to_string(),
                s.id.clone(),
                s.created_at.clone(),
                s.created_by.clone(),
                fmt_money(&s.payload.net_cash_flow, &ccy),
                fmt_money(&s.payload.net_worth, &ccy),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Month", "Snapshot", "Created", "By", "Net cash flow", "Net worth"],
            rows
        )
    );
    Ok(())
}

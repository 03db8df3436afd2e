// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use super::{home_currency, output_flags, workspace};
use crate::cashflow::{
    CashFlowWaterfall, ExpenseBreakdown, MonthSelection, StepKind, cash_flow_waterfall,
    expense_breakdown, resolve_month,
};
use crate::config::EngineConfig;
use crate::db;
use crate::models::{MonthKey, Transaction, TransferPair};
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table, today};

pub fn handle(conn: &Connection, cfg: &EngineConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => expenses(conn, cfg, sub)?,
        Some(("cashflow", sub)) => cashflow(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

/// A report plus the months a caller can switch to, newest first.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthReport<T> {
    #[serde(flatten)]
    pub report: T,
    pub month_options: Vec<MonthKey>,
}

fn load_month(
    conn: &Connection,
    ws: &str,
    sub: &clap::ArgMatches,
) -> Result<(Vec<Transaction>, Vec<TransferPair>, MonthSelection)> {
    let txs = db::load_transactions(conn, ws)?;
    let pairs = db::load_pairs(conn, ws)?;
    let requested = sub.get_one::<String>("month").map(|s| parse_month(s)).transpose()?;
    let selection = resolve_month(&txs, requested, today());
    Ok((txs, pairs, selection))
}

pub fn expenses_report(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<MonthReport<ExpenseBreakdown>> {
    let ws = workspace(sub, cfg);
    let ccy = home_currency(conn, cfg)?;
    let (txs, pairs, selection) = load_month(conn, &ws, sub)?;
    Ok(MonthReport {
        report: expense_breakdown(&txs, &pairs, selection.selected, &ccy),
        month_options: selection.options,
    })
}

pub fn cashflow_report(
    conn: &Connection,
    cfg: &EngineConfig,
    sub: &clap::ArgMatches,
) -> Result<MonthReport<CashFlowWaterfall>> {
    let ws = workspace(sub, cfg);
    let (txs, pairs, selection) = load_month(conn, &ws, sub)?;
    Ok(MonthReport {
        report: cash_flow_waterfall(&txs, &pairs, selection.selected),
        month_options: selection.options,
    })
}

fn months_line(options: &[MonthKey]) -> String {
    let months: Vec<String> = options.iter().map(|m| m.to_string()).collect();
    format!("Months: {}", months.join(", "))
}

fn expenses(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let out = expenses_report(conn, cfg, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &out)? {
        return Ok(());
    }
    let ccy = home_currency(conn, cfg)?;
    let report = &out.report;
    let rows = report
        .categories
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                fmt_money(&c.amount, &ccy),
                format!("{}%", c.percent),
                c.count.to_string(),
            ]
        })
        .collect();
    println!("Spending for {}", report.month);
    println!("{}", months_line(&out.month_options));
    println!(
        "{}",
        pretty_table(&["Category", "Amount", "Share", "Transactions"], rows)
    );
    println!("Total: {}", report.total_formatted);
    Ok(())
}

fn cashflow(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let out = cashflow_report(conn, cfg, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &out)? {
        return Ok(());
    }
    let ccy = home_currency(conn, cfg)?;
    let report = &out.report;
    let rows = report
        .steps
        .iter()
        .map(|s| {
            let kind = match s.kind {
                StepKind::Income => "income",
                StepKind::Expense => "expense",
                StepKind::Net => "net",
            };
            vec![
                s.label.clone(),
                kind.to_string(),
                fmt_money(&s.amount, &ccy),
                s.transactions.len().to_string(),
            ]
        })
        .collect();
    println!("Cash flow for {}", report.month);
    println!("{}", months_line(&out.month_options));
    println!(
        "{}",
        pretty_table(&["Step", "Kind", "Amount", "Transactions"], rows)
    );
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly close: open <-> closed with append-only snapshots.
//!
//! Closing freezes the month's totals into a new snapshot. Reopening only
//! flips the status; the snapshot stays as an audit record and the next
//! close appends another one. Closed months read from their snapshot, open
//! months are recomputed on every read.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::assets::{has_value_in_month, position_as_of};
use crate::cashflow::{StepKind, cash_flow_waterfall, month_transactions};
use crate::classify::is_transfer_category;
use crate::error::CloseError;
use crate::ledger::needs_attention;
use crate::models::{
    AssetEntity, AssetValueRecord, CloseStatus, Direction, MonthKey, MonthlyCloseRecord,
    MonthlySnapshot, MonthlySnapshotPayload, Transaction, TransferPair,
};
use crate::normalize::{parse_amount, parse_date};
use crate::transfers::paired_ids;

/// Everything one workspace has on record, already loaded.
#[derive(Debug, Clone, Copy)]
pub struct CloseInputs<'a> {
    pub transactions: &'a [Transaction],
    pub pairs: &'a [TransferPair],
    pub asset_values: &'a [AssetValueRecord],
    pub assets: &'a [AssetEntity],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistStatus {
    Complete,
    Attention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub key: &'static str,
    pub label: &'static str,
    pub status: ChecklistStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCloseSummary {
    pub month: MonthKey,
    pub status: CloseStatus,
    /// True when `totals` come from a stored snapshot.
    pub frozen: bool,
    pub snapshot_id: Option<String>,
    pub closed_at: Option<String>,
    pub closed_by: Option<String>,
    pub reopened_at: Option<String>,
    pub reopened_by: Option<String>,
    pub totals: MonthlySnapshotPayload,
    pub checklist: Vec<ChecklistItem>,
}

fn month_dated<'a>(
    transactions: &'a [Transaction],
    month: MonthKey,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    transactions
        .iter()
        .filter(move |t| parse_date(&t.date).is_some_and(|d| month.contains(d)))
}

/// Live totals for `month` from the current records.
pub fn build_snapshot_payload(inputs: &CloseInputs<'_>, month: MonthKey) -> MonthlySnapshotPayload {
    let waterfall = cash_flow_waterfall(inputs.transactions, inputs.pairs, month);
    let flows = month_transactions(inputs.transactions, inputs.pairs, month);

    let paired = paired_ids(inputs.pairs);
    let transfer_outflow_total: Decimal = month_dated(inputs.transactions, month)
        .filter(|t| is_transfer_category(&t.category) || paired.contains(t.id.as_str()))
        .filter(|t| t.resolved_direction() == Some(Direction::Debit))
        .filter_map(|t| parse_amount(&t.amount))
        .map(|a| a.abs())
        .sum();

    let mut account_breakdown: BTreeMap<String, Decimal> = BTreeMap::new();
    for f in &flows {
        *account_breakdown
            .entry(f.account_name.clone())
            .or_insert(Decimal::ZERO) += f.amount;
    }

    let category_breakdown = waterfall
        .steps
        .iter()
        .filter(|s| s.kind == StepKind::Expense)
        .map(|s| (s.label.clone(), s.amount))
        .collect();

    let position = position_as_of(inputs.asset_values, inputs.assets, month);

    MonthlySnapshotPayload {
        income_total: waterfall.income_total,
        expense_total: waterfall.expense_total,
        transfer_outflow_total,
        net_cash_flow: waterfall.net,
        net_worth: position.point.net_worth,
        assets_total: position.point.assets,
        liabilities_total: position.point.liabilities,
        transaction_count: flows.len(),
        category_breakdown,
        account_breakdown,
        asset_class_breakdown: position.by_type,
    }
}

fn item(key: &'static str, label: &'static str, ok: bool, detail: String) -> ChecklistItem {
    ChecklistItem {
        key,
        label,
        status: if ok {
            ChecklistStatus::Complete
        } else {
            ChecklistStatus::Attention
        },
        detail,
    }
}

/// Soft readiness signals. Closing is allowed whatever they say.
pub fn build_checklist(inputs: &CloseInputs<'_>, month: MonthKey) -> Vec<ChecklistItem> {
    let imported = month_dated(inputs.transactions, month).count();
    let pending = month_dated(inputs.transactions, month)
        .filter(|t| needs_attention(t))
        .count();
    let valued = has_value_in_month(inputs.asset_values, month);

    vec![
        item(
            "imports",
            "Transactions imported",
            imported > 0,
            if imported > 0 {
                format!("{imported} transactions dated {month}")
            } else {
                format!("No transactions dated {month}")
            },
        ),
        item(
            "review",
            "Review queue empty",
            pending == 0,
            if pending == 0 {
                "Nothing waiting for review".to_string()
            } else {
                format!("{pending} transactions need review or a category")
            },
        ),
        item(
            "assets",
            "Asset values recorded",
            valued,
            if valued {
                format!("At least one asset value recorded in {month}")
            } else {
                format!("No asset values recorded in {month}")
            },
        ),
    ]
}

/// Close `month`, producing the updated record and a new snapshot.
pub fn close_month(
    existing: Option<&MonthlyCloseRecord>,
    workspace_id: &str,
    month: MonthKey,
    payload: MonthlySnapshotPayload,
    actor: &str,
    now: &str,
) -> Result<(MonthlyCloseRecord, MonthlySnapshot), CloseError> {
    if existing.is_some_and(|r| r.status == CloseStatus::Closed) {
        return Err(CloseError::AlreadyClosed(month));
    }
    let snapshot = MonthlySnapshot {
        id: uuid::Uuid::new_v4().to_string(),
        workspace_id: workspace_id.to_string(),
        month,
        created_at: now.to_string(),
        created_by: actor.to_string(),
        payload,
    };
    let record = MonthlyCloseRecord {
        workspace_id: workspace_id.to_string(),
        month,
        status: CloseStatus::Closed,
        closed_at: Some(now.to_string()),
        closed_by: Some(actor.to_string()),
        reopened_at: existing.and_then(|r| r.reopened_at.clone()),
        reopened_by: existing.and_then(|r| r.reopened_by.clone()),
        snapshot_id: Some(snapshot.id.clone()),
    };
    info!(workspace = workspace_id, %month, snapshot = %snapshot.id, "month closed");
    Ok((record, snapshot))
}

/// Reopen a closed month. The snapshot id is kept for the audit trail.
pub fn reopen_month(
    existing: Option<&MonthlyCloseRecord>,
    month: MonthKey,
    actor: &str,
    now: &str,
) -> Result<MonthlyCloseRecord, CloseError> {
    match existing {
        Some(r) if r.status == CloseStatus::Closed => {
            info!(workspace = %r.workspace_id, %month, "month reopened");
            Ok(MonthlyCloseRecord {
                status: CloseStatus::Open,
                reopened_at: Some(now.to_string()),
                reopened_by: Some(actor.to_string()),
                ..r.clone()
            })
        }
        _ => Err(CloseError::NotClosed(month)),
    }
}

/// Frozen totals for a closed month, live totals otherwise.
pub fn month_summary(
    record: Option<&MonthlyCloseRecord>,
    snapshots: &[MonthlySnapshot],
    inputs: &CloseInputs<'_>,
    month: MonthKey,
) -> MonthlyCloseSummary {
    let status = record.map(|r| r.status).unwrap_or(CloseStatus::Open);
    let snapshot_id = record.and_then(|r| r.snapshot_id.clone());

    let frozen = match (status, snapshot_id.as_deref()) {
        (CloseStatus::Closed, Some(id)) => {
            let found = snapshots.iter().find(|s| s.id == id);
            if found.is_none() {
                warn!(%month, snapshot = id, "closed month has no stored snapshot, recomputing");
            }
            found.map(|s| s.payload.clone())
        }
        _ => None,
    };

    MonthlyCloseSummary {
        month,
        status,
        frozen: frozen.is_some(),
        snapshot_id,
        closed_at: record.and_then(|r| r.closed_at.clone()),
        closed_by: record.and_then(|r| r.closed_by.clone()),
        reopened_at: record.and_then(|r| r.reopened_at.clone()),
        reopened_by: record.and_then(|r| r.reopened_by.clone()),
        totals: frozen.unwrap_or_else(|| build_snapshot_payload(inputs, month)),
        checklist: build_checklist(inputs, month),
    }
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly expense breakdown and income -> expenses -> net waterfall.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::classify::{category_name, is_income_category, is_transfer_category};
use crate::models::{MonthKey, Transaction, TransferPair};
use crate::normalize::parse_date;
use crate::transfers::paired_ids;
use crate::utils::fmt_money;

/// A transaction that counts towards a month's income or spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowTransaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub account_name: String,
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub name: String,
    pub amount: Decimal,
    pub percent: u32,
    pub count: usize,
    pub transactions: Vec<FlowTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseBreakdown {
    pub month: MonthKey,
    pub total_amount: Decimal,
    pub total_formatted: String,
    pub categories: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Income,
    Expense,
    Net,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallStep {
    pub label: String,
    pub kind: StepKind,
    pub amount: Decimal,
    pub transactions: Vec<FlowTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowWaterfall {
    pub month: MonthKey,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub net: Decimal,
    pub steps: Vec<WaterfallStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSelection {
    pub selected: MonthKey,
    pub options: Vec<MonthKey>,
}

/// Transactions dated in `month` with a usable amount, minus transfers
/// (by category or by confirmed pair).
pub fn month_transactions(
    transactions: &[Transaction],
    pairs: &[TransferPair],
    month: MonthKey,
) -> Vec<FlowTransaction> {
    let paired = paired_ids(pairs);
    transactions
        .iter()
        .filter(|t| !is_transfer_category(&t.category) && !paired.contains(t.id.as_str()))
        .filter_map(|t| {
            let date = parse_date(&t.date).filter(|d| month.contains(*d))?;
            let amount = t.signed_amount()?;
            Some(FlowTransaction {
                id: t.id.clone(),
                date,
                description: t.description.clone(),
                account_name: t.account_name.clone(),
                category: category_name(&t.category),
                amount,
            })
        })
        .collect()
}

fn newest_first(txs: &mut [FlowTransaction]) {
    txs.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
}

fn percent_of(amount: Decimal, base: Decimal) -> u32 {
    if base.is_zero() {
        return 0;
    }
    (amount.abs() / base * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

/// Group by category, largest absolute total first.
fn group_by_category(flows: Vec<FlowTransaction>) -> Vec<CategoryTotal> {
    let mut groups: HashMap<String, Vec<FlowTransaction>> = HashMap::new();
    for f in flows {
        groups.entry(f.category.clone()).or_default().push(f);
    }
    let mut categories: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(name, mut transactions)| {
            newest_first(&mut transactions);
            CategoryTotal {
                amount: transactions.iter().map(|t| t.amount).sum(),
                count: transactions.len(),
                name,
                percent: 0,
                transactions,
            }
        })
        .collect();
    categories.sort_by(|a, b| {
        b.amount
            .abs()
            .cmp(&a.amount.abs())
            .then_with(|| a.name.cmp(&b.name))
    });
    let base: Decimal = categories.iter().map(|c| c.amount.abs()).sum();
    for c in &mut categories {
        c.percent = percent_of(c.amount, base);
    }
    categories
}

fn split_income(flows: Vec<FlowTransaction>) -> (Vec<FlowTransaction>, Vec<FlowTransaction>) {
    flows
        .into_iter()
        .partition(|f| is_income_category(&f.category))
}

pub fn expense_breakdown(
    transactions: &[Transaction],
    pairs: &[TransferPair],
    month: MonthKey,
    currency: &str,
) -> ExpenseBreakdown {
    let (_, expenses) = split_income(month_transactions(transactions, pairs, month));
    let categories = group_by_category(expenses);
    let total_amount: Decimal = categories.iter().map(|c| c.amount).sum();
    ExpenseBreakdown {
        month,
        total_amount,
        total_formatted: fmt_money(&total_amount, currency),
        categories,
    }
}

pub fn cash_flow_waterfall(
    transactions: &[Transaction],
    pairs: &[TransferPair],
    month: MonthKey,
) -> CashFlowWaterfall {
    let (mut income, expenses) = split_income(month_transactions(transactions, pairs, month));
    newest_first(&mut income);
    let income_total: Decimal = income.iter().map(|t| t.amount).sum();

    let mut steps = vec![WaterfallStep {
        label: "Income".to_string(),
        kind: StepKind::Income,
        amount: income_total,
        transactions: income,
    }];
    let mut expense_total = Decimal::ZERO;
    for c in group_by_category(expenses) {
        expense_total += c.amount;
        steps.push(WaterfallStep {
            label: c.name,
            kind: StepKind::Expense,
            amount: c.amount,
            transactions: c.transactions,
        });
    }
    let net = income_total + expense_total;
    steps.push(WaterfallStep {
        label: "Net".to_string(),
        kind: StepKind::Net,
        amount: net,
        transactions: Vec::new(),
    });

    CashFlowWaterfall {
        month,
        income_total,
        expense_total,
        net,
        steps,
    }
}

/// Pick the month to show and the list of months to offer.
///
/// A requested month is always honoured and listed even without data.
/// Otherwise the current month wins if it has data, then the newest month
/// with data, then the current month.
pub fn resolve_month(
    transactions: &[Transaction],
    requested: Option<MonthKey>,
    today: NaiveDate,
) -> MonthSelection {
    let with_data: BTreeSet<MonthKey> = transactions
        .iter()
        .filter_map(|t| parse_date(&t.date))
        .map(MonthKey::of)
        .collect();
    let current = MonthKey::of(today);

    let selected = match requested {
        Some(m) => m,
        None if with_data.contains(&current) => current,
        None => with_data.iter().next_back().copied().unwrap_or(current),
    };

    let mut options = with_data;
    options.insert(selected);
    MonthSelection {
        selected,
        options: options.into_iter().rev().collect(),
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cmp::Ordering;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::classify::{category_name, is_transfer_category, is_uncategorised};
use crate::models::{Transaction, TransferPair, direction_label};
use crate::normalize::{normalize_date_to_iso, parse_amount, parse_date};
use crate::transfers::paired_ids;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    None,
    Unmatched,
    Paired,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Unmatched => "unmatched",
            Self::Paired => "paired",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub id: String,
    pub date: String,
    pub description: String,
    pub account_name: String,
    pub amount: Option<Decimal>,
    pub currency: String,
    pub direction: &'static str,
    pub category: String,
    pub transfer_status: TransferStatus,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub id: String,
    pub date: String,
    pub description: String,
    pub account_name: String,
    pub amount: Option<Decimal>,
    pub category: String,
    pub reason: String,
}

/// Newest first; rows with unreadable dates sink to the bottom.
fn by_date_desc(a: (Option<NaiveDate>, &str), b: (Option<NaiveDate>, &str)) -> Ordering {
    match (a.0, b.0) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.1.cmp(b.1))
}

pub fn ledger_rows(transactions: &[Transaction], pairs: &[TransferPair]) -> Vec<LedgerRow> {
    let paired = paired_ids(pairs);
    let mut rows: Vec<(Option<NaiveDate>, LedgerRow)> = transactions
        .iter()
        .map(|t| {
            let transfer_status = if paired.contains(t.id.as_str()) {
                TransferStatus::Paired
            } else if t.is_transfer || is_transfer_category(&t.category) {
                TransferStatus::Unmatched
            } else {
                TransferStatus::None
            };
            let row = LedgerRow {
                id: t.id.clone(),
                date: normalize_date_to_iso(&t.date),
                description: t.description.clone(),
                account_name: t.account_name.clone(),
                amount: parse_amount(&t.amount),
                currency: t.currency.clone(),
                direction: direction_label(t.resolved_direction()),
                category: category_name(&t.category),
                transfer_status,
                needs_review: t.needs_review,
            };
            (parse_date(&t.date), row)
        })
        .collect();
    rows.sort_by(|(da, a), (db, b)| by_date_desc((*da, &a.id), (*db, &b.id)));
    rows.into_iter().map(|(_, r)| r).collect()
}

fn review_reason(t: &Transaction) -> Option<&'static str> {
    if is_transfer_category(&t.category) {
        return None;
    }
    match (t.needs_review, is_uncategorised(&t.category)) {
        (true, true) => Some("Flagged for review and uncategorised"),
        (true, false) => Some("Flagged for review"),
        (false, true) => Some("Uncategorised"),
        (false, false) => None,
    }
}

/// Transactions still waiting for a confident category.
pub fn review_queue(transactions: &[Transaction]) -> Vec<ReviewItem> {
    let mut items: Vec<(Option<NaiveDate>, ReviewItem)> = transactions
        .iter()
        .filter_map(|t| {
            let reason = review_reason(t)?;
            Some((
                parse_date(&t.date),
                ReviewItem {
                    id: t.id.clone(),
                    date: normalize_date_to_iso(&t.date),
                    description: t.description.clone(),
                    account_name: t.account_name.clone(),
                    amount: parse_amount(&t.amount),
                    category: category_name(&t.category),
                    reason: reason.to_string(),
                },
            ))
        })
        .collect();
    items.sort_by(|(da, a), (db, b)| by_date_desc((*da, &a.id), (*db, &b.id)));
    items.into_iter().map(|(_, i)| i).collect()
}

pub fn needs_attention(t: &Transaction) -> bool {
    review_reason(t).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: &str, date: &str, category: &str, needs_review: bool) -> Transaction {
        Transaction {
            id: id.into(),
            description: id.into(),
            date: date.into(),
            account_name: "Joint".into(),
            amount: "-1.00".into(),
            currency: "GBP".into(),
            direction: None,
            category: category.into(),
            is_transfer: false,
            needs_review,
        }
    }

    #[test]
    fn ledger_sorted_newest_first_with_iso_dates() {
        let txs = vec![
            tx("a", "01/06/2024", "Fuel", false),
            tx("b", "garbage", "Fuel", false),
            tx("c", "2024-06-15", "Fuel", false),
        ];
        let rows = ledger_rows(&txs, &[]);
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(rows[1].date, "2024-06-01");
        assert_eq!(rows[2].date, "garbage");
        assert_eq!(rows[0].direction, "Debit");
    }

    #[test]
    fn ledger_transfer_status() {
        let mut t = tx("t", "2024-06-01", "Transfer", false);
        t.is_transfer = true;
        let p = tx("p", "2024-06-01", "Transfer", false);
        let pairs = vec![TransferPair {
            id: "x".into(),
            from_transaction_id: "p".into(),
            to_transaction_id: "q".into(),
            matched_at: String::new(),
        }];
        let rows = ledger_rows(&[t, p, tx("n", "2024-06-01", "Fuel", false)], &pairs);
        let status: Vec<(&str, TransferStatus)> =
            rows.iter().map(|r| (r.id.as_str(), r.transfer_status)).collect();
        assert_eq!(
            status,
            vec![
                ("n", TransferStatus::None),
                ("p", TransferStatus::Paired),
                ("t", TransferStatus::Unmatched)
            ]
        );
    }

    #[test]
    fn review_queue_lists_flagged_and_uncategorised() {
        let txs = vec![
            tx("a", "2024-06-01", "", false),
            tx("b", "2024-06-02", "Fuel", true),
            tx("c", "2024-06-03", "Fuel", false),
            tx("d", "2024-06-04", "Transfer", true),
            tx("e", "2024-06-05", "Uncategorised", true),
        ];
        let q = review_queue(&txs);
        let got: Vec<(&str, &str)> = q.iter().map(|i| (i.id.as_str(), i.reason.as_str())).collect();
        assert_eq!(
            got,
            vec![
                ("e", "Flagged for review and uncategorised"),
                ("b", "Flagged for review"),
                ("a", "Uncategorised"),
            ]
        );
    }
}

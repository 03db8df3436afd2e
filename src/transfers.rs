// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transfer pair suggestions.
//!
//! Outflows are visited in `(date, id)` order and each one greedily takes
//! the closest remaining inflow (date first, then amount). The result is a
//! valid one-to-one matching but not the assignment with the smallest total
//! discrepancy; the review screens depend on this exact tie-breaking.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::MatchTolerance;
use crate::models::{Direction, Transaction, TransferPair};
use crate::normalize::{parse_amount, parse_date};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTransaction {
    pub id: String,
    pub description: String,
    pub account_name: String,
    pub date: String,
    pub amount: Decimal,
    pub currency: String,
    pub direction: Direction,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSuggestion {
    pub outflow: TransferTransaction,
    pub inflow: TransferTransaction,
    pub amount_diff: Decimal,
    pub date_diff_days: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPairReview {
    pub pair_id: String,
    pub matched_at: String,
    pub outflow: Option<TransferTransaction>,
    pub inflow: Option<TransferTransaction>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReviewData {
    pub suggestions: Vec<TransferSuggestion>,
    pub unmatched: Vec<TransferTransaction>,
    pub paired: Vec<TransferPairReview>,
}

/// Why a candidate ended up without a suggestion, most fundamental first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedReason {
    NoCounterparts(Direction),
    OutsideDateWindow(i64),
    OutsideAmountTolerance(i64),
    NoEligibleMatch,
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |d: &Direction| match d {
            Direction::Credit => "inflow",
            Direction::Debit => "outflow",
        };
        match self {
            Self::NoCounterparts(d) => write!(f, "No unmatched {} transfers to pair with", side(d)),
            Self::OutsideDateWindow(days) => {
                write!(f, "No opposite transfer within {days} days")
            }
            Self::OutsideAmountTolerance(days) => write!(
                f,
                "Transfers within {days} days exist but none within the amount tolerance"
            ),
            Self::NoEligibleMatch => {
                write!(f, "No eligible match; close candidates were paired with other transfers")
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    tx: TransferTransaction,
    date: NaiveDate,
    magnitude: Decimal,
}

impl Candidate {
    fn from_transaction(t: &Transaction) -> Option<Self> {
        let amount = parse_amount(&t.amount)?;
        let date = parse_date(&t.date)?;
        let direction = t.resolved_direction()?;
        Some(Self {
            tx: TransferTransaction {
                id: t.id.clone(),
                description: t.description.clone(),
                account_name: t.account_name.clone(),
                date: date.format("%Y-%m-%d").to_string(),
                amount,
                currency: t.currency.clone(),
                direction,
                category: t.category.clone(),
                debug_reason: None,
            },
            date,
            magnitude: amount.abs(),
        })
    }
}

/// Ids referenced by any existing pair.
pub fn paired_ids(pairs: &[TransferPair]) -> HashSet<&str> {
    pairs
        .iter()
        .flat_map(|p| [p.from_transaction_id.as_str(), p.to_transaction_id.as_str()])
        .collect()
}

fn date_diff(a: &Candidate, b: &Candidate) -> i64 {
    (a.date - b.date).num_days().abs()
}

fn within_window(out: &Candidate, inflow: &Candidate, tol: &MatchTolerance) -> bool {
    date_diff(out, inflow) <= tol.date_window_days
}

/// Amount tolerance is always taken off the outflow's magnitude.
fn within_amount(out: &Candidate, inflow: &Candidate, tol: &MatchTolerance) -> bool {
    (out.magnitude - inflow.magnitude).abs() <= out.magnitude * tol.amount_tolerance_ratio
}

/// `(outflow, inflow)` ordering for a candidate and one of its counterparts.
fn orient<'a>(
    candidate: &'a Candidate,
    other: &'a Candidate,
    as_outflow: bool,
) -> (&'a Candidate, &'a Candidate) {
    if as_outflow {
        (candidate, other)
    } else {
        (other, candidate)
    }
}

fn explain(
    candidate: &Candidate,
    opposite: &[Candidate],
    tol: &MatchTolerance,
    as_outflow: bool,
) -> UnmatchedReason {
    if opposite.is_empty() {
        let counterpart = if as_outflow {
            Direction::Credit
        } else {
            Direction::Debit
        };
        return UnmatchedReason::NoCounterparts(counterpart);
    }
    let in_window: Vec<(&Candidate, &Candidate)> = opposite
        .iter()
        .map(|o| orient(candidate, o, as_outflow))
        .filter(|(out, inflow)| within_window(out, inflow, tol))
        .collect();
    if in_window.is_empty() {
        return UnmatchedReason::OutsideDateWindow(tol.date_window_days);
    }
    if !in_window
        .iter()
        .any(|(out, inflow)| within_amount(out, inflow, tol))
    {
        return UnmatchedReason::OutsideAmountTolerance(tol.date_window_days);
    }
    UnmatchedReason::NoEligibleMatch
}

/// Build the transfer review screen: greedy suggestions for unpaired
/// transfer-flagged transactions, the leftovers with a reason, and the
/// already confirmed pairs.
pub fn review_transfers(
    transactions: &[Transaction],
    pairs: &[TransferPair],
    tol: &MatchTolerance,
) -> TransferReviewData {
    let paired = paired_ids(pairs);

    let mut candidates: Vec<Candidate> = Vec::new();
    for t in transactions.iter().filter(|t| t.is_transfer) {
        if paired.contains(t.id.as_str()) {
            continue;
        }
        match Candidate::from_transaction(t) {
            Some(c) => candidates.push(c),
            None => debug!(
                id = %t.id,
                amount = %t.amount,
                date = %t.date,
                "skipping transfer candidate without amount, date or direction"
            ),
        }
    }
    candidates.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.tx.id.cmp(&b.tx.id)));

    let (outflows, inflows): (Vec<Candidate>, Vec<Candidate>) = candidates
        .into_iter()
        .partition(|c| c.tx.direction == Direction::Debit);

    let mut inflow_used = vec![false; inflows.len()];
    let mut outflow_used = vec![false; outflows.len()];
    let mut suggestions = Vec::new();

    for (oi, out) in outflows.iter().enumerate() {
        // (index, date diff, amount diff); earlier index wins full ties
        let mut best: Option<(usize, i64, Decimal)> = None;
        for (ii, inflow) in inflows.iter().enumerate() {
            if inflow_used[ii] {
                continue;
            }
            if !within_window(out, inflow, tol) || !within_amount(out, inflow, tol) {
                continue;
            }
            let days = date_diff(out, inflow);
            let amount_diff = (out.magnitude - inflow.magnitude).abs();
            let better = match best {
                None => true,
                Some((_, best_days, best_diff)) => {
                    (days, amount_diff) < (best_days, best_diff)
                }
            };
            if better {
                best = Some((ii, days, amount_diff));
            }
        }

        if let Some((ii, date_diff_days, amount_diff)) = best {
            inflow_used[ii] = true;
            outflow_used[oi] = true;
            suggestions.push(TransferSuggestion {
                outflow: out.tx.clone(),
                inflow: inflows[ii].tx.clone(),
                amount_diff,
                date_diff_days,
            });
        }
    }

    let mut leftovers: Vec<(&Candidate, UnmatchedReason)> = Vec::new();
    for (out, _) in outflows.iter().zip(&outflow_used).filter(|(_, used)| !**used) {
        leftovers.push((out, explain(out, &inflows, tol, true)));
    }
    for (inflow, _) in inflows.iter().zip(&inflow_used).filter(|(_, used)| !**used) {
        leftovers.push((inflow, explain(inflow, &outflows, tol, false)));
    }
    leftovers.sort_by(|(a, _), (b, _)| a.date.cmp(&b.date).then_with(|| a.tx.id.cmp(&b.tx.id)));
    let unmatched = leftovers
        .into_iter()
        .map(|(c, reason)| TransferTransaction {
            debug_reason: Some(reason.to_string()),
            ..c.tx.clone()
        })
        .collect();

    TransferReviewData {
        suggestions,
        unmatched,
        paired: review_pairs(transactions, pairs),
    }
}

fn review_pairs(transactions: &[Transaction], pairs: &[TransferPair]) -> Vec<TransferPairReview> {
    let by_id: HashMap<&str, &Transaction> =
        transactions.iter().map(|t| (t.id.as_str(), t)).collect();
    let resolve = |id: &str| {
        by_id
            .get(id)
            .and_then(|t| Candidate::from_transaction(t))
            .map(|c| c.tx)
    };
    pairs
        .iter()
        .map(|p| TransferPairReview {
            pair_id: p.id.clone(),
            matched_at: p.matched_at.clone(),
            outflow: resolve(&p.from_transaction_id),
            inflow: resolve(&p.to_transaction_id),
        })
        .collect()
}

/// Turn an accepted suggestion into a persisted pair.
pub fn confirm_suggestion(suggestion: &TransferSuggestion, matched_at: &str) -> TransferPair {
    TransferPair {
        id: uuid::Uuid::new_v4().to_string(),
        from_transaction_id: suggestion.outflow.id.clone(),
        to_transaction_id: suggestion.inflow.id.clone(),
        matched_at: matched_at.to_string(),
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;
use crate::normalize::parse_amount;

/// Calendar month in `YYYY-MM` form. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || Error::InvalidMonth(s.to_string());
        let (y, m) = raw.split_once('-').ok_or_else(invalid)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Some(Self::Credit),
            "debit" => Some(Self::Debit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

/// A ledger transaction as stored; dates and amounts are still raw text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub date: String,
    pub account_name: String,
    pub amount: String,
    pub currency: String,
    pub direction: Option<Direction>,
    pub category: String,
    pub is_transfer: bool,
    pub needs_review: bool,
}

impl Transaction {
    /// Explicit direction, else inferred from the amount sign.
    pub fn resolved_direction(&self) -> Option<Direction> {
        if self.direction.is_some() {
            return self.direction;
        }
        let amount = parse_amount(&self.amount)?;
        if amount > Decimal::ZERO {
            Some(Direction::Credit)
        } else if amount < Decimal::ZERO {
            Some(Direction::Debit)
        } else {
            None
        }
    }

    /// `+|amount|` for credits, `-|amount|` otherwise.
    pub fn signed_amount(&self) -> Option<Decimal> {
        let amount = parse_amount(&self.amount)?.abs();
        match self.resolved_direction() {
            Some(Direction::Credit) => Some(amount),
            _ => Some(-amount),
        }
    }
}

pub fn direction_label(direction: Option<Direction>) -> &'static str {
    match direction {
        Some(Direction::Credit) => "Credit",
        Some(Direction::Debit) => "Debit",
        None => "Transaction",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPair {
    pub id: String,
    pub from_transaction_id: String,
    pub to_transaction_id: String,
    pub matched_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Active,
    Disposed,
}

impl AssetStatus {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("disposed") {
            Self::Disposed
        } else {
            Self::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disposed => "disposed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntity {
    pub id: String,
    pub name: String,
    pub asset_type: String,
    pub owner: String,
    pub status: AssetStatus,
    pub currency: String,
    pub disposed_at: Option<String>,
}

/// One valuation of an asset. Append-only; `deleted_at` is a tombstone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetValueRecord {
    pub id: String,
    pub asset_id: Option<String>,
    pub asset_name: String,
    pub asset_type: String,
    pub value: Option<Decimal>,
    pub currency: String,
    pub value_in_home_currency: Option<Decimal>,
    pub fx_rate: Option<Decimal>,
    pub fx_source: Option<String>,
    pub recorded_at: String,
    pub source: String,
    pub notes: Option<String>,
    pub deleted_at: Option<String>,
}

impl AssetValueRecord {
    pub fn is_live(&self) -> bool {
        self.deleted_at
            .as_deref()
            .map(|d| d.trim().is_empty())
            .unwrap_or(true)
    }

    pub fn home_value(&self) -> Option<Decimal> {
        self.value_in_home_currency.or(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseStatus {
    Open,
    Closed,
}

impl CloseStatus {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("closed") {
            Self::Closed
        } else {
            Self::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCloseRecord {
    pub workspace_id: String,
    pub month: MonthKey,
    pub status: CloseStatus,
    pub closed_at: Option<String>,
    pub closed_by: Option<String>,
    pub reopened_at: Option<String>,
    pub reopened_by: Option<String>,
    pub snapshot_id: Option<String>,
}

/// Totals frozen at close time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshotPayload {
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub transfer_outflow_total: Decimal,
    pub net_cash_flow: Decimal,
    pub net_worth: Decimal,
    pub assets_total: Decimal,
    pub liabilities_total: Decimal,
    pub transaction_count: usize,
    pub category_breakdown: BTreeMap<String, Decimal>,
    pub account_breakdown: BTreeMap<String, Decimal>,
    pub asset_class_breakdown: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshot {
    pub id: String,
    pub workspace_id: String,
    pub month: MonthKey,
    pub created_at: String,
    pub created_by: String,
    pub payload: MonthlySnapshotPayload,
}

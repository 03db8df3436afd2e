// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Parsing of the loosely formatted amounts and dates found in bank exports.
//!
//! Everything here is total: bad input yields `None` (or the original
//! string for [`normalize_date_to_iso`]) and callers skip the record.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::models::MonthKey;

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})([/.\-])(\d{1,2})([/.\-])(\d{2}|\d{4})$").expect("static regex")
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%b %d, %Y", "%B %d, %Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a signed amount such as `"-1,234.50"`.
///
/// A blank string parses to zero. Rows with blank amounts have always been
/// treated as zero-value rows, so this is kept even though other garbage
/// returns `None`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let raw = s.trim();
    if raw.is_empty() {
        return Some(Decimal::ZERO);
    }
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Parse a wall-clock date. Day-first numeric forms win over the generic
/// cascade, so `01/06/2024` is the 1st of June.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let raw = s.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(caps) = DAY_FIRST.captures(raw) {
        if caps[2] != caps[4] {
            return None;
        }
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[3].parse().ok()?;
        let year_raw = &caps[5];
        let mut year: i32 = year_raw.parse().ok()?;
        if year_raw.len() == 2 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    generic_date(raw)
}

fn generic_date(raw: &str) -> Option<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    naive_datetime(raw).map(|dt| dt.date())
}

fn naive_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// `YYYY-MM-DD` when the input parses, the input unchanged otherwise.
pub fn normalize_date_to_iso(s: &str) -> String {
    match parse_date(s) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => s.to_string(),
    }
}

/// Parse a `recorded_at` style timestamp; bare dates become midnight.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let raw = s.trim();
    if raw.is_empty() {
        return None;
    }
    naive_datetime(raw).or_else(|| parse_date(raw).map(|d| d.and_time(NaiveTime::MIN)))
}

pub fn month_key_of(s: &str) -> Option<MonthKey> {
    parse_date(s).map(MonthKey::of)
}

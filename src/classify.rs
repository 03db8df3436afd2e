// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub const UNCATEGORISED: &str = "Uncategorised";

const LIABILITY_TYPES: &[&str] = &[
    "liability",
    "mortgage",
    "loan",
    "credit_card",
    "credit card",
    "debt",
];

pub fn is_transfer_category(label: &str) -> bool {
    label.to_lowercase().contains("transfer")
}

pub fn is_income_category(label: &str) -> bool {
    let l = label.trim().to_lowercase();
    l == "income" || l.starts_with("income -")
}

pub fn is_uncategorised(label: &str) -> bool {
    let l = label.trim();
    l.is_empty() || l.eq_ignore_ascii_case("uncategorised") || l.eq_ignore_ascii_case("uncategorized")
}

/// Display name for a category, blank becomes [`UNCATEGORISED`].
pub fn category_name(label: &str) -> String {
    let l = label.trim();
    if l.is_empty() {
        UNCATEGORISED.to_string()
    } else {
        l.to_string()
    }
}

/// Liability-like asset types count negatively towards net worth.
pub fn is_liability_type(asset_type: &str) -> bool {
    let t = asset_type.trim().to_lowercase();
    LIABILITY_TYPES.contains(&t.as_str())
}

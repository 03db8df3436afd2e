// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Net worth reconstruction from sparse asset valuations.
//!
//! Valuations are a step function: an asset keeps its last recorded value
//! until a newer record arrives or it is disposed. Disposal removes the asset
//! from the disposal month onwards. Liability types count negatively.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::classify::is_liability_type;
use crate::models::{AssetEntity, AssetStatus, AssetValueRecord, MonthKey};
use crate::normalize::{month_key_of, parse_timestamp};

pub const NO_VALUE: &str = "--";
pub const NO_ASSETS: &str = "No assets yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthPoint {
    pub month: MonthKey,
    pub assets: Decimal,
    pub liabilities: Decimal,
    pub net_worth: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub month: MonthKey,
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthSeries {
    pub points: Vec<NetWorthPoint>,
    pub by_asset: BTreeMap<String, Vec<SeriesPoint>>,
    pub by_type: BTreeMap<String, Vec<SeriesPoint>>,
}

/// Holdings as of the end of one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPosition {
    pub point: NetWorthPoint,
    pub by_type: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCard {
    pub asset_id: String,
    pub name: String,
    pub asset_type: String,
    pub owner: String,
    pub status: AssetStatus,
    pub currency: String,
    pub latest_value: Option<Decimal>,
    pub signed_value: Option<Decimal>,
    pub recorded_at: Option<String>,
    pub linked: bool,
}

impl AssetCard {
    pub fn display_value(&self) -> String {
        match self.latest_value {
            Some(v) => format!("{:.2}", v),
            None => NO_VALUE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOverview {
    pub cards: Vec<AssetCard>,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub net_worth: Decimal,
    pub has_assets: bool,
}

#[derive(Debug, Clone)]
struct ResolvedAsset {
    key: String,
    name: String,
    asset_type: String,
    owner: String,
    currency: String,
    status: AssetStatus,
    disposal_month: Option<MonthKey>,
    linked: bool,
}

impl ResolvedAsset {
    fn disposed_by(&self, month: MonthKey) -> bool {
        self.disposal_month.is_some_and(|d| d <= month)
    }

    fn signed(&self, value: Decimal) -> Decimal {
        signed_value(&self.asset_type, value)
    }
}

#[derive(Debug, Clone)]
struct Valuation<'a> {
    asset: usize,
    recorded_at: NaiveDateTime,
    month: MonthKey,
    value: Decimal,
    record: &'a AssetValueRecord,
}

pub fn signed_value(asset_type: &str, value: Decimal) -> Decimal {
    if is_liability_type(asset_type) {
        -value.abs()
    } else {
        value.abs()
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Arena of assets plus the live valuations pointing into it.
fn resolve<'a>(
    records: &'a [AssetValueRecord],
    entities: &[AssetEntity],
) -> (Vec<ResolvedAsset>, Vec<Valuation<'a>>) {
    let mut assets: Vec<ResolvedAsset> = entities
        .iter()
        .map(|e| ResolvedAsset {
            key: e.id.clone(),
            name: e.name.clone(),
            asset_type: e.asset_type.clone(),
            owner: e.owner.clone(),
            currency: e.currency.clone(),
            status: e.status,
            disposal_month: match e.status {
                AssetStatus::Disposed => e.disposed_at.as_deref().and_then(month_key_of),
                AssetStatus::Active => None,
            },
            linked: true,
        })
        .collect();
    let by_id: HashMap<String, usize> = assets
        .iter()
        .enumerate()
        .map(|(i, a)| (a.key.clone(), i))
        .collect();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (i, a) in assets.iter().enumerate() {
        by_name.entry(name_key(&a.name)).or_insert(i);
    }

    let mut valuations = Vec::new();
    for r in records.iter().filter(|r| r.is_live()) {
        let (Some(recorded_at), Some(value)) = (parse_timestamp(&r.recorded_at), r.home_value())
        else {
            debug!(id = %r.id, recorded_at = %r.recorded_at, "skipping asset value without timestamp or value");
            continue;
        };
        let linked = r
            .asset_id
            .as_deref()
            .and_then(|id| by_id.get(id).copied())
            .or_else(|| by_name.get(&name_key(&r.asset_name)).copied());
        let asset = match linked {
            Some(i) => i,
            None => {
                let key = name_key(&r.asset_name);
                let idx = assets.len();
                assets.push(ResolvedAsset {
                    key: format!("unlinked:{key}"),
                    name: r.asset_name.clone(),
                    asset_type: r.asset_type.clone(),
                    owner: String::new(),
                    currency: r.currency.clone(),
                    status: AssetStatus::Active,
                    disposal_month: None,
                    linked: false,
                });
                by_name.insert(key, idx);
                idx
            }
        };
        valuations.push(Valuation {
            asset,
            recorded_at,
            month: MonthKey::of(recorded_at.date()),
            value,
            record: r,
        });
    }
    (assets, valuations)
}

/// Walk months from the first valuation month through `last`, handing the
/// carried-forward value of every held asset to `visit` at each month.
fn walk_months(
    assets: &[ResolvedAsset],
    valuations: &[Valuation<'_>],
    last: MonthKey,
    mut visit: impl FnMut(MonthKey, &BTreeMap<usize, Decimal>),
) {
    let mut by_month: BTreeMap<MonthKey, Vec<&Valuation<'_>>> = BTreeMap::new();
    for v in valuations {
        by_month.entry(v.month).or_default().push(v);
    }
    let Some(first) = by_month.keys().next().copied() else {
        return;
    };

    let mut held: BTreeMap<usize, Decimal> = BTreeMap::new();
    let mut month = first;
    while month <= last {
        held.retain(|idx, _| !assets[*idx].disposed_by(month));
        if let Some(batch) = by_month.get_mut(&month) {
            // latest record of the month wins
            batch.sort_by_key(|v| v.recorded_at);
            for v in batch.iter() {
                if !assets[v.asset].disposed_by(month) {
                    held.insert(v.asset, v.value);
                }
            }
        }
        visit(month, &held);
        month = month.next();
    }
}

fn point_for(month: MonthKey, assets: &[ResolvedAsset], held: &BTreeMap<usize, Decimal>) -> NetWorthPoint {
    let mut total_assets = Decimal::ZERO;
    let mut liabilities = Decimal::ZERO;
    for (idx, value) in held {
        let signed = assets[*idx].signed(*value);
        if signed.is_sign_negative() {
            liabilities += -signed;
        } else {
            total_assets += signed;
        }
    }
    NetWorthPoint {
        month,
        assets: total_assets,
        liabilities,
        net_worth: total_assets - liabilities,
    }
}

fn by_type_for(assets: &[ResolvedAsset], held: &BTreeMap<usize, Decimal>) -> BTreeMap<String, Decimal> {
    let mut out: BTreeMap<String, Decimal> = BTreeMap::new();
    for (idx, value) in held {
        let a = &assets[*idx];
        *out.entry(a.asset_type.trim().to_lowercase()).or_insert(Decimal::ZERO) += a.signed(*value);
    }
    out
}

/// Month-by-month net worth plus per-asset and per-type series.
pub fn net_worth_series(records: &[AssetValueRecord], entities: &[AssetEntity]) -> NetWorthSeries {
    let (assets, valuations) = resolve(records, entities);
    let Some(last) = valuations.iter().map(|v| v.month).max() else {
        return NetWorthSeries::default();
    };

    let mut series = NetWorthSeries::default();
    walk_months(&assets, &valuations, last, |month, held| {
        series.points.push(point_for(month, &assets, held));
        for (idx, value) in held {
            let a = &assets[*idx];
            series
                .by_asset
                .entry(a.key.clone())
                .or_default()
                .push(SeriesPoint {
                    month,
                    value: a.signed(*value),
                });
        }
        for (asset_type, value) in by_type_for(&assets, held) {
            series
                .by_type
                .entry(asset_type)
                .or_default()
                .push(SeriesPoint { month, value });
        }
    });
    series
}

/// Position at the end of `month`, carrying values forward from earlier months.
pub fn position_as_of(
    records: &[AssetValueRecord],
    entities: &[AssetEntity],
    month: MonthKey,
) -> AssetPosition {
    let (assets, valuations) = resolve(records, entities);
    let mut position = AssetPosition {
        point: NetWorthPoint {
            month,
            assets: Decimal::ZERO,
            liabilities: Decimal::ZERO,
            net_worth: Decimal::ZERO,
        },
        by_type: BTreeMap::new(),
    };
    walk_months(&assets, &valuations, month, |m, held| {
        if m == month {
            position.point = point_for(m, &assets, held);
            position.by_type = by_type_for(&assets, held);
        }
    });
    position
}

/// Whether any live valuation was recorded during `month`.
pub fn has_value_in_month(records: &[AssetValueRecord], month: MonthKey) -> bool {
    records
        .iter()
        .filter(|r| r.is_live() && r.home_value().is_some())
        .filter_map(|r| parse_timestamp(&r.recorded_at))
        .any(|ts| month.contains(ts.date()))
}

/// Current cards: the most recent valuation per asset, regardless of month.
pub fn asset_overview(records: &[AssetValueRecord], entities: &[AssetEntity]) -> AssetOverview {
    let (assets, valuations) = resolve(records, entities);

    let mut latest: HashMap<usize, &Valuation<'_>> = HashMap::new();
    for v in &valuations {
        match latest.get(&v.asset) {
            Some(cur) if cur.recorded_at > v.recorded_at => {}
            _ => {
                latest.insert(v.asset, v);
            }
        }
    }

    let mut overview = AssetOverview::default();
    for (idx, a) in assets.iter().enumerate() {
        let found = latest.get(&idx);
        let signed = found.map(|v| a.signed(v.value));
        if a.status == AssetStatus::Active {
            if let Some(s) = signed {
                if s.is_sign_negative() {
                    overview.total_liabilities += -s;
                } else {
                    overview.total_assets += s;
                }
            }
        }
        overview.cards.push(AssetCard {
            asset_id: a.key.clone(),
            name: a.name.clone(),
            asset_type: a.asset_type.clone(),
            owner: a.owner.clone(),
            status: a.status,
            currency: a.currency.clone(),
            latest_value: found.map(|v| v.value),
            signed_value: signed,
            recorded_at: found.map(|v| v.record.recorded_at.clone()),
            linked: a.linked,
        });
    }
    overview.cards.sort_by(|x, y| {
        (x.status == AssetStatus::Disposed)
            .cmp(&(y.status == AssetStatus::Disposed))
            .then_with(|| x.name.to_lowercase().cmp(&y.name.to_lowercase()))
    });
    overview.net_worth = overview.total_assets - overview.total_liabilities;
    overview.has_assets = !overview.cards.is_empty();
    overview
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::PathBuf;

use crate::close::CloseInputs;
use crate::models::{
    AssetEntity, AssetStatus, AssetValueRecord, CloseStatus, Direction, MonthKey,
    MonthlyCloseRecord, MonthlySnapshot, Transaction, TransferPair,
};
use crate::normalize::parse_amount;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Hearthbook", "hearthbook"));

pub const DB_ENV: &str = "HEARTHBOOK_DB";

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP.0, APP.1, APP.2)
}

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV) {
        return Ok(PathBuf::from(p));
    }
    let proj = project_dirs().context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("hearthbook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL,
        account_name TEXT NOT NULL DEFAULT '',
        amount TEXT NOT NULL,
        currency TEXT NOT NULL,
        direction TEXT CHECK(direction IN ('credit','debit')),
        category TEXT NOT NULL DEFAULT '',
        is_transfer INTEGER NOT NULL DEFAULT 0,
        needs_review INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_ws ON transactions(workspace_id);

    -- a transaction sits in at most one pair
    CREATE TABLE IF NOT EXISTS transfer_pairs(
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        from_transaction_id TEXT NOT NULL UNIQUE,
        to_transaction_id TEXT NOT NULL UNIQUE,
        matched_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS assets(
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        owner TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','disposed')),
        currency TEXT NOT NULL,
        disposed_at TEXT
    );

    CREATE TABLE IF NOT EXISTS asset_values(
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        asset_id TEXT,
        asset_name TEXT NOT NULL,
        asset_type TEXT NOT NULL,
        value TEXT,
        currency TEXT NOT NULL,
        value_in_home_currency TEXT,
        fx_rate TEXT,
        fx_source TEXT,
        recorded_at TEXT NOT NULL,
        source TEXT NOT NULL DEFAULT 'manual',
        notes TEXT,
        deleted_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_asset_values_ws ON asset_values(workspace_id, recorded_at);

    CREATE TABLE IF NOT EXISTS monthly_close(
        workspace_id TEXT NOT NULL,
        month TEXT NOT NULL,
        status TEXT NOT NULL CHECK(status IN ('open','closed')),
        closed_at TEXT,
        closed_by TEXT,
        reopened_at TEXT,
        reopened_by TEXT,
        snapshot_id TEXT,
        PRIMARY KEY(workspace_id, month)
    );

    -- append-only
    CREATE TABLE IF NOT EXISTS monthly_snapshots(
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        month TEXT NOT NULL,
        created_at TEXT NOT NULL,
        created_by TEXT NOT NULL,
        payload TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_snapshots_month ON monthly_snapshots(workspace_id, month);
    "#,
    )?;
    Ok(())
}

// Home currency settings
pub fn get_home_currency(conn: &Connection) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='home_currency'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_home_currency(conn: &Connection, ccy: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('home_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![ccy],
    )?;
    Ok(())
}

fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<rust_decimal::Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    Ok(raw.as_deref().and_then(parse_amount))
}

fn month_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<MonthKey> {
    let raw: String = row.get(idx)?;
    raw.parse::<MonthKey>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub fn load_transactions(conn: &Connection, ws: &str) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, description, date, account_name, amount, currency, direction, category,
                is_transfer, needs_review
         FROM transactions WHERE workspace_id=?1 ORDER BY created_at, rowid",
    )?;
    let rows = stmt.query_map(params![ws], |r| {
        let direction: Option<String> = r.get(6)?;
        Ok(Transaction {
            id: r.get(0)?,
            description: r.get(1)?,
            date: r.get(2)?,
            account_name: r.get(3)?,
            amount: r.get(4)?,
            currency: r.get(5)?,
            direction: direction.as_deref().and_then(Direction::parse),
            category: r.get(7)?,
            is_transfer: r.get(8)?,
            needs_review: r.get(9)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn insert_transaction(conn: &Connection, ws: &str, t: &Transaction) -> Result<()> {
    conn.execute(
        "INSERT INTO transactions(id, workspace_id, description, date, account_name, amount,
                                  currency, direction, category, is_transfer, needs_review)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        params![
            t.id,
            ws,
            t.description,
            t.date,
            t.account_name,
            t.amount,
            t.currency,
            t.direction.map(|d| d.as_str()),
            t.category,
            t.is_transfer,
            t.needs_review
        ],
    )
    .with_context(|| format!("Insert transaction '{}'", t.id))?;
    Ok(())
}

pub fn load_pairs(conn: &Connection, ws: &str) -> Result<Vec<TransferPair>> {
    let mut stmt = conn.prepare(
        "SELECT id, from_transaction_id, to_transaction_id, matched_at
         FROM transfer_pairs WHERE workspace_id=?1 ORDER BY matched_at, id",
    )?;
    let rows = stmt.query_map(params![ws], |r| {
        Ok(TransferPair {
            id: r.get(0)?,
            from_transaction_id: r.get(1)?,
            to_transaction_id: r.get(2)?,
            matched_at: r.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn insert_pair(conn: &Connection, ws: &str, p: &TransferPair) -> Result<()> {
    conn.execute(
        "INSERT INTO transfer_pairs(id, workspace_id, from_transaction_id, to_transaction_id, matched_at)
         VALUES (?1,?2,?3,?4,?5)",
        params![p.id, ws, p.from_transaction_id, p.to_transaction_id, p.matched_at],
    )
    .with_context(|| {
        format!(
            "Pair {} -> {} (is one side already paired?)",
            p.from_transaction_id, p.to_transaction_id
        )
    })?;
    Ok(())
}

/// Unpairing returns both transactions to the suggestion pool.
pub fn delete_pair(conn: &Connection, ws: &str, id: &str) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM transfer_pairs WHERE workspace_id=?1 AND id=?2",
        params![ws, id],
    )?;
    Ok(n)
}

pub fn load_assets(conn: &Connection, ws: &str) -> Result<Vec<AssetEntity>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, owner, status, currency, disposed_at
         FROM assets WHERE workspace_id=?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![ws], |r| {
        let status: String = r.get(4)?;
        Ok(AssetEntity {
            id: r.get(0)?,
            name: r.get(1)?,
            asset_type: r.get(2)?,
            owner: r.get(3)?,
            status: AssetStatus::parse(&status),
            currency: r.get(5)?,
            disposed_at: r.get(6)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn insert_asset(conn: &Connection, ws: &str, a: &AssetEntity) -> Result<()> {
    conn.execute(
        "INSERT INTO assets(id, workspace_id, name, type, owner, status, currency, disposed_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
        params![
            a.id,
            ws,
            a.name,
            a.asset_type,
            a.owner,
            a.status.as_str(),
            a.currency,
            a.disposed_at
        ],
    )
    .with_context(|| format!("Insert asset '{}'", a.name))?;
    Ok(())
}

pub fn dispose_asset(conn: &Connection, ws: &str, id: &str, disposed_at: &str) -> Result<usize> {
    let n = conn.execute(
        "UPDATE assets SET status='disposed', disposed_at=?3
         WHERE workspace_id=?1 AND id=?2 AND status='active'",
        params![ws, id, disposed_at],
    )?;
    Ok(n)
}

pub fn load_asset_values(conn: &Connection, ws: &str) -> Result<Vec<AssetValueRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, asset_id, asset_name, asset_type, value, currency, value_in_home_currency,
                fx_rate, fx_source, recorded_at, source, notes, deleted_at
         FROM asset_values WHERE workspace_id=?1 ORDER BY recorded_at, id",
    )?;
    let rows = stmt.query_map(params![ws], |r| {
        Ok(AssetValueRecord {
            id: r.get(0)?,
            asset_id: r.get(1)?,
            asset_name: r.get(2)?,
            asset_type: r.get(3)?,
            value: decimal_col(r, 4)?,
            currency: r.get(5)?,
            value_in_home_currency: decimal_col(r, 6)?,
            fx_rate: decimal_col(r, 7)?,
            fx_source: r.get(8)?,
            recorded_at: r.get(9)?,
            source: r.get(10)?,
            notes: r.get(11)?,
            deleted_at: r.get(12)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn insert_asset_value(conn: &Connection, ws: &str, v: &AssetValueRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO asset_values(id, workspace_id, asset_id, asset_name, asset_type, value,
                                  currency, value_in_home_currency, fx_rate, fx_source,
                                  recorded_at, source, notes)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
        params![
            v.id,
            ws,
            v.asset_id,
            v.asset_name,
            v.asset_type,
            v.value.map(|d| d.to_string()),
            v.currency,
            v.value_in_home_currency.map(|d| d.to_string()),
            v.fx_rate.map(|d| d.to_string()),
            v.fx_source,
            v.recorded_at,
            v.source,
            v.notes
        ],
    )
    .with_context(|| format!("Insert value for '{}'", v.asset_name))?;
    Ok(())
}

/// Tombstone a valuation; rows are never removed.
pub fn soft_delete_asset_value(conn: &Connection, ws: &str, id: &str, at: &str) -> Result<usize> {
    let n = conn.execute(
        "UPDATE asset_values SET deleted_at=?3
         WHERE workspace_id=?1 AND id=?2 AND deleted_at IS NULL",
        params![ws, id, at],
    )?;
    Ok(n)
}

pub fn load_close_record(
    conn: &Connection,
    ws: &str,
    month: MonthKey,
) -> Result<Option<MonthlyCloseRecord>> {
    let rec = conn
        .query_row(
            "SELECT workspace_id, month, status, closed_at, closed_by, reopened_at, reopened_by,
                    snapshot_id
             FROM monthly_close WHERE workspace_id=?1 AND month=?2",
            params![ws, month.to_string()],
            |r| {
                let status: String = r.get(2)?;
                Ok(MonthlyCloseRecord {
                    workspace_id: r.get(0)?,
                    month: month_col(r, 1)?,
                    status: CloseStatus::parse(&status),
                    closed_at: r.get(3)?,
                    closed_by: r.get(4)?,
                    reopened_at: r.get(5)?,
                    reopened_by: r.get(6)?,
                    snapshot_id: r.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(rec)
}

pub fn load_snapshots(
    conn: &Connection,
    ws: &str,
    month: Option<MonthKey>,
) -> Result<Vec<MonthlySnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, workspace_id, month, created_at, created_by, payload
         FROM monthly_snapshots
         WHERE workspace_id=?1 AND (?2 IS NULL OR month=?2)
         ORDER BY month, created_at, rowid",
    )?;
    let rows = stmt.query_map(params![ws, month.map(|m| m.to_string())], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            month_col(r, 2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, workspace_id, month, created_at, created_by, payload) = row?;
        let payload = serde_json::from_str(&payload)
            .with_context(|| format!("Corrupt payload in snapshot {}", id))?;
        out.push(MonthlySnapshot {
            id,
            workspace_id,
            month,
            created_at,
            created_by,
            payload,
        });
    }
    Ok(out)
}

/// Persist a close/reopen: optional new snapshot plus the upserted record,
/// in one SQLite transaction.
pub fn save_close(
    conn: &mut Connection,
    record: &MonthlyCloseRecord,
    snapshot: Option<&MonthlySnapshot>,
) -> Result<()> {
    let tx = conn.transaction()?;
    if let Some(s) = snapshot {
        tx.execute(
            "INSERT INTO monthly_snapshots(id, workspace_id, month, created_at, created_by, payload)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                s.id,
                s.workspace_id,
                s.month.to_string(),
                s.created_at,
                s.created_by,
                serde_json::to_string(&s.payload)?
            ],
        )?;
    }
    tx.execute(
        "INSERT INTO monthly_close(workspace_id, month, status, closed_at, closed_by,
                                   reopened_at, reopened_by, snapshot_id)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8)
         ON CONFLICT(workspace_id, month) DO UPDATE SET
            status=excluded.status,
            closed_at=excluded.closed_at,
            closed_by=excluded.closed_by,
            reopened_at=excluded.reopened_at,
            reopened_by=excluded.reopened_by,
            snapshot_id=excluded.snapshot_id",
        params![
            record.workspace_id,
            record.month.to_string(),
            record.status.as_str(),
            record.closed_at,
            record.closed_by,
            record.reopened_at,
            record.reopened_by,
            record.snapshot_id
        ],
    )?;
    tx.commit()?;
    Ok(())
}

/// All of one workspace's records, loaded once per command.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceData {
    pub transactions: Vec<Transaction>,
    pub pairs: Vec<TransferPair>,
    pub assets: Vec<AssetEntity>,
    pub asset_values: Vec<AssetValueRecord>,
}

impl WorkspaceData {
    pub fn load(conn: &Connection, ws: &str) -> Result<Self> {
        Ok(Self {
            transactions: load_transactions(conn, ws)?,
            pairs: load_pairs(conn, ws)?,
            assets: load_assets(conn, ws)?,
            asset_values: load_asset_values(conn, ws)?,
        })
    }

    pub fn inputs(&self) -> CloseInputs<'_> {
        CloseInputs {
            transactions: &self.transactions,
            pairs: &self.pairs,
            asset_values: &self.asset_values,
            assets: &self.assets,
        }
    }
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use clap::ArgMatches;
use rusqlite::Connection;

use crate::config::EngineConfig;
use crate::db;

pub mod assets;
pub mod close;
pub mod config;
pub mod exporter;
pub mod reports;
pub mod transactions;
pub mod transfers;

/// Workspace from `--workspace`, else the configured default.
pub fn workspace(m: &ArgMatches, cfg: &EngineConfig) -> String {
    m.get_one::<String>("workspace")
        .cloned()
        .unwrap_or_else(|| cfg.default_workspace.clone())
}

pub fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a String> {
    m.get_one::<String>(name)
        .with_context(|| format!("Missing required argument --{}", name))
}

/// Database setting first, then config.
pub fn home_currency(conn: &Connection, cfg: &EngineConfig) -> Result<String> {
    Ok(db::get_home_currency(conn)?.unwrap_or_else(|| cfg.home_currency.clone()))
}

pub fn output_flags(m: &ArgMatches) -> (bool, bool) {
    (m.get_flag("json"), m.get_flag("jsonl"))
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;

use super::{home_currency, output_flags, required};
use crate::config::{EngineConfig, config_path};
use crate::db;
use crate::utils::maybe_print_json;

pub fn handle(conn: &Connection, cfg: &EngineConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => show(conn, cfg, sub)?,
        Some(("set-currency", sub)) => {
            let code = set_currency(conn, sub)?;
            println!("Home currency set to {}", code);
        }
        _ => {}
    }
    Ok(())
}

/// The loaded config with the database's home currency applied.
pub fn effective(conn: &Connection, cfg: &EngineConfig) -> Result<EngineConfig> {
    Ok(EngineConfig {
        home_currency: home_currency(conn, cfg)?,
        ..cfg.clone()
    })
}

fn show(conn: &Connection, cfg: &EngineConfig, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = output_flags(sub);
    let eff = effective(conn, cfg)?;
    if maybe_print_json(json_flag, jsonl_flag, &eff)? {
        return Ok(());
    }
    match config_path() {
        Some(p) => println!("# {}", p.display()),
        None => println!("# no config directory"),
    }
    print!("{}", toml::to_string_pretty(&eff)?);
    Ok(())
}

pub fn set_currency(conn: &Connection, sub: &clap::ArgMatches) -> Result<String> {
    let code = required(sub, "code")?.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        bail!("Currency must be a 3-letter code, got '{}'", code);
    }
    db::set_home_currency(conn, &code)?;
    Ok(code)
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_ENV: &str = "HEARTHBOOK_CONFIG";
const CONFIG_FILE: &str = "hearthbook.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub home_currency: String,
    pub default_workspace: String,
    pub transfer: MatchTolerance,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            home_currency: "GBP".to_string(),
            default_workspace: "default".to_string(),
            transfer: MatchTolerance::default(),
        }
    }
}

/// Windows a debit/credit pair must fall within to be suggested as a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTolerance {
    pub date_window_days: i64,
    /// Allowed amount gap as a fraction of the outflow's magnitude.
    pub amount_tolerance_ratio: Decimal,
}

impl Default for MatchTolerance {
    fn default() -> Self {
        Self {
            date_window_days: 10,
            amount_tolerance_ratio: Decimal::new(5, 3),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.transfer.date_window_days < 0 {
            return Err(Error::Config(format!(
                "transfer.date_window_days must be >= 0, got {}",
                self.transfer.date_window_days
            )));
        }
        if self.transfer.amount_tolerance_ratio.is_sign_negative() {
            return Err(Error::Config(format!(
                "transfer.amount_tolerance_ratio must be >= 0, got {}",
                self.transfer.amount_tolerance_ratio
            )));
        }
        if self.home_currency.trim().is_empty() {
            return Err(Error::Config("home_currency must not be empty".into()));
        }
        Ok(())
    }

    /// Read `path` if it exists, defaults otherwise.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    /// `$HEARTHBOOK_CONFIG`, else `hearthbook.toml` in the platform config dir.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    crate::db::project_dirs().map(|d| d.config_dir().join(CONFIG_FILE))
}

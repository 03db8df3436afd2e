// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

use crate::models::MonthKey;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Rejected month close state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloseError {
    #[error("Month {0} is already closed; reopen it before closing again")]
    AlreadyClosed(MonthKey),

    #[error("Month {0} is not closed")]
    NotClosed(MonthKey),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

//! Current date/time tool.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use std::fmt::Write;
use thiserror::Error;

pub const NAME: &str = "get_datetime";
pub const DESCRIPTION: &str = "Get the current date and time, optionally in UTC or with a strftime format.";

const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct DatetimeArgs {
    /// strftime pattern, defaults to "%Y-%m-%d %H:%M:%S"
    #[serde(default)]
    pub format: Option<String>,
    /// Report UTC instead of local time
    #[serde(default)]
    pub utc: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum DatetimeError {
    #[error("invalid format string '{0}'")]
    InvalidFormat(String),
}

pub fn current_datetime(args: DatetimeArgs) -> Result<String, DatetimeError> {
    let format = args.format.as_deref().unwrap_or(DEFAULT_FORMAT);
    if args.utc {
        render(&Utc::now(), format)
    } else {
        render(&Local::now(), format)
    }
}

fn render<Tz: TimeZone>(now: &DateTime<Tz>, format: &str) -> Result<String, DatetimeError>
where
    Tz::Offset: std::fmt::Display,
{
    let invalid = || DatetimeError::InvalidFormat(format.to_string());
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let mut out = String::new();
    write!(out, "{}", now.format(format)).map_err(|_| invalid())?;
    Ok(out)
}

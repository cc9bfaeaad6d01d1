//! Environment-based configuration
//!
//! | variable | meaning |
//! |---|---|
//! | `AWS_CLOUDWATCH_LOG_GROUP` | log group name (required) |
//! | `AWS_CLOUDWATCH_LOG_STREAM` | log stream name (required) |
//! | `AWS_CLOUDWATCH_LOG_RETENTION_DAYS` | retention for a newly created group |
//! | `AWS_CLOUDWATCH_LOG_BATCH_DURATION` | batch interval such as `500ms` or `1m30s` |
//! | `AWS_CLOUDWATCH_LOG_GROUP_TAGS` | `key=value,key2=value2` tags for a new group |
//! | `AWS_CLOUDWATCH_LOG_KMS_KEY_ID` | KMS key for a new group |
//! | `AWS_REGION` | region for the AWS client |

use super::hook::HookOptions;
use crate::core::{LoggerError, Result};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

pub const ENV_LOG_GROUP: &str = "AWS_CLOUDWATCH_LOG_GROUP";
pub const ENV_LOG_STREAM: &str = "AWS_CLOUDWATCH_LOG_STREAM";
pub const ENV_RETENTION_DAYS: &str = "AWS_CLOUDWATCH_LOG_RETENTION_DAYS";
pub const ENV_BATCH_DURATION: &str = "AWS_CLOUDWATCH_LOG_BATCH_DURATION";
pub const ENV_GROUP_TAGS: &str = "AWS_CLOUDWATCH_LOG_GROUP_TAGS";
pub const ENV_KMS_KEY_ID: &str = "AWS_CLOUDWATCH_LOG_KMS_KEY_ID";
pub const ENV_REGION: &str = "AWS_REGION";

/// Retention periods CloudWatch Logs accepts, in days
pub const RETENTION_DAYS: [u32; 22] = [
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

pub fn validate_retention_days(days: u32) -> Result<()> {
    if RETENTION_DAYS.contains(&days) {
        Ok(())
    } else {
        Err(LoggerError::config(
            ENV_RETENTION_DAYS,
            format!("{} is not a supported retention period", days),
        ))
    }
}

/// Everything needed to build a hook, as read from the environment
#[derive(Debug, Clone)]
pub struct HookConfig {
    pub group: String,
    pub stream: String,
    pub region: Option<String>,
    pub options: HookOptions,
}

impl HookConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (group, stream) = match (get(ENV_LOG_GROUP), get(ENV_LOG_STREAM)) {
            (Some(group), Some(stream)) => (group, stream),
            _ => {
                return Err(LoggerError::config(
                    "environment",
                    format!("please set {} and {}", ENV_LOG_GROUP, ENV_LOG_STREAM),
                ))
            }
        };

        let mut options = HookOptions::new();

        if let Some(raw) = get(ENV_RETENTION_DAYS) {
            let days = raw.trim().parse::<u32>().map_err(|_| {
                LoggerError::config(ENV_RETENTION_DAYS, format!("'{}' must be an integer", raw))
            })?;
            validate_retention_days(days)?;
            options = options.with_group_retention_days(days);
        }

        if let Some(raw) = get(ENV_BATCH_DURATION) {
            let duration = parse_duration(&raw).map_err(|message| {
                LoggerError::config(ENV_BATCH_DURATION, message)
            })?;
            options = options.with_batch_duration(duration);
        }

        if let Some(raw) = get(ENV_GROUP_TAGS) {
            let tags = parse_tags(&raw);
            if !tags.is_empty() {
                options = options.with_group_tags(tags);
            }
        }

        if let Some(key_id) = get(ENV_KMS_KEY_ID) {
            options = options.with_group_kms_key_id(key_id.trim());
        }

        Ok(Self {
            group,
            stream,
            region: get(ENV_REGION),
            options,
        })
    }
}

/// Parse `k=v,k2=v2,k3` into tags
///
/// Keys and values are trimmed. A pair without `=` gets an empty value;
/// one with more than one `=` is taken as a key only.
pub fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter(|tag| !tag.trim().is_empty())
        .map(|tag| {
            let parts: Vec<&str> = tag.split('=').collect();
            match parts.as_slice() {
                [key, value] => (key.trim().to_string(), value.trim().to_string()),
                [key, ..] => (key.trim().to_string(), String::new()),
                [] => (String::new(), String::new()),
            }
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Parse a duration such as `300ms`, `1.5h` or `2h45m`
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is allowed.
pub fn parse_duration(raw: &str) -> std::result::Result<Duration, String> {
    let input = raw.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if input.starts_with('-') {
        return Err(format!("'{}' must not be negative", raw));
    }

    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.is_empty() {
        return Err(format!("'{}' is not a valid duration", raw));
    }
    let mut total_nanos: f64 = 0.0;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("'{}' is not a valid duration", raw));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("'{}' is not a valid duration", raw))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("'{}' is missing a unit", raw)),
            unit => return Err(format!("unknown unit '{}' in '{}'", unit, raw)),
        };
        rest = &rest[unit_len..];

        total_nanos += value * nanos_per_unit;
    }

    if total_nanos > u64::MAX as f64 {
        return Err(format!("'{}' is too large", raw));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

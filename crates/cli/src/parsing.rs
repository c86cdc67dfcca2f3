// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value parsers for clap arguments over types that intentionally have no
//! `FromStr` impl (the `define_id!` id newtypes) or that clap can't derive
//! `ValueEnum` for without pulling clap into `casare-core`.

use casare_core::{Capability, JobId, Priority, RobotId, ScheduleId, WorkflowId};

macro_rules! id_parser {
    ($fn_name:ident, $ty:ty) => {
        pub fn $fn_name(s: &str) -> Result<$ty, std::convert::Infallible> {
            Ok(<$ty>::from_string(s))
        }
    };
}

id_parser!(job_id, JobId);
id_parser!(robot_id, RobotId);
id_parser!(workflow_id, WorkflowId);
id_parser!(schedule_id, ScheduleId);

pub fn priority(s: &str) -> Result<Priority, String> {
    match s.to_ascii_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "normal" => Ok(Priority::Normal),
        "high" => Ok(Priority::High),
        "critical" => Ok(Priority::Critical),
        other => Err(format!("invalid priority {other:?} (expected low|normal|high|critical)")),
    }
}

pub fn capability(s: &str) -> Result<Capability, String> {
    match s.to_ascii_lowercase().as_str() {
        "browser" => Ok(Capability::Browser),
        "desktop" => Ok(Capability::Desktop),
        "gpu" => Ok(Capability::Gpu),
        "cloud" => Ok(Capability::Cloud),
        other => Err(format!("invalid capability {other:?} (expected browser|desktop|gpu|cloud)")),
    }
}

/// Parse a `key=value` parameter into a `(String, serde_json::Value)` pair.
/// The value is parsed as JSON if possible, else kept as a plain string.
pub fn key_value_json(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

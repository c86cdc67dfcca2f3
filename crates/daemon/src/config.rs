// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration resolution for `casared` (spec.md §6.4).
//!
//! Precedence, highest first: CLI flags > environment variables
//! (`CASARE_*`) > a TOML config file > the documented defaults. Every
//! field here has the spec's literal default value.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cli::Args;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    ParseToml { path: PathBuf, source: toml::de::Error },
    #[error("invalid socket address {0:?}: {1}")]
    InvalidAddr(String, std::net::AddrParseError),
    #[error("no home directory available to resolve a default state directory")]
    NoStateDir,
}

/// The Selection Service strategy named by config. Only `CapabilityScore`
/// (spec.md §4.4's scored auto-selection) is implemented by
/// `casare-selection`; `LeastLoaded` is accepted for wire/config
/// compatibility but falls back to `CapabilityScore` with a startup warning,
/// since the corpus never built a second scoring function for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancing {
    LeastLoaded,
    CapabilityScore,
}

impl Default for LoadBalancing {
    fn default() -> Self {
        LoadBalancing::CapabilityScore
    }
}

/// Deserialized shape of the optional TOML config file. Every field is
/// optional so a file only needs to name the settings it overrides.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    state_dir: Option<PathBuf>,
    admin_socket_path: Option<PathBuf>,
    websocket_bind: Option<String>,
    webhook_bind: Option<String>,
    webhook_shared_secret: Option<String>,
    dispatch_interval_seconds: Option<u64>,
    heartbeat_timeout_seconds: Option<u64>,
    heartbeat_sweep_interval_seconds: Option<u64>,
    default_job_timeout_seconds: Option<u64>,
    assign_ack_timeout_seconds: Option<u64>,
    cancel_grace_seconds: Option<u64>,
    max_reject_retries: Option<u32>,
    load_balancing: Option<LoadBalancing>,
    log_buffer_size: Option<usize>,
    scheduler_tick_seconds: Option<u64>,
    log_retention_days: Option<u32>,
    checkpoint_interval_seconds: Option<u64>,
}

/// Fully resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub admin_socket_path: PathBuf,
    pub websocket_bind: SocketAddr,
    pub webhook_bind: SocketAddr,
    pub webhook_shared_secret: String,
    pub dispatch_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub heartbeat_sweep_interval: Duration,
    pub default_job_timeout: Duration,
    pub assign_ack_timeout: Duration,
    pub cancel_grace: Duration,
    pub max_reject_retries: u32,
    pub load_balancing: LoadBalancing,
    pub log_buffer_size: usize,
    pub scheduler_tick: Duration,
    pub log_retention_days: u32,
    pub checkpoint_interval: Duration,
}

/// `CASARE_STATE_DIR` > `XDG_STATE_HOME/casare` > `~/.local/state/casare`.
fn default_state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("CASARE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("casare"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/casare"))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_u64(name: &str) -> Option<u64> {
    env_string(name).and_then(|s| s.parse().ok())
}

fn env_u32(name: &str) -> Option<u32> {
    env_string(name).and_then(|s| s.parse().ok())
}

fn parse_addr(s: &str) -> Result<SocketAddr, ConfigError> {
    s.parse().map_err(|e| ConfigError::InvalidAddr(s.to_string(), e))
}

fn env_load_balancing(name: &str) -> Option<LoadBalancing> {
    match env_string(name)?.as_str() {
        "least_loaded" => Some(LoadBalancing::LeastLoaded),
        "capability_score" => Some(LoadBalancing::CapabilityScore),
        other => {
            tracing::warn!(%name, value = other, "unrecognized load balancing value, ignoring");
            None
        }
    }
}

impl Config {
    /// Resolve the final config: flags override env, env overrides the TOML
    /// file (if any), the file overrides the built-in defaults.
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::ReadFile { path: path.clone(), source })?;
                toml::from_str::<FileConfig>(&text)
                    .map_err(|source| ConfigError::ParseToml { path: path.clone(), source })?
            }
            None => FileConfig::default(),
        };

        let state_dir = args
            .state_dir
            .clone()
            .or_else(|| env_string("CASARE_STATE_DIR").map(PathBuf::from))
            .or(file.state_dir)
            .map(Ok)
            .unwrap_or_else(default_state_dir)?;

        let admin_socket_path = args
            .admin_socket
            .clone()
            .or_else(|| env_string("CASARE_ADMIN_SOCKET").map(PathBuf::from))
            .or(file.admin_socket_path)
            .unwrap_or_else(|| state_dir.join("admin.sock"));

        let websocket_bind_str = args
            .websocket_bind
            .clone()
            .or_else(|| env_string("CASARE_WEBSOCKET_BIND"))
            .or(file.websocket_bind)
            .unwrap_or_else(|| "0.0.0.0:8765".to_string());

        let webhook_bind_str = args
            .webhook_bind
            .clone()
            .or_else(|| env_string("CASARE_WEBHOOK_BIND"))
            .or(file.webhook_bind)
            .unwrap_or_else(|| "0.0.0.0:8766".to_string());

        let webhook_shared_secret = args
            .webhook_shared_secret
            .clone()
            .or_else(|| env_string("CASARE_WEBHOOK_SHARED_SECRET"))
            .or(file.webhook_shared_secret)
            .unwrap_or_default();

        let load_balancing = env_load_balancing("CASARE_LOAD_BALANCING").or(file.load_balancing).unwrap_or_default();
        if load_balancing == LoadBalancing::LeastLoaded {
            tracing::warn!(
                "load_balancing=least_loaded requested but not implemented; using capability_score"
            );
        }

        Ok(Self {
            websocket_bind: parse_addr(&websocket_bind_str)?,
            webhook_bind: parse_addr(&webhook_bind_str)?,
            admin_socket_path,
            webhook_shared_secret,
            dispatch_interval: Duration::from_secs(
                env_u64("CASARE_DISPATCH_INTERVAL_SECONDS")
                    .or(file.dispatch_interval_seconds)
                    .unwrap_or(5),
            ),
            heartbeat_timeout: Duration::from_secs(
                env_u64("CASARE_HEARTBEAT_TIMEOUT_SECONDS")
                    .or(file.heartbeat_timeout_seconds)
                    .unwrap_or(90),
            ),
            heartbeat_sweep_interval: Duration::from_secs(
                env_u64("CASARE_HEARTBEAT_SWEEP_INTERVAL_SECONDS")
                    .or(file.heartbeat_sweep_interval_seconds)
                    .unwrap_or(30),
            ),
            default_job_timeout: Duration::from_secs(
                env_u64("CASARE_DEFAULT_JOB_TIMEOUT_SECONDS")
                    .or(file.default_job_timeout_seconds)
                    .unwrap_or(3600),
            ),
            assign_ack_timeout: Duration::from_secs(
                env_u64("CASARE_ASSIGN_ACK_TIMEOUT_SECONDS")
                    .or(file.assign_ack_timeout_seconds)
                    .unwrap_or(10),
            ),
            cancel_grace: Duration::from_secs(
                env_u64("CASARE_CANCEL_GRACE_SECONDS").or(file.cancel_grace_seconds).unwrap_or(30),
            ),
            max_reject_retries: env_u32("CASARE_MAX_REJECT_RETRIES")
                .or(file.max_reject_retries)
                .unwrap_or(3),
            load_balancing,
            log_buffer_size: env_string("CASARE_LOG_BUFFER_SIZE")
                .and_then(|s| s.parse().ok())
                .or(file.log_buffer_size)
                .unwrap_or(1000),
            scheduler_tick: Duration::from_secs(
                env_u64("CASARE_SCHEDULER_TICK_SECONDS").or(file.scheduler_tick_seconds).unwrap_or(1),
            ),
            log_retention_days: env_u32("CASARE_LOG_RETENTION_DAYS")
                .or(file.log_retention_days)
                .unwrap_or(30),
            checkpoint_interval: Duration::from_secs(
                env_u64("CASARE_CHECKPOINT_INTERVAL_SECONDS")
                    .or(file.checkpoint_interval_seconds)
                    .unwrap_or(300),
            ),
            state_dir,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

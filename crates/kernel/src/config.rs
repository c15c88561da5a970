//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;

use crate::security::{CallerContext, PolicyPreset, SecurityPolicy};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the file-backed store (default: ./folio-data.json).
    pub store_path: PathBuf,

    /// Security policy preset (default: strict).
    pub security_policy: PolicyPreset,

    /// Override for the preset's failed-attempt ceiling.
    pub max_login_attempts: Option<usize>,

    /// Override for the preset's inactivity timeout, in minutes.
    pub session_timeout_mins: Option<i64>,

    /// Lockout duration in minutes (default: 15).
    pub lockout_mins: i64,

    /// User agent recorded in security log entries.
    pub user_agent: String,

    /// Origin URL recorded in security log entries.
    pub origin_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let store_path = lookup("FOLIO_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./folio-data.json"));

        let security_policy = match lookup("FOLIO_SECURITY_POLICY") {
            Some(value) => value
                .parse::<PolicyPreset>()
                .map_err(anyhow::Error::msg)
                .context("FOLIO_SECURITY_POLICY must be 'strict' or 'standard'")?,
            None => PolicyPreset::default(),
        };

        let max_login_attempts = lookup("FOLIO_MAX_LOGIN_ATTEMPTS")
            .map(|v| v.trim().parse())
            .transpose()
            .context("FOLIO_MAX_LOGIN_ATTEMPTS must be a valid usize")?;

        let session_timeout_mins = lookup("FOLIO_SESSION_TIMEOUT_MINS")
            .map(|v| v.trim().parse())
            .transpose()
            .context("FOLIO_SESSION_TIMEOUT_MINS must be a valid integer")?;

        let lockout_mins = lookup("FOLIO_LOCKOUT_MINS")
            .unwrap_or_else(|| "15".to_string())
            .trim()
            .parse()
            .context("FOLIO_LOCKOUT_MINS must be a valid integer")?;

        let defaults = CallerContext::default();
        let user_agent = lookup("FOLIO_USER_AGENT").unwrap_or(defaults.user_agent);
        let origin_url = lookup("FOLIO_ORIGIN_URL").unwrap_or(defaults.url);

        Ok(Self {
            store_path,
            security_policy,
            max_login_attempts,
            session_timeout_mins,
            lockout_mins,
            user_agent,
            origin_url,
        })
    }

    /// The preset with any overrides applied.
    pub fn policy(&self) -> SecurityPolicy {
        let mut policy = SecurityPolicy::preset(self.security_policy);
        if let Some(max) = self.max_login_attempts {
            policy.max_login_attempts = max;
        }
        if let Some(mins) = self.session_timeout_mins {
            policy.session_timeout = Duration::minutes(mins);
        }
        // Failed attempts count for as long as a lockout would last.
        policy.lockout_duration = Duration::minutes(self.lockout_mins);
        policy.attempt_window = policy.lockout_duration;
        policy
    }

    /// Context attached to security log entries.
    pub fn caller_context(&self) -> CallerContext {
        CallerContext {
            user_agent: self.user_agent.clone(),
            url: self.origin_url.clone(),
        }
    }
}

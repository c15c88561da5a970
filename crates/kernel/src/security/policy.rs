//! Security policy constants.
//!
//! Two presets exist because the admin login gate and the general session
//! guard historically disagreed on attempt ceilings and timeouts. Which one
//! applies is a configuration choice (`FOLIO_SECURITY_POLICY`).

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

/// Named policy preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyPreset {
    /// 3 attempts, 30-minute inactivity timeout.
    #[default]
    Strict,
    /// 5 attempts, 1-hour inactivity timeout.
    Standard,
}

impl FromStr for PolicyPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(PolicyPreset::Strict),
            "standard" => Ok(PolicyPreset::Standard),
            other => Err(format!("unknown security policy '{other}'")),
        }
    }
}

impl fmt::Display for PolicyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyPreset::Strict => f.write_str("strict"),
            PolicyPreset::Standard => f.write_str("standard"),
        }
    }
}

/// Limits enforced by the security engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    /// Failed attempts within `attempt_window` that trigger a lockout.
    pub max_login_attempts: usize,
    /// How long a lockout lasts.
    pub lockout_duration: Duration,
    /// How far back failed attempts count.
    pub attempt_window: Duration,
    /// Inactivity after which the session is considered timed out.
    pub session_timeout: Duration,
    /// Absolute lifetime of an issued session.
    pub session_lifetime: Duration,
    pub min_password_length: usize,
    /// Security log entries kept; older ones are evicted.
    pub log_capacity: usize,
}

impl SecurityPolicy {
    /// Build the policy for a preset.
    pub fn preset(preset: PolicyPreset) -> Self {
        match preset {
            PolicyPreset::Strict => Self::strict(),
            PolicyPreset::Standard => Self::standard(),
        }
    }

    pub fn strict() -> Self {
        Self {
            max_login_attempts: 3,
            lockout_duration: Duration::minutes(15),
            attempt_window: Duration::minutes(15),
            session_timeout: Duration::minutes(30),
            session_lifetime: Duration::hours(24),
            min_password_length: 8,
            log_capacity: 100,
        }
    }

    pub fn standard() -> Self {
        Self {
            max_login_attempts: 5,
            session_timeout: Duration::hours(1),
            ..Self::strict()
        }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::strict()
    }
}

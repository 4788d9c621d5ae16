//! Bus configuration.
//!
//! ```rust,ignore
//! let config = BusConfig {
//!     name: "source-pane".into(),
//!     policy: DispatchPolicy::Isolate,
//! };
//! let bus = Bus::with_config(config);
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

/// Environment variable naming the bus in log output.
pub const ENV_BUS_NAME: &str = "HERALD_BUS_NAME";

/// Environment variable selecting the [`DispatchPolicy`].
pub const ENV_DISPATCH_POLICY: &str = "HERALD_DISPATCH_POLICY";

/// What a fire does when a handler returns an error.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchPolicy {
    /// Stop at the first failing handler and return its error.
    #[default]
    FailFast,
    /// Log each failure, keep delivering, and report all failures at the end.
    Isolate,
}

impl fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPolicy::FailFast => write!(f, "fail-fast"),
            DispatchPolicy::Isolate => write!(f, "isolate"),
        }
    }
}

/// Returned when a dispatch policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dispatch policy '{0}', expected 'fail-fast' or 'isolate'")]
pub struct UnknownPolicy(pub String);

impl FromStr for DispatchPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Ok(DispatchPolicy::FailFast),
            "isolate" => Ok(DispatchPolicy::Isolate),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Settings for one [`Bus`](crate::Bus).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Name used in log output.
    pub name: String,
    /// Handler failure policy.
    pub policy: DispatchPolicy,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: "bus".into(),
            policy: DispatchPolicy::FailFast,
        }
    }
}

impl BusConfig {
    /// Read overrides from `HERALD_BUS_NAME` and `HERALD_DISPATCH_POLICY`.
    ///
    /// Unset variables keep their defaults. An unrecognised policy is an error
    /// rather than a silent fallback.
    pub fn from_env() -> Result<Self, UnknownPolicy> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, UnknownPolicy> {
        let mut config = Self::default();
        if let Some(name) = lookup(ENV_BUS_NAME) {
            config.name = name;
        }
        if let Some(policy) = lookup(ENV_DISPATCH_POLICY) {
            config.policy = policy.parse()?;
        }
        Ok(config)
    }
}

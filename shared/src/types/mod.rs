//! Core types used throughout the growth orchestration engine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{SharedError, SharedResult};

pub mod analytics;
pub mod compliance;
pub mod health;
pub mod module;
pub mod run;
pub mod strategy;

pub use analytics::*;
pub use compliance::*;
pub use health::*;
pub use module::*;
pub use run::*;
pub use strategy::*;

/// Business domain partition that scopes strategy, execution and analytics.
///
/// Stored trimmed and lowercased so "Finance" and " finance " share history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vertical(String);

impl Vertical {
    pub fn new(name: impl AsRef<str>) -> SharedResult<Self> {
        let normalized = name.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(SharedError::InvalidVertical {
                input: name.as_ref().to_string(),
            });
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Vertical {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vertical::new(s)
    }
}

impl TryFrom<String> for Vertical {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Vertical::new(value)
    }
}

impl From<Vertical> for String {
    fn from(value: Vertical) -> Self {
        value.0
    }
}

/// The seven growth sub-systems driven by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Seo,
    Content,
    Referral,
    Backlink,
    Social,
    Email,
    Conversion,
}

impl ModuleKind {
    /// Canonical execution and reporting order
    pub const ALL: [ModuleKind; 7] = [
        ModuleKind::Seo,
        ModuleKind::Content,
        ModuleKind::Referral,
        ModuleKind::Backlink,
        ModuleKind::Social,
        ModuleKind::Email,
        ModuleKind::Conversion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Seo => "seo",
            ModuleKind::Content => "content",
            ModuleKind::Referral => "referral",
            ModuleKind::Backlink => "backlink",
            ModuleKind::Social => "social",
            ModuleKind::Email => "email",
            ModuleKind::Conversion => "conversion",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| SharedError::UnknownModule { input: s.to_string() })
    }
}

/// Analytics query window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Day,
    #[default]
    Week,
    Month,
    Quarter,
    Year,
    All,
}

impl Timeframe {
    /// Length of the window, `None` for unbounded
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Timeframe::Day => Some(Duration::days(1)),
            Timeframe::Week => Some(Duration::days(7)),
            Timeframe::Month => Some(Duration::days(30)),
            Timeframe::Quarter => Some(Duration::days(90)),
            Timeframe::Year => Some(Duration::days(365)),
            Timeframe::All => None,
        }
    }

    /// Earliest instant covered by the window ending at `now`
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.duration() {
            Some(window) => now - window,
            None => DateTime::<Utc>::MIN_UTC,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Timeframe::Day => "1d",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
            Timeframe::Quarter => "90d",
            Timeframe::Year => "365d",
            Timeframe::All => "all",
        };
        f.write_str(label)
    }
}

impl FromStr for Timeframe {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "24h" | "1d" | "day" => Ok(Timeframe::Day),
            "7d" | "week" => Ok(Timeframe::Week),
            "30d" | "month" => Ok(Timeframe::Month),
            "90d" | "quarter" => Ok(Timeframe::Quarter),
            "365d" | "1y" | "year" => Ok(Timeframe::Year),
            "all" => Ok(Timeframe::All),
            _ => Err(SharedError::UnknownTimeframe { input: s.to_string() }),
        }
    }
}

/// Component identifier attached to every log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Orchestrator,
    HealthMonitor,
    Recorder,
    Scheduler,
    Module(ModuleKind),
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Orchestrator => write!(f, "orchestrator"),
            ComponentId::HealthMonitor => write!(f, "health_monitor"),
            ComponentId::Recorder => write!(f, "recorder"),
            ComponentId::Scheduler => write!(f, "scheduler"),
            ComponentId::Module(kind) => write!(f, "module:{kind}"),
        }
    }
}

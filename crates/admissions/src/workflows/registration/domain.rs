use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Identifier wrapper for registration periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(pub Uuid);

impl PeriodId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PeriodId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw.trim()).map(Self)
    }
}

/// Stored flag for a period. The flag alone does not admit submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodStatus {
    Open,
    Closed,
}

impl PeriodStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PeriodStatus::Open => "OPEN",
            PeriodStatus::Closed => "CLOSED",
        }
    }
}

/// A named intake window. At most one period carries `Open` at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPeriod {
    pub id: PeriodId,
    pub name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: PeriodStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationPeriod {
    /// True when the period is flagged open and `now` falls inside `[start_at, end_at)`.
    pub fn admits_at(&self, now: DateTime<Utc>) -> bool {
        self.status == PeriodStatus::Open && self.start_at <= now && now < self.end_at
    }

    /// Ordering used to pick a single active period should several qualify.
    pub(crate) fn recency_key(&self) -> (DateTime<Utc>, DateTime<Utc>, PeriodId) {
        (self.start_at, self.created_at, self.id)
    }
}

/// Payload for creating a period; new periods always start closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPeriod {
    pub name: String,
    #[serde(deserialize_with = "deserialize_instant")]
    pub start_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_instant")]
    pub end_at: DateTime<Utc>,
}

/// Partial update; absent fields are left untouched and status is never changed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_instant")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_instant")]
    pub end_at: Option<DateTime<Utc>>,
}

impl PeriodUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.start_at.is_none() && self.end_at.is_none()
    }

    pub(crate) fn merge_into(self, period: &mut RegistrationPeriod) {
        if let Some(name) = self.name {
            period.name = name;
        }
        if let Some(start_at) = self.start_at {
            period.start_at = start_at;
        }
        if let Some(end_at) = self.end_at {
            period.end_at = end_at;
        }
    }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD`, read as midnight UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("failed to parse '{raw}' as RFC 3339 or YYYY-MM-DD"))
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_instant<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_instant(&raw).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

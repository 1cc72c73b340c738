//! Core domain model for iLandscape portfolio analytics.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `RawAssetRecord`: an IP asset as delivered by the asset API (untrusted shape)
//! - `NormalizedAssetRecord`: the canonical record with derived field and region
//! - `Granularity`: the time bucket size selected for trend tables
//! - `LandscapeReport`: the bundle of aggregate tables handed to the renderer

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bucket label for absent categorical values and undated records.
pub const UNKNOWN: &str = "Unknown";

/// Bucket label for values that are present but not recognized.
pub const OTHER: &str = "Other";

/// Asset type labels used by the asset API.
pub mod asset_type {
    pub const PATENT: &str = "PATENT";
    pub const TRADEMARK: &str = "TRADEMARK";
}

/// Priority label counted by the high-priority radar metric.
pub const HIGH_PRIORITY: &str = "High";

/// Legal statuses tracked by the status dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackedStatus {
    /// Application submitted and awaiting initial review
    Filed,
    /// Application published by the office
    Published,
    /// Rights granted and active
    Granted,
    /// Under examination by the office
    UnderExamination,
}

impl TrackedStatus {
    pub const ALL: [TrackedStatus; 4] = [
        Self::Filed,
        Self::Published,
        Self::Granted,
        Self::UnderExamination,
    ];

    /// The wire label (`"GRANTED"`, `"UNDER_EXAMINATION"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filed => "FILED",
            Self::Published => "PUBLISHED",
            Self::Granted => "GRANTED",
            Self::UnderExamination => "UNDER_EXAMINATION",
        }
    }

    /// Exact match on the wire label. Anything else is untracked.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == label)
    }
}

/// A filing date as it arrives at the boundary.
///
/// Deserializes a bare `YYYY-MM-DD` string as `Calendar`; any other string
/// is kept verbatim and judged by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RawDate {
    Calendar(NaiveDate),
    Text(String),
}

impl RawDate {
    /// Strict `YYYY-MM-DD`: exactly ten ASCII characters, no padding, no
    /// time component, and a real calendar day.
    pub fn parse_calendar(text: &str) -> Option<NaiveDate> {
        let bytes = text.as_bytes();
        let shaped = bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shaped {
            return None;
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
    }
}

impl<'de> Deserialize<'de> for RawDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(match Self::parse_calendar(&text) {
            Some(date) => Self::Calendar(date),
            None => Self::Text(text),
        })
    }
}

impl From<NaiveDate> for RawDate {
    fn from(date: NaiveDate) -> Self {
        Self::Calendar(date)
    }
}

impl From<&str> for RawDate {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// An IP asset record as returned by the asset API.
///
/// Every field is optional. Empty strings are treated like absent values
/// by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssetRecord {
    /// Office application number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    /// "PATENT", "TRADEMARK", or anything else the API sends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,

    /// Free-form legal status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<RawDate>,

    /// Last status change timestamp (ISO date or date-time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<String>,

    /// Two-letter country code, or free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// "High", "Medium", "Low"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Pre-populated technology field override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patent_field: Option<String>,

    /// Pre-populated region override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl RawAssetRecord {
    /// Create a minimal record for testing.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.legal_status = Some(status.into());
        self
    }

    pub fn with_filing_date(mut self, date: impl Into<RawDate>) -> Self {
        self.filing_date = Some(date.into());
        self
    }

    pub fn with_updated_on(mut self, updated_on: impl Into<String>) -> Self {
        self.updated_on = Some(updated_on.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Read a record out of an arbitrary JSON value.
    ///
    /// Returns `None` for anything that is not an object. Fields of the
    /// wrong JSON type are dropped instead of failing the record.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        Some(Self {
            application_number: text("applicationNumber"),
            title: text("title"),
            abstract_text: text("abstractText"),
            asset_type: text("assetType"),
            legal_status: text("legalStatus"),
            filing_date: text("filingDate").map(RawDate::Text),
            updated_on: text("updatedOn"),
            country: text("country"),
            priority: text("priority"),
            patent_field: text("patentField"),
            region: text("region"),
        })
    }
}

/// Read a record collection out of an arbitrary JSON value.
///
/// Non-array input yields an empty collection; `null` and non-object
/// entries are skipped. Order of the surviving entries is preserved.
pub fn parse_collection(value: &Value) -> Vec<RawAssetRecord> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(RawAssetRecord::from_value).collect())
        .unwrap_or_default()
}

/// A record after derived-field completion, safe for aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAssetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    /// Defaults to "PATENT"
    pub asset_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_status: Option<String>,

    /// `None` when missing or unparsable
    pub filing_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<NaiveDateTime>,

    /// Raw country, defaults to "Unknown"
    pub country: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Technology field label or "Other"
    pub patent_field: String,

    /// Region label, "Other", or "Unknown"
    pub region: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GranularityError {
    #[error("Unsupported granularity: {0}")]
    Unsupported(String),
}

/// Time bucket size for trend tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    Weekly,
    Monthly,
    Quarterly,
    HalfYearly,
    #[default]
    Yearly,
}

impl Granularity {
    pub const ALL: [Granularity; 5] = [
        Self::Weekly,
        Self::Monthly,
        Self::Quarterly,
        Self::HalfYearly,
        Self::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::HalfYearly => "half-yearly",
            Self::Yearly => "yearly",
        }
    }

    /// Lenient parse: unrecognized selectors fall back to `Yearly`.
    pub fn from_selector(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for Granularity {
    type Err = GranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "half-yearly" | "halfyearly" => Ok(Self::HalfYearly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(GranularityError::Unsupported(s.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a distribution table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub key: String,
    pub count: usize,
}

impl CountRow {
    pub fn new(key: impl Into<String>, count: usize) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Filing counts for one period, split by asset type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub filings: usize,
    pub patents: usize,
    pub trademarks: usize,
}

/// Tracked-status counts for one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StatusTrendPoint {
    #[serde(rename = "period")]
    pub period: String,
    pub filed: usize,
    pub published: usize,
    pub granted: usize,
    pub under_examination: usize,
}

impl StatusTrendPoint {
    pub fn count_mut(&mut self, status: TrackedStatus) -> &mut usize {
        match status {
            TrackedStatus::Filed => &mut self.filed,
            TrackedStatus::Published => &mut self.published,
            TrackedStatus::Granted => &mut self.granted,
            TrackedStatus::UnderExamination => &mut self.under_examination,
        }
    }
}

/// Days between filing and the last status update of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub processing_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleSummary {
    pub entries: Vec<LifecycleEntry>,
    /// Mean processing days, 0.0 when there are no entries
    pub average_days: f64,
}

/// The five radar dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadarDimension {
    #[serde(rename = "Filing Volume")]
    FilingVolume,
    #[serde(rename = "Granted Rate")]
    GrantedRate,
    #[serde(rename = "Patent Ratio")]
    PatentRatio,
    #[serde(rename = "High Priority")]
    HighPriority,
    #[serde(rename = "Recent Activity")]
    RecentActivity,
}

impl RadarDimension {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FilingVolume => "Filing Volume",
            Self::GrantedRate => "Granted Rate",
            Self::PatentRatio => "Patent Ratio",
            Self::HighPriority => "High Priority",
            Self::RecentActivity => "Recent Activity",
        }
    }
}

/// One radar score, an integer percentage in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarMetric {
    pub metric: RadarDimension,
    pub value: u8,
}

/// Every table computed for one (records, selection, granularity) input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandscapeReport {
    pub granularity: Granularity,
    pub filing_trend: Vec<TrendPoint>,
    pub type_distribution: Vec<CountRow>,
    pub field_distribution: Vec<CountRow>,
    pub priority_distribution: Vec<CountRow>,
    pub regional_distribution: Vec<CountRow>,
    pub country_distribution: Vec<CountRow>,
    pub periodic_activity: Vec<CountRow>,
    pub status_distribution: Vec<CountRow>,
    pub status_trend: Vec<StatusTrendPoint>,
    pub lifecycle: LifecycleSummary,
    pub radar: Vec<RadarMetric>,
}

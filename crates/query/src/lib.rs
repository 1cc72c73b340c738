//! Record selection for the landscape views.
//!
//! Translates the dashboard's filter selectors (legal status, technology
//! field, asset type) into an `AssetSelection` and applies it to
//! normalized records. The selector value `"all"` means no constraint.

use iplandscape_model::NormalizedAssetRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selector value that disables a constraint.
pub const ALL: &str = "all";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Empty {0} selector")]
    EmptySelector(&'static str),
}

/// Active filter on the record set. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSelection {
    /// Legal status, compared case-insensitively
    #[serde(default)]
    pub status: Option<String>,

    /// Technology field label, compared exactly
    #[serde(default)]
    pub field: Option<String>,

    /// Asset type, compared case-insensitively
    #[serde(default)]
    pub asset_type: Option<String>,
}

impl AssetSelection {
    /// Selection that keeps every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a selection from raw selector strings.
    pub fn from_selectors(status: &str, field: &str, asset_type: &str) -> Result<Self, QueryError> {
        Ok(Self {
            status: parse_selector(status, "status")?,
            field: parse_selector(field, "field")?,
            asset_type: parse_selector(asset_type, "asset type")?,
        })
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.status.is_none() && self.field.is_none() && self.asset_type.is_none()
    }

    /// Whether a record passes every active constraint.
    pub fn matches(&self, record: &NormalizedAssetRecord) -> bool {
        let status_ok = self.status.as_deref().map_or(true, |wanted| {
            record
                .legal_status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(wanted))
        });
        let field_ok = self
            .field
            .as_deref()
            .map_or(true, |wanted| record.patent_field == wanted);
        let type_ok = self
            .asset_type
            .as_deref()
            .map_or(true, |wanted| record.asset_type.eq_ignore_ascii_case(wanted));

        status_ok && field_ok && type_ok
    }

    /// Records passing the selection, in input order.
    pub fn apply<'a>(&self, records: &'a [NormalizedAssetRecord]) -> Vec<&'a NormalizedAssetRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn parse_selector(value: &str, name: &'static str) -> Result<Option<String>, QueryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(QueryError::EmptySelector(name));
    }
    if value.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    Ok(Some(value.to_string()))
}

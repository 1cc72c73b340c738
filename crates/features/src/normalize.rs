use chrono::{DateTime, NaiveDate, NaiveDateTime};
use iplandscape_model::{
    asset_type, parse_collection, NormalizedAssetRecord, RawAssetRecord, RawDate, UNKNOWN,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::field::FieldTaxonomy;
use crate::region::RegionTable;

/// Completes raw records into their canonical shape.
///
/// Holds the immutable classification tables; normalizing is a pure
/// function of the record and these tables.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    pub taxonomy: FieldTaxonomy,
    pub regions: RegionTable,
}

impl Normalizer {
    pub fn new(taxonomy: FieldTaxonomy, regions: RegionTable) -> Self {
        Self { taxonomy, regions }
    }

    /// Normalize one record. Pre-populated field and region win over the
    /// derived ones.
    pub fn normalize(&self, raw: &RawAssetRecord) -> NormalizedAssetRecord {
        let title = present(&raw.title);
        let abstract_text = present(&raw.abstract_text);
        let country = present(&raw.country);

        let patent_field = present(&raw.patent_field)
            .unwrap_or_else(|| self.taxonomy.classify(title, abstract_text))
            .to_string();
        let region = present(&raw.region)
            .unwrap_or_else(|| self.regions.map(country))
            .to_string();

        NormalizedAssetRecord {
            application_number: raw.application_number.clone(),
            title: raw.title.clone(),
            abstract_text: raw.abstract_text.clone(),
            asset_type: present(&raw.asset_type)
                .unwrap_or(asset_type::PATENT)
                .to_string(),
            legal_status: present(&raw.legal_status).map(str::to_string),
            filing_date: raw.filing_date.as_ref().and_then(parse_filing_date),
            updated_on: present(&raw.updated_on).and_then(parse_timestamp),
            country: country.unwrap_or(UNKNOWN).to_string(),
            priority: present(&raw.priority).map(str::to_string),
            patent_field,
            region,
        }
    }

    /// Normalize a collection, preserving order.
    pub fn normalize_all(&self, records: &[RawAssetRecord]) -> Vec<NormalizedAssetRecord> {
        records.iter().map(|r| self.normalize(r)).collect()
    }

    /// Normalize an untyped JSON payload.
    ///
    /// Non-array payloads are treated as empty and unusable entries are
    /// skipped; neither is an error.
    pub fn normalize_value(&self, value: &Value) -> Vec<NormalizedAssetRecord> {
        let Some(items) = value.as_array() else {
            warn!("Asset payload is not an array, treating as empty");
            return Vec::new();
        };

        let records = parse_collection(value);
        let skipped = items.len() - records.len();
        if skipped > 0 {
            debug!(skipped, kept = records.len(), "Skipped unusable asset entries");
        }

        self.normalize_all(&records)
    }
}

/// Treat empty strings like absent values.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Resolve a boundary filing date to a calendar date.
pub fn parse_filing_date(raw: &RawDate) -> Option<NaiveDate> {
    match raw {
        RawDate::Calendar(date) => Some(*date),
        RawDate::Text(text) => parse_calendar_date(text),
    }
}

/// Strict `YYYY-MM-DD`. Padded or unpadded variants, date-times and invalid
/// calendar dates give `None`.
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    RawDate::parse_calendar(text)
}

/// Parse an `updatedOn` value: RFC 3339, a naive ISO date-time, or a bare
/// date (taken as midnight).
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| parse_calendar_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_derives_field_and_region() {
        let raw = RawAssetRecord::new("Neural network classifier")
            .with_country("US")
            .with_filing_date("2024-03-10");
        let record = Normalizer::default().normalize(&raw);

        assert_eq!(record.patent_field, "AI/ML");
        assert_eq!(record.region, "North America");
        assert_eq!(record.country, "US");
        assert_eq!(record.filing_date, Some(date(2024, 3, 10)));
    }

    #[test]
    fn test_defaults() {
        let record = Normalizer::default().normalize(&RawAssetRecord::default());

        assert_eq!(record.asset_type, "PATENT");
        assert_eq!(record.country, "Unknown");
        assert_eq!(record.region, "Unknown");
        assert_eq!(record.patent_field, "Other");
        assert_eq!(record.filing_date, None);
        assert_eq!(record.legal_status, None);
        assert_eq!(record.priority, None);
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let raw = RawAssetRecord {
            asset_type: Some(String::new()),
            country: Some(String::new()),
            legal_status: Some(String::new()),
            patent_field: Some(String::new()),
            filing_date: Some(RawDate::Text(String::new())),
            ..RawAssetRecord::new("Solar inverter")
        };
        let record = Normalizer::default().normalize(&raw);

        assert_eq!(record.asset_type, "PATENT");
        assert_eq!(record.country, "Unknown");
        assert_eq!(record.legal_status, None);
        assert_eq!(record.patent_field, "Energy");
        assert_eq!(record.filing_date, None);
    }

    #[test]
    fn test_overrides_win() {
        let raw = RawAssetRecord {
            patent_field: Some("Robotics".into()),
            region: Some("Nordics".into()),
            ..RawAssetRecord::new("Neural network classifier").with_country("SE")
        };
        let record = Normalizer::default().normalize(&raw);

        assert_eq!(record.patent_field, "Robotics");
        assert_eq!(record.region, "Nordics");
    }

    #[test]
    fn test_filing_date_parsing() {
        assert_eq!(parse_filing_date(&RawDate::Calendar(date(2020, 2, 29))), Some(date(2020, 2, 29)));
        assert_eq!(parse_filing_date(&"2021-12-01".into()), Some(date(2021, 12, 1)));
        assert_eq!(parse_filing_date(&"not-a-date".into()), None);
        assert_eq!(parse_filing_date(&"2021-02-29".into()), None);
        assert_eq!(parse_filing_date(&"2021-12-01T10:00:00".into()), None);
        assert_eq!(parse_filing_date(&" 2021-12-01".into()), None);
        assert_eq!(parse_filing_date(&"2021-12-1".into()), None);
    }

    #[test]
    fn test_timestamp_parsing() {
        let midnight = date(2024, 5, 1).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01"), Some(midnight));
        assert_eq!(
            parse_timestamp("2024-05-01T08:30:00"),
            date(2024, 5, 1).and_hms_opt(8, 30, 0)
        );
        assert_eq!(
            parse_timestamp("2024-05-01T08:30:00.250"),
            date(2024, 5, 1).and_hms_milli_opt(8, 30, 0, 250)
        );
        assert_eq!(
            parse_timestamp("2024-05-01T08:30:00+02:00"),
            date(2024, 5, 1).and_hms_opt(8, 30, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_normalize_value_skips_junk() {
        let normalizer = Normalizer::default();
        let records = normalizer.normalize_value(&json!([
            {"title": "Blockchain ledger", "country": "DE"},
            null,
            7,
            {"title": "Qubit array", "filingDate": "bad"}
        ]));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].patent_field, "Blockchain");
        assert_eq!(records[0].region, "Europe");
        assert_eq!(records[1].patent_field, "Quantum Computing");
        assert_eq!(records[1].filing_date, None);

        assert!(normalizer.normalize_value(&json!({"oops": true})).is_empty());
        assert!(normalizer.normalize_value(&json!([])).is_empty());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let normalizer = Normalizer::default();
        let raw = RawAssetRecord::new("Smart contract escrow").with_country("br");
        assert_eq!(normalizer.normalize(&raw), normalizer.normalize(&raw));
        assert_eq!(normalizer.normalize(&raw).region, "Latin America");
    }
}

//! Feature derivation for IP asset analytics.
//!
//! Provides pure functions for the per-record features used by aggregation:
//! - Technology field classification (keyword matching)
//! - Country to region mapping
//! - Period keys at a chosen granularity
//! - Record normalization, which ties the three together

mod field;
mod normalize;
mod period;
mod region;

pub use field::{classify_field, FieldRule, FieldTaxonomy};
pub use normalize::{parse_calendar_date, parse_filing_date, parse_timestamp, Normalizer};
pub use period::{period_key, period_key_for_text, week_of_year};
pub use region::{map_region, RegionTable, REGIONS};

//! Multi-dimensional aggregation over IP asset records.
//!
//! Takes normalized records plus the active selection and produces the
//! `LandscapeReport` consumed by the charting layer. Every table is an
//! independent single pass over its input.
//!
//! Filing Trend, Field Distribution, Periodic Activity and the status
//! tables respect the selection. Type, Priority, Regional and Country
//! distributions always describe the whole portfolio.

use iplandscape_features::{period_key, Normalizer};
use iplandscape_model::{
    asset_type, CountRow, Granularity, LandscapeReport, LifecycleEntry, LifecycleSummary,
    NormalizedAssetRecord, RawAssetRecord, StatusTrendPoint, TrackedStatus, TrendPoint, UNKNOWN,
};
use iplandscape_query::AssetSelection;
use iplandscape_radar::{current_year, score};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use tracing::debug;

const SECONDS_PER_DAY: i64 = 86_400;

/// Configuration for an aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateConfig {
    /// Bucket size for the time-keyed tables
    pub granularity: Granularity,
    /// Length of the country table
    pub top_countries: usize,
    /// Year counted as "recent"; `None` reads the local clock
    pub current_year: Option<i32>,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Yearly,
            top_countries: 10,
            current_year: None,
        }
    }
}

impl AggregateConfig {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            ..Default::default()
        }
    }

    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    fn resolved_year(&self) -> i32 {
        self.current_year.unwrap_or_else(current_year)
    }
}

/// Normalize raw records and aggregate them.
pub fn analyze(
    records: &[RawAssetRecord],
    normalizer: &Normalizer,
    selection: &AssetSelection,
    config: &AggregateConfig,
) -> LandscapeReport {
    let normalized = normalizer.normalize_all(records);
    aggregate(&normalized, selection, config)
}

/// Compute every table of the report.
pub fn aggregate(
    records: &[NormalizedAssetRecord],
    selection: &AssetSelection,
    config: &AggregateConfig,
) -> LandscapeReport {
    let filtered = selection.apply(records);
    let granularity = config.granularity;

    debug!(
        total = records.len(),
        filtered = filtered.len(),
        granularity = %granularity,
        "Aggregating asset landscape"
    );

    LandscapeReport {
        granularity,
        filing_trend: filing_trend(filtered.iter().copied(), granularity),
        type_distribution: type_distribution(records),
        field_distribution: field_distribution(filtered.iter().copied()),
        priority_distribution: priority_distribution(records),
        regional_distribution: regional_distribution(records),
        country_distribution: country_distribution(records, config.top_countries),
        periodic_activity: periodic_activity(filtered.iter().copied(), granularity),
        status_distribution: status_distribution(filtered.iter().copied()),
        status_trend: status_trend(filtered.iter().copied(), granularity),
        lifecycle: lifecycle(filtered.iter().copied()),
        radar: score(&filtered, records, config.resolved_year()),
    }
}

/// Insertion-ordered counter.
#[derive(Debug, Default)]
struct Tally {
    rows: Vec<CountRow>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.rows[i].count += 1,
            None => {
                self.index.insert(key.to_string(), self.rows.len());
                self.rows.push(CountRow::new(key, 1));
            }
        }
    }

    fn into_rows(self) -> Vec<CountRow> {
        self.rows
    }
}

/// Count records by key in first-seen order. Records whose key is `None`
/// are left out.
fn count_by<'a, I, F, K>(records: I, mut key: F) -> Vec<CountRow>
where
    I: IntoIterator<Item = &'a NormalizedAssetRecord>,
    F: FnMut(&'a NormalizedAssetRecord) -> Option<K>,
    K: AsRef<str>,
{
    records
        .into_iter()
        .filter_map(|r| key(r))
        .fold(Tally::default(), |mut tally, k| {
            tally.add(k.as_ref());
            tally
        })
        .into_rows()
}

/// Stable sort, so equal counts keep first-seen order.
fn sort_descending(mut rows: Vec<CountRow>) -> Vec<CountRow> {
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Dated records only; undated ones have no place on a time axis.
fn dated_period(record: &NormalizedAssetRecord, granularity: Granularity) -> Option<String> {
    record
        .filing_date
        .map(|date| period_key(Some(date), granularity))
}

/// Filings per period split by asset type, ascending by period.
pub fn filing_trend<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
    granularity: Granularity,
) -> Vec<TrendPoint> {
    let mut by_period: BTreeMap<String, TrendPoint> = BTreeMap::new();

    for record in records {
        let Some(period) = dated_period(record, granularity) else {
            continue;
        };
        let point = by_period.entry(period.clone()).or_insert_with(|| TrendPoint {
            period,
            ..Default::default()
        });

        point.filings += 1;
        match record.asset_type.as_str() {
            asset_type::PATENT => point.patents += 1,
            asset_type::TRADEMARK => point.trademarks += 1,
            _ => {}
        }
    }

    by_period.into_values().collect()
}

pub fn type_distribution<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
) -> Vec<CountRow> {
    count_by(records, |r| Some(r.asset_type.as_str()))
}

/// Descending by count.
pub fn field_distribution<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
) -> Vec<CountRow> {
    sort_descending(count_by(records, |r| Some(r.patent_field.as_str())))
}

/// Missing priority counts as "Unknown"; unrecognized values keep their
/// own bucket.
pub fn priority_distribution<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
) -> Vec<CountRow> {
    count_by(records, |r| Some(r.priority.as_deref().unwrap_or(UNKNOWN)))
}

/// Descending by count.
pub fn regional_distribution<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
) -> Vec<CountRow> {
    sort_descending(count_by(records, |r| Some(r.region.as_str())))
}

/// Raw country values, descending by count, cut to `top`.
pub fn country_distribution<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
    top: usize,
) -> Vec<CountRow> {
    let mut rows = sort_descending(count_by(records, |r| Some(r.country.as_str())));
    rows.truncate(top);
    rows
}

/// Dated records per period, ascending by period.
pub fn periodic_activity<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
    granularity: Granularity,
) -> Vec<CountRow> {
    let mut by_period: BTreeMap<String, usize> = BTreeMap::new();
    for period in records
        .into_iter()
        .filter_map(|r| dated_period(r, granularity))
    {
        *by_period.entry(period).or_default() += 1;
    }

    by_period
        .into_iter()
        .map(|(period, count)| CountRow::new(period, count))
        .collect()
}

/// Missing status counts as "Unknown".
pub fn status_distribution<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
) -> Vec<CountRow> {
    count_by(records, |r| Some(r.legal_status.as_deref().unwrap_or(UNKNOWN)))
}

/// Tracked-status counts per period, ascending by period. Dated records
/// with an untracked status still open their period with zero counts.
pub fn status_trend<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
    granularity: Granularity,
) -> Vec<StatusTrendPoint> {
    let mut by_period: BTreeMap<String, StatusTrendPoint> = BTreeMap::new();

    for record in records {
        let Some(period) = dated_period(record, granularity) else {
            continue;
        };
        let point = by_period
            .entry(period.clone())
            .or_insert_with(|| StatusTrendPoint {
                period,
                ..Default::default()
            });

        if let Some(status) = record.legal_status.as_deref().and_then(TrackedStatus::from_label) {
            *point.count_mut(status) += 1;
        }
    }

    by_period.into_values().collect()
}

/// Processing time for records carrying both a filing date and an update
/// timestamp. Partial days round up.
pub fn lifecycle<'a>(
    records: impl IntoIterator<Item = &'a NormalizedAssetRecord>,
) -> LifecycleSummary {
    let entries: Vec<LifecycleEntry> = records
        .into_iter()
        .filter_map(|record| {
            let filed = record.filing_date?.and_hms_opt(0, 0, 0)?;
            let updated = record.updated_on?;
            let seconds = (updated - filed).num_seconds();
            let days = seconds.div_euclid(SECONDS_PER_DAY)
                + i64::from(seconds.rem_euclid(SECONDS_PER_DAY) != 0);

            Some(LifecycleEntry {
                application_number: record.application_number.clone(),
                title: record.title.clone(),
                processing_days: days,
            })
        })
        .collect();

    let average_days = if entries.is_empty() {
        0.0
    } else {
        entries.iter().map(|e| e.processing_days as f64).sum::<f64>() / entries.len() as f64
    };

    LifecycleSummary {
        entries,
        average_days,
    }
}

/// Keeps the last report and recomputes only when an input changes.
///
/// Keyed on the raw records, the selection and the configuration. The
/// fingerprint only short-circuits the comparison; a hit also requires the
/// stored inputs to be equal. The normalizer tables are not part of the
/// key; call `invalidate` after switching to a different normalizer.
#[derive(Debug, Default)]
pub struct AggregateMemo {
    entry: Option<MemoEntry>,
    hits: usize,
    misses: usize,
}

#[derive(Debug)]
struct MemoEntry {
    fingerprint: u64,
    key: MemoKey,
    report: LandscapeReport,
}

/// Every input that shapes a report.
#[derive(Debug, PartialEq, Eq)]
struct MemoKey {
    records: Vec<RawAssetRecord>,
    selection: AssetSelection,
    granularity: Granularity,
    top_countries: usize,
    year: i32,
}

impl MemoKey {
    fn matches(
        &self,
        records: &[RawAssetRecord],
        selection: &AssetSelection,
        config: &AggregateConfig,
        year: i32,
    ) -> bool {
        self.year == year
            && self.granularity == config.granularity
            && self.top_countries == config.top_countries
            && self.selection == *selection
            && self.records == records
    }
}

impl AggregateMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        records: &[RawAssetRecord],
        normalizer: &Normalizer,
        selection: &AssetSelection,
        config: &AggregateConfig,
    ) -> &LandscapeReport {
        let year = config.resolved_year();
        let fingerprint = fingerprint(records, selection, config, year);
        self.lookup(fingerprint, records, normalizer, selection, config, year)
    }

    fn lookup(
        &mut self,
        fingerprint: u64,
        records: &[RawAssetRecord],
        normalizer: &Normalizer,
        selection: &AssetSelection,
        config: &AggregateConfig,
        year: i32,
    ) -> &LandscapeReport {
        let entry = match self.entry.take() {
            Some(entry)
                if entry.fingerprint == fingerprint
                    && entry.key.matches(records, selection, config, year) =>
            {
                self.hits += 1;
                debug!(fingerprint, "Landscape memo hit");
                entry
            }
            _ => {
                self.misses += 1;
                debug!(fingerprint, "Landscape memo miss");
                let config = AggregateConfig {
                    current_year: Some(year),
                    ..config.clone()
                };
                MemoEntry {
                    fingerprint,
                    key: MemoKey {
                        records: records.to_vec(),
                        selection: selection.clone(),
                        granularity: config.granularity,
                        top_countries: config.top_countries,
                        year,
                    },
                    report: analyze(records, normalizer, selection, &config),
                }
            }
        };

        &self.entry.insert(entry).report
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

fn fingerprint(
    records: &[RawAssetRecord],
    selection: &AssetSelection,
    config: &AggregateConfig,
    year: i32,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    records.hash(&mut hasher);
    selection.hash(&mut hasher);
    config.granularity.hash(&mut hasher);
    config.top_countries.hash(&mut hasher);
    year.hash(&mut hasher);
    hasher.finish()
}

//! Portfolio radar scoring.
//!
//! Computes the five 0-100 radar metrics shown on the landscape view and
//! turns them, along with the status KPI counts, into short human-readable
//! summaries for the CLI and other text consumers.

use chrono::{Datelike, Local};
use iplandscape_model::{
    asset_type, CountRow, NormalizedAssetRecord, RadarDimension, RadarMetric, TrackedStatus,
    HIGH_PRIORITY,
};
use serde::{Deserialize, Serialize};

/// Integer percentage of `part` in `whole`, rounded half up.
///
/// A zero denominator gives 0.
pub fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u128;
    let whole = whole as u128;
    ((part * 200 + whole) / (whole * 2)) as u8
}

/// Calendar year on the local clock.
pub fn current_year() -> i32 {
    Local::now().year()
}

/// Score the radar metrics.
///
/// Everything is measured on `filtered` except High Priority, which is a
/// portfolio-wide signal measured on `full`.
pub fn score(
    filtered: &[&NormalizedAssetRecord],
    full: &[NormalizedAssetRecord],
    current_year: i32,
) -> Vec<RadarMetric> {
    let total = filtered.len();
    let count = |pred: &dyn Fn(&NormalizedAssetRecord) -> bool| {
        filtered.iter().filter(|&&r| pred(r)).count()
    };

    let granted = count(&|r| r.legal_status.as_deref() == Some(TrackedStatus::Granted.as_str()));
    let patents = count(&|r| r.asset_type == asset_type::PATENT);
    let recent = count(&|r| r.filing_date.is_some_and(|d| d.year() == current_year));
    let high_priority = full
        .iter()
        .filter(|r| r.priority.as_deref() == Some(HIGH_PRIORITY))
        .count();

    vec![
        RadarMetric {
            metric: RadarDimension::FilingVolume,
            value: if total > 0 { 100 } else { 0 },
        },
        RadarMetric {
            metric: RadarDimension::GrantedRate,
            value: percentage(granted, total),
        },
        RadarMetric {
            metric: RadarDimension::PatentRatio,
            value: percentage(patents, total),
        },
        RadarMetric {
            metric: RadarDimension::HighPriority,
            value: percentage(high_priority, full.len()),
        },
        RadarMetric {
            metric: RadarDimension::RecentActivity,
            value: percentage(recent, total),
        },
    ]
}

/// Value of one dimension, 0 if absent.
pub fn metric_value(metrics: &[RadarMetric], dimension: RadarDimension) -> u8 {
    metrics
        .iter()
        .find(|m| m.metric == dimension)
        .map_or(0, |m| m.value)
}

/// One-line summary of a radar.
pub fn summarize_radar(metrics: &[RadarMetric]) -> String {
    if metric_value(metrics, RadarDimension::FilingVolume) == 0 {
        return "No filings match the current selection.".to_string();
    }

    let granted = metric_value(metrics, RadarDimension::GrantedRate);
    let level = if granted >= 60 {
        "MOSTLY GRANTED"
    } else if granted >= 30 {
        "PARTLY GRANTED"
    } else {
        "MOSTLY PENDING"
    };

    let parts: Vec<_> = metrics
        .iter()
        .map(|m| format!("{} {}%", m.metric.label(), m.value))
        .collect();
    format!("{}: {}", level, parts.join(", "))
}

/// Headline status counts for the KPI strip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusKpis {
    pub total: usize,
    pub filed: usize,
    pub under_examination: usize,
    pub granted: usize,
}

/// Read the KPI counts out of a status distribution. Status keys are
/// compared case-insensitively.
pub fn status_kpis(distribution: &[CountRow]) -> StatusKpis {
    let count_of = |status: TrackedStatus| {
        distribution
            .iter()
            .filter(|row| row.key.eq_ignore_ascii_case(status.as_str()))
            .map(|row| row.count)
            .sum::<usize>()
    };

    StatusKpis {
        total: distribution.iter().map(|row| row.count).sum(),
        filed: count_of(TrackedStatus::Filed),
        under_examination: count_of(TrackedStatus::UnderExamination),
        granted: count_of(TrackedStatus::Granted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iplandscape_features::Normalizer;
    use iplandscape_model::RawAssetRecord;

    fn normalize(records: Vec<RawAssetRecord>) -> Vec<NormalizedAssetRecord> {
        Normalizer::default().normalize_all(&records)
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5 rounds up
        assert_eq!(percentage(3, 3), 100);
    }

    #[test]
    fn test_empty_radar_is_all_zero() {
        let metrics = score(&[], &[], 2024);
        assert_eq!(metrics.len(), 5);
        assert!(metrics.iter().all(|m| m.value == 0));
        assert_eq!(summarize_radar(&metrics), "No filings match the current selection.");
    }

    #[test]
    fn test_scores() {
        let full = normalize(vec![
            RawAssetRecord::new("Neural network classifier")
                .with_status("GRANTED")
                .with_filing_date("2024-03-10")
                .with_asset_type("PATENT")
                .with_priority("High"),
            RawAssetRecord::new("Blockchain ledger")
                .with_status("FILED")
                .with_asset_type("PATENT"),
            RawAssetRecord::new("Brand mark")
                .with_status("FILED")
                .with_asset_type("TRADEMARK")
                .with_filing_date("2023-01-05"),
            RawAssetRecord::new("Solar film").with_priority("high"),
        ]);
        let filtered: Vec<_> = full.iter().collect();
        let metrics = score(&filtered, &full, 2024);

        assert_eq!(metric_value(&metrics, RadarDimension::FilingVolume), 100);
        assert_eq!(metric_value(&metrics, RadarDimension::GrantedRate), 25);
        // Missing asset type defaults to PATENT
        assert_eq!(metric_value(&metrics, RadarDimension::PatentRatio), 75);
        // Priority must match "High" exactly
        assert_eq!(metric_value(&metrics, RadarDimension::HighPriority), 25);
        assert_eq!(metric_value(&metrics, RadarDimension::RecentActivity), 25);
    }

    #[test]
    fn test_high_priority_ignores_filter() {
        let full = normalize(vec![
            RawAssetRecord::new("a").with_priority("High").with_status("GRANTED"),
            RawAssetRecord::new("b").with_priority("Low").with_status("FILED"),
        ]);
        let filtered: Vec<_> = full.iter().filter(|r| r.priority.as_deref() == Some("Low")).collect();
        let metrics = score(&filtered, &full, 2024);

        assert_eq!(metric_value(&metrics, RadarDimension::GrantedRate), 0);
        assert_eq!(metric_value(&metrics, RadarDimension::HighPriority), 50);
    }

    #[test]
    fn test_summary_levels() {
        let full = normalize(vec![
            RawAssetRecord::new("a").with_status("GRANTED"),
            RawAssetRecord::new("b").with_status("GRANTED"),
            RawAssetRecord::new("c").with_status("FILED"),
        ]);
        let filtered: Vec<_> = full.iter().collect();
        let summary = summarize_radar(&score(&filtered, &full, 2024));

        assert!(summary.starts_with("MOSTLY GRANTED"));
        assert!(summary.contains("Granted Rate 67%"));
    }

    #[test]
    fn test_status_kpis() {
        let distribution = vec![
            CountRow::new("GRANTED", 3),
            CountRow::new("filed", 2),
            CountRow::new("UNDER_EXAMINATION", 1),
            CountRow::new("Unknown", 4),
        ];
        assert_eq!(
            status_kpis(&distribution),
            StatusKpis {
                total: 10,
                filed: 2,
                under_examination: 1,
                granted: 3,
            }
        );
        assert_eq!(status_kpis(&[]), StatusKpis::default());
    }
}

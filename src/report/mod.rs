// src/report/mod.rs
use anyhow::{Context, Result};
use csv::Writer;
use std::path::Path;
use tracing::info;

use crate::aggregate::{
    grouped_means, GroupOrder, GroupedAverage, KeyField, MetricField, ReportSpec,
};
use crate::normalize::LongRecord;

/// Rows with at most this many total hours are excluded from the filtered
/// city report.
pub const FILTER_HOURS_THRESHOLD: f64 = 30.0;

fn worked_over_threshold(record: &LongRecord) -> bool {
    record.total_hours > FILTER_HOURS_THRESHOLD
}

const CITY_METRICS: &[MetricField] = &[
    MetricField::TotalEarnings,
    MetricField::OrganicEarnings,
    MetricField::Promos,
    MetricField::Tip,
    MetricField::TotalMiles,
    MetricField::MilesOpenTrimmed,
    MetricField::MilesActive,
    MetricField::TotalHours,
    MetricField::HoursOpenTrimmed,
    MetricField::HoursActive,
];

const TOTALS_METRICS: &[MetricField] = &[
    MetricField::TotalEarnings,
    MetricField::TotalMiles,
    MetricField::TotalHours,
];

/// The four shipped reports. Each is pure configuration; `grouped_means`
/// does the work for all of them.
pub const REPORTS: &[ReportSpec] = &[
    ReportSpec {
        name: "averages_by_city",
        title: "Averages by City",
        keys: &[KeyField::CityName],
        metrics: CITY_METRICS,
        filter: None,
        order: GroupOrder::FirstSeen,
    },
    ReportSpec {
        name: "averages_by_city_and_engine",
        title: "Averages by City and Engine",
        keys: &[KeyField::CityName, KeyField::Engine],
        metrics: TOTALS_METRICS,
        filter: None,
        order: GroupOrder::KeyAscending,
    },
    ReportSpec {
        name: "averages_by_city_and_ownership",
        title: "Averages by City and Ownership",
        keys: &[KeyField::CityName, KeyField::Ownership],
        metrics: TOTALS_METRICS,
        filter: None,
        order: GroupOrder::KeyAscending,
    },
    ReportSpec {
        name: "averages_by_city_over_30_hours",
        title: "Averages by City (Only Total Hours > 30)",
        keys: &[KeyField::CityName],
        metrics: TOTALS_METRICS,
        filter: Some(worked_over_threshold),
        order: GroupOrder::KeyAscending,
    },
];

const PREVIEW_ROWS: usize = 5;

/// Compute every shipped report over `records` and write each one to
/// `<out_dir>/<name>.csv`, logging a short head of the table as it goes.
#[tracing::instrument(level = "info", skip(records, out_dir), fields(out_dir = %out_dir.display()))]
pub fn write_all_reports(records: &[LongRecord], out_dir: &Path) -> Result<()> {
    for spec in REPORTS {
        let rows = grouped_means(records, spec);
        let path = out_dir.join(format!("{}.csv", spec.name));

        write_report(&rows, spec, &path)
            .with_context(|| format!("writing report `{}`", spec.name))?;
        preview(spec, &rows);
        info!(
            report = spec.name,
            groups = rows.len(),
            path = %path.display(),
            "report written"
        );
    }
    Ok(())
}

/// Write one report table as CSV: a header row of the key columns followed
/// by the metric columns, then one row per group. No row-index column.
pub fn write_report(rows: &[GroupedAverage], spec: &ReportSpec, path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("creating report file {}", path.display()))?;

    let header: Vec<&str> = spec
        .keys
        .iter()
        .map(KeyField::column_name)
        .chain(spec.metrics.iter().map(MetricField::column_name))
        .collect();
    writer.write_record(&header).context("writing header row")?;

    for row in rows {
        let record: Vec<String> = row
            .key
            .iter()
            .cloned()
            .chain(row.means.iter().map(|mean| mean.to_string()))
            .collect();
        writer.write_record(&record).context("writing group row")?;
    }

    writer.flush().context("flushing report writer")?;
    Ok(())
}

/// Log the first few rows of a finished report for eyeballing.
fn preview(spec: &ReportSpec, rows: &[GroupedAverage]) {
    info!("=== {} ===", spec.title);
    for row in rows.iter().take(PREVIEW_ROWS) {
        let means = row
            .means
            .iter()
            .map(|mean| format!("{:.2}", mean))
            .collect::<Vec<_>>()
            .join("  ");
        info!("{}  {}", row.key.join("  "), means);
    }
}

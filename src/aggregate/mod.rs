// src/aggregate/mod.rs
use std::collections::{hash_map::Entry, HashMap};

use tracing::debug;

use crate::normalize::LongRecord;

/// A grouping column of the normalized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
    CityName,
    Engine,
    Ownership,
}

impl KeyField {
    pub fn column_name(&self) -> &'static str {
        match self {
            KeyField::CityName => "city_name",
            KeyField::Engine => "engine",
            KeyField::Ownership => "ownership",
        }
    }

    /// Key value for `record`, or `None` when the field is missing. A row
    /// with a missing key field belongs to no group of that report.
    fn value<'a>(&self, record: &'a LongRecord) -> Option<&'a str> {
        match self {
            KeyField::CityName => Some(&record.city_name),
            KeyField::Engine => record.engine.as_deref(),
            KeyField::Ownership => record.ownership.as_deref(),
        }
    }
}

/// A numeric column of the normalized table that reports can average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    TotalEarnings,
    OrganicEarnings,
    Promos,
    Tip,
    TotalMiles,
    MilesOpenTrimmed,
    MilesActive,
    TotalHours,
    HoursOpenTrimmed,
    HoursActive,
}

impl MetricField {
    pub fn column_name(&self) -> &'static str {
        match self {
            MetricField::TotalEarnings => "total_earnings",
            MetricField::OrganicEarnings => "organic_earnings",
            MetricField::Promos => "promos",
            MetricField::Tip => "tip",
            MetricField::TotalMiles => "total_miles",
            MetricField::MilesOpenTrimmed => "miles_open_trimmed",
            MetricField::MilesActive => "miles_active",
            MetricField::TotalHours => "total_hours",
            MetricField::HoursOpenTrimmed => "hours_open_trimmed",
            MetricField::HoursActive => "hours_active",
        }
    }

    fn value(&self, record: &LongRecord) -> f64 {
        match self {
            MetricField::TotalEarnings => record.total_earnings,
            MetricField::OrganicEarnings => record.organic_earnings,
            MetricField::Promos => record.promos,
            MetricField::Tip => record.tip,
            MetricField::TotalMiles => record.total_miles,
            MetricField::MilesOpenTrimmed => record.miles_open_trimmed,
            MetricField::MilesActive => record.miles_active,
            MetricField::TotalHours => record.total_hours,
            MetricField::HoursOpenTrimmed => record.hours_open_trimmed,
            MetricField::HoursActive => record.hours_active,
        }
    }
}

/// How finished groups are ordered in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    /// Groups appear in the order their key was first seen in the input.
    FirstSeen,
    /// Groups sorted ascending lexicographically on the key tuple.
    KeyAscending,
}

/// Declarative description of one grouped-mean report. The shipped reports
/// are constants of this type; the grouping routine itself is generic.
pub struct ReportSpec {
    /// Output file stem, e.g. "averages_by_city".
    pub name: &'static str,
    /// Human title for the logged preview.
    pub title: &'static str,
    pub keys: &'static [KeyField],
    pub metrics: &'static [MetricField],
    pub filter: Option<fn(&LongRecord) -> bool>,
    pub order: GroupOrder,
}

/// Mean metric values for one grouping key. `means` is aligned with the
/// spec's `metrics` slice.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedAverage {
    pub key: Vec<String>,
    pub means: Vec<f64>,
}

struct Accumulator {
    sums: Vec<f64>,
    count: u64,
}

impl Accumulator {
    fn new(metric_count: usize) -> Self {
        Accumulator {
            sums: vec![0.0; metric_count],
            count: 0,
        }
    }

    fn add(&mut self, record: &LongRecord, metrics: &[MetricField]) {
        for (sum, metric) in self.sums.iter_mut().zip(metrics) {
            *sum += metric.value(record);
        }
        self.count += 1;
    }
}

/// Group `records` by `spec.keys` and take the arithmetic mean of each of
/// `spec.metrics` per group. Rows rejected by the filter, or missing any key
/// field, contribute nothing; a key that gathers no rows never appears.
#[tracing::instrument(level = "debug", skip(records, spec), fields(report = spec.name))]
pub fn grouped_means(records: &[LongRecord], spec: &ReportSpec) -> Vec<GroupedAverage> {
    let mut key_order: Vec<Vec<String>> = Vec::new();
    let mut groups: HashMap<Vec<String>, Accumulator> = HashMap::new();

    for record in records {
        if let Some(keep) = spec.filter {
            if !keep(record) {
                continue;
            }
        }
        let Some(key) = group_key(record, spec.keys) else {
            continue;
        };

        match groups.entry(key) {
            Entry::Occupied(mut entry) => entry.get_mut().add(record, spec.metrics),
            Entry::Vacant(entry) => {
                key_order.push(entry.key().clone());
                entry
                    .insert(Accumulator::new(spec.metrics.len()))
                    .add(record, spec.metrics);
            }
        }
    }

    if spec.order == GroupOrder::KeyAscending {
        key_order.sort();
    }

    debug!(groups = key_order.len(), "computed grouped means");

    key_order
        .into_iter()
        .map(|key| {
            let accum = &groups[&key];
            let means = accum
                .sums
                .iter()
                .map(|sum| sum / accum.count as f64)
                .collect();
            GroupedAverage { key, means }
        })
        .collect()
}

/// The key tuple for `record`, or `None` if any key field is missing.
fn group_key(record: &LongRecord, keys: &[KeyField]) -> Option<Vec<String>> {
    keys.iter()
        .map(|key| key.value(record).map(str::to_string))
        .collect()
}

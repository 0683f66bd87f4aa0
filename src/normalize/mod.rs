// src/normalize/mod.rs
use serde::Serialize;
use tracing::debug;

use crate::ingest::{VehicleSlot, WideRecord};

mod descriptor;
pub use descriptor::{VehicleDescriptor, DESCRIPTOR_COMPONENTS};

/// One driver-week-vehicle observation: the wide row's scalar fields, the
/// chosen slot's descriptor and mileage share, the parsed vehicle
/// attributes, and the derived totals.
///
/// `total_earnings`, `total_miles` and `total_hours` are always the sums of
/// their components; `from_slot` is the only place they are computed.
#[derive(Debug, Clone, Serialize)]
pub struct LongRecord {
    pub hashed_driver_uuid: String,
    pub weekstr: String,
    pub city_id: i64,
    pub city_name: String,
    pub organic_earnings: f64,
    pub promos: f64,
    pub tip: f64,
    pub hours_open_trimmed: f64,
    pub hours_active: f64,
    pub miles_open_trimmed: f64,
    pub miles_active: f64,
    pub vehicle_mmy: String,
    pub vehicle_mileage_share: Option<f64>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub engine: Option<String>,
    pub ownership: Option<String>,
    pub total_earnings: f64,
    pub total_miles: f64,
    pub total_hours: f64,
}

impl LongRecord {
    /// Build the normalized row for one present vehicle slot. The raw
    /// descriptor is trimmed before it is stored and parsed.
    fn from_slot(wide: &WideRecord, raw_mmy: &str, mileage_share: Option<f64>) -> Self {
        let vehicle_mmy = raw_mmy.trim().to_string();
        let parsed = VehicleDescriptor::parse(&vehicle_mmy);

        LongRecord {
            hashed_driver_uuid: wide.hashed_driver_uuid.clone(),
            weekstr: wide.weekstr.clone(),
            city_id: wide.city_id,
            city_name: wide.city_name.clone(),
            organic_earnings: wide.organic_earnings,
            promos: wide.promos,
            tip: wide.tip,
            hours_open_trimmed: wide.hours_open_trimmed,
            hours_active: wide.hours_active,
            miles_open_trimmed: wide.miles_open_trimmed,
            miles_active: wide.miles_active,
            vehicle_mmy,
            vehicle_mileage_share: mileage_share,
            make: parsed.make,
            model: parsed.model,
            year: parsed.year,
            engine: parsed.engine,
            ownership: parsed.ownership,
            total_earnings: wide.organic_earnings + wide.promos + wide.tip,
            total_miles: wide.miles_open_trimmed + wide.miles_active,
            total_hours: wide.hours_open_trimmed + wide.hours_active,
        }
    }
}

/// Expand each driver-week row into one row per reported vehicle, in fixed
/// slot order 1, 2, 3. A slot with no descriptor contributes nothing; a wide
/// row with no vehicles at all simply produces zero output rows.
#[tracing::instrument(level = "debug", skip(wide_rows))]
pub fn normalize(wide_rows: &[WideRecord]) -> Vec<LongRecord> {
    let mut long_rows = Vec::with_capacity(wide_rows.len());

    for wide in wide_rows {
        for VehicleSlot { mmy, mileage_share } in wide.vehicle_slots() {
            if let Some(raw_mmy) = mmy {
                long_rows.push(LongRecord::from_slot(wide, raw_mmy, mileage_share));
            }
        }
    }

    debug!(
        wide = wide_rows.len(),
        long = long_rows.len(),
        "normalized driver-week rows"
    );
    long_rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_wide() -> WideRecord {
        WideRecord {
            hashed_driver_uuid: "abc123".into(),
            weekstr: "2024-W01".into(),
            city_id: 17,
            city_name: "Brisbane".into(),
            organic_earnings: 800.5,
            promos: 50.0,
            tip: 25.25,
            hours_open_trimmed: 38.0,
            hours_active: 30.5,
            miles_open_trimmed: 420.0,
            miles_active: 350.0,
            vehicle_1_mmy: None,
            vehicle_1_mileage_share: None,
            vehicle_2_mmy: None,
            vehicle_2_mileage_share: None,
            vehicle_3_mmy: None,
            vehicle_3_mileage_share: None,
        }
    }

    #[test]
    fn no_vehicles_yields_no_rows() {
        let rows = normalize(&[sample_wide()]);
        assert!(rows.is_empty());
    }

    #[test]
    fn one_row_per_present_slot() {
        let mut wide = sample_wide();
        wide.vehicle_1_mmy = Some("Toyota | Camry | 2019 | Hybrid | Rented".into());
        wide.vehicle_1_mileage_share = Some(0.7);
        wide.vehicle_3_mmy = Some("Honda | Civic | 2015 | Gas | Owned".into());
        wide.vehicle_3_mileage_share = Some(0.3);

        let rows = normalize(&[wide]);

        // Slot 2 is absent, so two rows, in slot order.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].make.as_deref(), Some("Toyota"));
        assert_eq!(rows[0].vehicle_mileage_share, Some(0.7));
        assert_eq!(rows[1].make.as_deref(), Some("Honda"));
        assert_eq!(rows[1].vehicle_mileage_share, Some(0.3));
    }

    #[test]
    fn scalar_fields_carry_over_unchanged() {
        let mut wide = sample_wide();
        wide.vehicle_1_mmy = Some("Toyota | Camry | 2019 | Hybrid | Rented".into());
        wide.vehicle_2_mmy = Some("Honda | Civic | 2015 | Gas | Owned".into());

        let rows = normalize(&[wide.clone()]);

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.hashed_driver_uuid, wide.hashed_driver_uuid);
            assert_eq!(row.weekstr, wide.weekstr);
            assert_eq!(row.city_id, wide.city_id);
            assert_eq!(row.city_name, wide.city_name);
            assert_eq!(row.organic_earnings, wide.organic_earnings);
            assert_eq!(row.promos, wide.promos);
            assert_eq!(row.tip, wide.tip);
            assert_eq!(row.hours_open_trimmed, wide.hours_open_trimmed);
            assert_eq!(row.hours_active, wide.hours_active);
            assert_eq!(row.miles_open_trimmed, wide.miles_open_trimmed);
            assert_eq!(row.miles_active, wide.miles_active);
        }
    }

    #[test]
    fn totals_are_component_sums() {
        let mut wide = sample_wide();
        wide.vehicle_2_mmy = Some("Ford | Ranger | 2021 | Diesel | Owned".into());

        let rows = normalize(&[wide]);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(
            row.total_earnings,
            row.organic_earnings + row.promos + row.tip
        );
        assert_eq!(row.total_miles, row.miles_open_trimmed + row.miles_active);
        assert_eq!(row.total_hours, row.hours_open_trimmed + row.hours_active);
    }

    #[test]
    fn descriptor_is_trimmed_before_parsing() {
        let mut wide = sample_wide();
        wide.vehicle_1_mmy = Some("  Toyota | Camry | 2019 | Hybrid | Rented  ".into());

        let rows = normalize(&[wide]);

        assert_eq!(rows[0].vehicle_mmy, "Toyota | Camry | 2019 | Hybrid | Rented");
        assert_eq!(rows[0].make.as_deref(), Some("Toyota"));
    }

    #[test]
    fn malformed_descriptor_keeps_the_row() {
        let mut wide = sample_wide();
        wide.vehicle_1_mmy = Some("Toyota | Camry".into());

        let rows = normalize(&[wide]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].make.as_deref(), Some("Toyota"));
        assert_eq!(rows[0].model.as_deref(), Some("Camry"));
        assert_eq!(rows[0].year, None);
        assert_eq!(rows[0].engine, None);
        assert_eq!(rows[0].ownership, None);
    }
}

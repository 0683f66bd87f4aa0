// src/ingest/mod.rs
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};
use tracing::debug;

/// One driver-week observation as it appears in the survey extract.
///
/// The scalar fields are required; a row missing any of them fails
/// deserialization and aborts the run. The three vehicle slots are optional
/// pairs of (descriptor, mileage share) — blank cells come back as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct WideRecord {
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
    pub vehicle_1_mmy: Option<String>,
    pub vehicle_1_mileage_share: Option<f64>,
    pub vehicle_2_mmy: Option<String>,
    pub vehicle_2_mileage_share: Option<f64>,
    pub vehicle_3_mmy: Option<String>,
    pub vehicle_3_mileage_share: Option<f64>,
}

/// A single vehicle slot of a wide row, borrowed in slot order.
#[derive(Debug, Clone, Copy)]
pub struct VehicleSlot<'a> {
    pub mmy: Option<&'a str>,
    pub mileage_share: Option<f64>,
}

impl WideRecord {
    /// The three vehicle slots in fixed order 1, 2, 3. A slot counts as
    /// present iff its descriptor is `Some`; a stray mileage share with no
    /// descriptor does not make a slot.
    pub fn vehicle_slots(&self) -> [VehicleSlot<'_>; 3] {
        [
            VehicleSlot {
                mmy: self.vehicle_1_mmy.as_deref(),
                mileage_share: self.vehicle_1_mileage_share,
            },
            VehicleSlot {
                mmy: self.vehicle_2_mmy.as_deref(),
                mileage_share: self.vehicle_2_mileage_share,
            },
            VehicleSlot {
                mmy: self.vehicle_3_mmy.as_deref(),
                mileage_share: self.vehicle_3_mileage_share,
            },
        ]
    }
}

/// Load every driver-week row from the CSV at `path`.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_wide_csv<P: AsRef<Path>>(path: P) -> Result<Vec<WideRecord>> {
    let file = File::open(&path)
        .with_context(|| format!("failed to open input CSV {:?}", path.as_ref()))?;
    read_wide_records(file)
}

/// Parse driver-week rows out of any reader. Header names are trimmed of
/// surrounding whitespace; field values are taken as-is.
pub fn read_wide_records<R: Read>(rdr: R) -> Result<Vec<WideRecord>> {
    let mut reader = ReaderBuilder::new().trim(Trim::Headers).from_reader(rdr);

    let mut records = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        let record: WideRecord =
            result.with_context(|| format!("malformed driver-week row at record {}", idx))?;
        records.push(record);
    }

    debug!("loaded {} driver-week rows", records.len());
    Ok(records)
}

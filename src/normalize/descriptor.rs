// src/normalize/descriptor.rs
use tracing::warn;

/// Component count of a well-formed descriptor:
/// `make | model | year | engine | ownership`.
pub const DESCRIPTOR_COMPONENTS: usize = 5;

/// Vehicle attributes parsed out of the raw pipe-delimited slot string.
///
/// Every field is optional: a malformed descriptor fills what it can and
/// leaves the rest missing rather than rejecting the row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleDescriptor {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub engine: Option<String>,
    pub ownership: Option<String>,
}

impl VehicleDescriptor {
    /// Split `raw` on `|` and trim each component. A short descriptor leaves
    /// its trailing fields missing; components past the fifth are ignored.
    /// Both cases log a warning, neither fails the row.
    pub fn parse(raw: &str) -> Self {
        let components: Vec<&str> = raw.trim().split('|').map(str::trim).collect();

        if components.len() != DESCRIPTOR_COMPONENTS {
            warn!(
                raw,
                components = components.len(),
                "vehicle descriptor does not split into {} components",
                DESCRIPTOR_COMPONENTS
            );
        }

        let text = |idx: usize| -> Option<String> {
            components
                .get(idx)
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string())
        };

        VehicleDescriptor {
            make: text(0),
            model: text(1),
            year: components.get(2).and_then(|c| parse_year(c)),
            engine: text(3),
            ownership: text(4),
        }
    }
}

/// Coerce the year component to a number, `None` on failure. Accepts either
/// an integer literal or a float literal ("2019.0" shows up in older
/// extracts); anything else is missing.
fn parse_year(raw: &str) -> Option<i32> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i32>() {
        Ok(year) => Some(year),
        Err(_) => match raw.parse::<f64>() {
            Ok(year) if year.is_finite() => Some(year as i32),
            _ => {
                warn!(raw, "vehicle year is not numeric, treating as missing");
                None
            }
        },
    }
}

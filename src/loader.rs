use crate::error::LoadError;
use crate::table::Table;
use crate::types::{RawRow, Record, REQUIRED_COLUMNS};
use crate::util::{format_int, parse_count_safe, parse_date_safe, parse_f64_safe};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    /// Rows whose Lat or Long was blank and defaulted to 0.0.
    pub filled_coords: usize,
    pub date_span: (NaiveDate, NaiveDate),
}

pub fn load_table(path: impl AsRef<Path>) -> Result<(Table, LoadReport), LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(file);

    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(LoadError::MissingColumn(col.to_string()));
        }
    }

    let mut records = Vec::new();
    let mut filled_coords = 0usize;
    for result in rdr.records() {
        let raw_record = result?;
        let line = raw_record.position().map(|p| p.line()).unwrap_or(0);
        let row: RawRow = raw_record.deserialize(Some(&headers))?;

        let date = required(line, "Date", row.date.as_deref(), parse_date_safe)?;
        let confirmed = required(line, "Confirmed", row.confirmed.as_deref(), parse_count_safe)?;
        let deaths = required(line, "Deaths", row.deaths.as_deref(), parse_count_safe)?;
        let recovered = required(line, "Recovered", row.recovered.as_deref(), parse_count_safe)?;
        let active = required(line, "Active", row.active.as_deref(), parse_count_safe)?;

        let lat = coordinate(line, "Lat", row.lat.as_deref())?;
        let long = coordinate(line, "Long", row.long.as_deref())?;
        if lat.is_none() || long.is_none() {
            filled_coords += 1;
        }

        records.push(Record {
            country: text_or_unknown(row.country),
            who_region: text_or_unknown(row.who_region),
            date,
            lat: lat.unwrap_or(0.0),
            long: long.unwrap_or(0.0),
            confirmed,
            deaths,
            recovered,
            active,
        });
    }

    let table = Table::new(records);
    let Some(date_span) = table.date_span() else {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    };

    log::info!(
        "loaded {} rows from {} ({} to {})",
        format_int(table.len() as u64),
        path.display(),
        date_span.0,
        date_span.1
    );
    if filled_coords > 0 {
        log::debug!("filled missing coordinates for {} rows", filled_coords);
    }

    let report = LoadReport {
        rows: table.len(),
        filled_coords,
        date_span,
    };
    Ok((table, report))
}

fn required<T>(
    line: u64,
    column: &'static str,
    raw: Option<&str>,
    parse: fn(Option<&str>) -> Option<T>,
) -> Result<T, LoadError> {
    parse(raw).ok_or_else(|| LoadError::InvalidValue {
        line,
        column,
        value: raw.unwrap_or_default().to_string(),
    })
}

/// Blank means "missing" and is filled by the caller; anything else must
/// parse as a number.
fn coordinate(line: u64, column: &'static str, raw: Option<&str>) -> Result<Option<f64>, LoadError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => required(line, column, Some(s), parse_f64_safe).map(Some),
    }
}

fn text_or_unknown(s: Option<String>) -> String {
    match s.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => "Unknown".to_string(),
    }
}

use crate::filter::View;
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the filtered records back out under the source column names.
pub fn export_view(path: &Path, view: &View<'_>) -> Result<(), Box<dyn Error>> {
    write_csv(path, view.rows())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn render_table<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("### {}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    match render_table(rows, max_rows) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CountryRankRow, Record};
    use chrono::NaiveDate;

    #[test]
    fn render_limits_rows() {
        let rows: Vec<CountryRankRow> = (1..=5)
            .map(|i| CountryRankRow {
                rank: i,
                country: format!("C{}", i),
                total: i.to_string(),
            })
            .collect();
        let out = render_table(&rows, 2).unwrap();
        assert!(out.contains("C1"));
        assert!(out.contains("C2"));
        assert!(!out.contains("C3"));
        assert!(render_table::<CountryRankRow>(&[], 5).is_none());
    }

    #[test]
    fn export_uses_source_headers() {
        let rows = vec![Record {
            country: "Italy".to_string(),
            who_region: "Europe".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            lat: 41.87194,
            long: 12.56738,
            confirmed: 1694,
            deaths: 34,
            recovered: 83,
            active: 1577,
        }];
        let view: View = rows.iter().collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered.csv");
        export_view(&path, &view).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Country/Region,WHO Region,Date,Lat,Long,Confirmed,Deaths,Recovered,Active")
        );
        assert_eq!(
            lines.next(),
            Some("Italy,Europe,2020-03-01,41.87194,12.56738,1694,34,83,1577")
        );
    }

    #[test]
    fn writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &serde_json::json!({"rows": 3})).unwrap();
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["rows"], 3);
    }
}

use crate::error::SelectionError;
use crate::table::Table;
use crate::types::Record;
use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use std::collections::HashSet;

/// Trailing windows anchored at the table's latest date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    #[value(name = "last7")]
    Last7,
    #[value(name = "last30")]
    Last30,
    #[value(name = "last90")]
    Last90,
    #[value(name = "all-time")]
    AllTime,
}

impl Preset {
    fn days(self) -> Option<i64> {
        match self {
            Preset::Last7 => Some(7),
            Preset::Last30 => Some(30),
            Preset::Last90 => Some(90),
            Preset::AllTime => None,
        }
    }
}

/// Inclusive span with `start <= end`. Only `DateRange::new` builds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SelectionError> {
        if end < start {
            return Err(SelectionError::InvertedRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    Single(NaiveDate),
    Range(DateRange),
    Preset(Preset),
}

impl DateSelection {
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, SelectionError> {
        DateRange::new(start, end).map(DateSelection::Range)
    }
}

/// Records matching a selection, borrowed from the table in row order.
#[derive(Debug, Clone)]
pub struct View<'a> {
    rows: Vec<&'a Record>,
}

impl<'a> View<'a> {
    pub fn new(rows: Vec<&'a Record>) -> Self {
        View { rows }
    }

    pub fn rows(&self) -> &[&'a Record] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.iter().map(|r| r.date).max()
    }
}

impl<'a> FromIterator<&'a Record> for View<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Record>>(iter: I) -> Self {
        View::new(iter.into_iter().collect())
    }
}

/// Inclusive date bounds a selection resolves to against `table`.
///
/// Ranges are clamped to the table's span; a clamped range that no longer
/// overlaps the span still resolves, it just matches nothing.
pub fn resolve_bounds(table: &Table, selection: &DateSelection) -> Option<(NaiveDate, NaiveDate)> {
    let (min, max) = table.date_span()?;
    let bounds = match *selection {
        DateSelection::Single(d) => (d, d),
        DateSelection::Range(r) => (r.start().max(min), r.end().min(max)),
        DateSelection::Preset(p) => match p.days() {
            Some(n) => (max - Duration::days(n), max),
            None => (min, max),
        },
    };
    Some(bounds)
}

/// Apply a date selection and an optional WHO region set.
///
/// An empty `regions` set disables the region predicate. An empty result is
/// a valid outcome, not an error.
pub fn filter<'a>(table: &'a Table, selection: &DateSelection, regions: &HashSet<String>) -> View<'a> {
    let Some((start, end)) = resolve_bounds(table, selection) else {
        return View::new(Vec::new());
    };
    log::debug!("filtering {} to {}, {} regions", start, end, regions.len());
    table
        .records()
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .filter(|r| regions.is_empty() || regions.contains(&r.who_region))
        .collect()
}

use crate::error::LoadError;
use crate::loader::{self, LoadReport};
use crate::types::Record;
use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The loaded case table. Never mutated after construction; every query
/// produces a new view or a new aggregate.
#[derive(Debug, Clone)]
pub struct Table {
    records: Vec<Record>,
    span: Option<(NaiveDate, NaiveDate)>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        let span = records.iter().fold(None, |acc, r| match acc {
            None => Some((r.date, r.date)),
            Some((lo, hi)) => Some((r.date.min(lo), r.date.max(hi))),
        });
        Table { records, span }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Earliest and latest date present, or `None` for an empty table.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.span
    }

    /// Distinct WHO regions in first-seen order.
    pub fn regions(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.who_region.as_str())
            .filter(|r| seen.insert(*r))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Process-scoped handle to the loaded table.
///
/// The first `get` reads the source file; later calls share the same
/// `Arc<Table>`. `invalidate` forgets it so the next `get` re-reads.
#[derive(Debug)]
pub struct DataStore {
    path: PathBuf,
    cell: OnceCell<(Arc<Table>, LoadReport)>,
}

impl DataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DataStore {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<Arc<Table>, LoadError> {
        if self.cell.get().is_some() {
            log::debug!("using cached table for {}", self.path.display());
        }
        let (table, _) = self.cell.get_or_try_init(|| {
            let (table, report) = loader::load_table(&self.path)?;
            Ok::<_, LoadError>((Arc::new(table), report))
        })?;
        Ok(Arc::clone(table))
    }

    /// Diagnostics from the load currently cached, if any.
    pub fn report(&self) -> Option<&LoadReport> {
        self.cell.get().map(|(_, report)| report)
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn invalidate(&mut self) {
        if self.cell.take().is_some() {
            log::info!("invalidated cached table for {}", self.path.display());
        }
    }

    pub fn reload(&mut self) -> Result<Arc<Table>, LoadError> {
        self.invalidate();
        self.get()
    }
}

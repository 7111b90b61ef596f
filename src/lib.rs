//! Case-table loading, filtering and aggregation for the COVID-19 dashboard.
//!
//! The flow for one interaction is `filter::filter` then
//! `reports::build_dashboard`, both over a `Table` loaded once through a
//! `table::DataStore`.
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod reports;
pub mod table;
pub mod types;
pub mod util;

pub use error::{ConfigError, LoadError, SelectionError};
pub use filter::{filter, DateRange, DateSelection, Preset, View};
pub use reports::{build_dashboard, Dashboard, DashboardOptions, Outcome};
pub use table::{DataStore, Table};
pub use types::{Metric, Record, Totals};

use crate::error::ConfigError;
use crate::filter::{DateSelection, Preset};
use crate::reports::DashboardOptions;
use crate::table::Table;
use crate::types::Metric;
use chrono::NaiveDate;
use clap::Parser;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "covid_dash",
    version,
    about = "COVID-19 case dashboard over a per-country daily CSV",
    after_help = r#"
EXAMPLES:
  covid_dash
  covid_dash --date 2020-04-01
  covid_dash --start 2020-03-01 --end 2020-03-31 --region Europe
  covid_dash --preset last30 --metric deaths --top-n 5
  covid_dash --preset all-time --export filtered.csv --summary summary.json
"#
)]
pub struct Cli {
    /// Source CSV file.
    #[arg(long, default_value = "data/covid_19_clean_complete.csv")]
    pub data: PathBuf,

    /// Show a single day.
    #[arg(long, conflicts_with_all = ["start", "end", "preset"])]
    pub date: Option<NaiveDate>,

    /// First day of a range (defaults to the earliest date).
    #[arg(long, conflicts_with = "preset")]
    pub start: Option<NaiveDate>,

    /// Last day of a range (defaults to the latest date).
    #[arg(long, conflicts_with = "preset")]
    pub end: Option<NaiveDate>,

    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// WHO region to keep; repeat for several. None keeps all.
    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// Metric used to rank countries.
    #[arg(long, value_enum, default_value_t = Metric::Confirmed)]
    pub metric: Metric,

    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(5..=20))]
    pub top_n: u8,

    #[arg(long, value_enum, default_value_t = Metric::Confirmed)]
    pub map_metric: Metric,

    #[arg(long, default_value = "7")]
    pub rolling_window: NonZeroUsize,

    #[arg(long)]
    pub no_rolling: bool,

    /// Write the filtered rows as CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write cards, rates and insights as JSON.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    /// Date selection implied by the flags. With no date flag the latest
    /// day in the table is shown.
    pub fn selection(&self, table: &Table) -> Result<DateSelection, ConfigError> {
        if let Some(d) = self.date {
            return Ok(DateSelection::Single(d));
        }
        if let Some(p) = self.preset {
            return Ok(DateSelection::Preset(p));
        }
        let Some((min, max)) = table.date_span() else {
            return Ok(DateSelection::Preset(Preset::AllTime));
        };
        if self.start.is_some() || self.end.is_some() {
            let start = self.start.unwrap_or(min);
            let end = self.end.unwrap_or(max);
            return Ok(DateSelection::range(start, end)?);
        }
        Ok(DateSelection::Single(max))
    }

    /// Requested regions, checked against what the table contains.
    pub fn region_set(&self, table: &Table) -> Result<HashSet<String>, ConfigError> {
        let known = table.regions();
        let mut set = HashSet::new();
        for r in &self.regions {
            if !known.contains(&r.as_str()) {
                return Err(ConfigError::UnknownRegion(r.clone()));
            }
            set.insert(r.clone());
        }
        Ok(set)
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            top_metric: self.metric,
            top_n: self.top_n as usize,
            map_metric: self.map_metric,
            rolling_window: (!self.no_rolling).then_some(self.rolling_window),
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

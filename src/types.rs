use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Header names the source file must carry. Any other column is ignored.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Country/Region",
    "WHO Region",
    "Date",
    "Lat",
    "Long",
    "Confirmed",
    "Deaths",
    "Recovered",
    "Active",
];

#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Country/Region")]
    pub country: Option<String>,
    #[serde(rename = "WHO Region")]
    pub who_region: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Lat")]
    pub lat: Option<String>,
    #[serde(rename = "Long")]
    pub long: Option<String>,
    #[serde(rename = "Confirmed")]
    pub confirmed: Option<String>,
    #[serde(rename = "Deaths")]
    pub deaths: Option<String>,
    #[serde(rename = "Recovered")]
    pub recovered: Option<String>,
    #[serde(rename = "Active")]
    pub active: Option<String>,
}

/// One country/region on one day. `active` is taken from the source as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(rename = "Country/Region")]
    pub country: String,
    #[serde(rename = "WHO Region")]
    pub who_region: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Lat")]
    pub lat: f64,
    #[serde(rename = "Long")]
    pub long: f64,
    #[serde(rename = "Confirmed")]
    pub confirmed: u64,
    #[serde(rename = "Deaths")]
    pub deaths: u64,
    #[serde(rename = "Recovered")]
    pub recovered: u64,
    #[serde(rename = "Active")]
    pub active: u64,
}

impl Record {
    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Deaths => self.deaths,
            Metric::Recovered => self.recovered,
            Metric::Active => self.active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum)]
pub enum Metric {
    Confirmed,
    Deaths,
    Recovered,
    Active,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Confirmed,
        Metric::Deaths,
        Metric::Recovered,
        Metric::Active,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Metric::Confirmed => "Confirmed",
            Metric::Deaths => "Deaths",
            Metric::Recovered => "Recovered",
            Metric::Active => "Active",
        }
    }

    /// Label used on the metric cards.
    pub fn card_label(self) -> &'static str {
        match self {
            Metric::Confirmed => "Confirmed Cases",
            Metric::Deaths => "Deaths",
            Metric::Recovered => "Recovered",
            Metric::Active => "Active Cases",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Summed counts for the four metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
    pub active: u64,
}

impl Totals {
    /// Accumulate one record. Sums saturate at `u64::MAX`.
    pub fn add(&mut self, r: &Record) {
        self.confirmed = self.confirmed.saturating_add(r.confirmed);
        self.deaths = self.deaths.saturating_add(r.deaths);
        self.recovered = self.recovered.saturating_add(r.recovered);
        self.active = self.active.saturating_add(r.active);
    }

    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Deaths => self.deaths,
            Metric::Recovered => self.recovered,
            Metric::Active => self.active,
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MetricCardRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Change")]
    #[tabled(rename = "Change")]
    pub change: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Confirmed")]
    #[tabled(rename = "Confirmed")]
    pub confirmed: String,
    #[serde(rename = "Deaths")]
    #[tabled(rename = "Deaths")]
    pub deaths: String,
    #[serde(rename = "Recovered")]
    #[tabled(rename = "Recovered")]
    pub recovered: String,
    #[serde(rename = "Active")]
    #[tabled(rename = "Active")]
    pub active: String,
    #[serde(rename = "Confirmed7d")]
    #[tabled(rename = "Confirmed (avg)")]
    pub confirmed_avg: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionRow {
    #[serde(rename = "WHO Region")]
    #[tabled(rename = "WHO Region")]
    pub region: String,
    #[serde(rename = "Confirmed")]
    #[tabled(rename = "Confirmed")]
    pub confirmed: String,
    #[serde(rename = "Deaths")]
    #[tabled(rename = "Deaths")]
    pub deaths: String,
    #[serde(rename = "Recovered")]
    #[tabled(rename = "Recovered")]
    pub recovered: String,
    #[serde(rename = "Active")]
    #[tabled(rename = "Active")]
    pub active: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CountryRankRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Country/Region")]
    #[tabled(rename = "Country/Region")]
    pub country: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MarkerRow {
    #[serde(rename = "Country/Region")]
    #[tabled(rename = "Country/Region")]
    pub country: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Lat")]
    #[tabled(rename = "Lat")]
    pub lat: String,
    #[serde(rename = "Long")]
    #[tabled(rename = "Long")]
    pub long: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Radius")]
    #[tabled(rename = "Radius")]
    pub radius: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub latest_date: NaiveDate,
    pub previous_date: NaiveDate,
    pub rows: usize,
    pub cards: Vec<MetricCardRow>,
    pub mortality_rate: Option<f64>,
    pub recovery_rate: Option<f64>,
    pub most_affected_region: Option<String>,
    pub most_affected_country: Option<String>,
}

use crate::filter::View;
use crate::metrics::{
    self, daily_series, group_sum, latest_deltas, max_group, rolling_mean, top_n, DeltaSet,
    GroupKey, GroupSum, Rates,
};
use crate::types::{
    CountryRankRow, MarkerRow, Metric, MetricCardRow, RegionRow, SummaryStats, Totals, TrendRow,
};
use crate::util::{format_int, format_number};
use chrono::NaiveDate;
use std::num::NonZeroUsize;

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub top_metric: Metric,
    pub top_n: usize,
    pub map_metric: Metric,
    /// `None` turns the rolling averages off.
    pub rolling_window: Option<NonZeroUsize>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        DashboardOptions {
            top_metric: Metric::Confirmed,
            top_n: 10,
            map_metric: Metric::Confirmed,
            rolling_window: NonZeroUsize::new(7),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub totals: Totals,
    /// Rolling means in `Metric::ALL` order; empty when disabled.
    pub rolling: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub country: String,
    pub date: NaiveDate,
    pub lat: f64,
    pub long: f64,
    pub value: u64,
    pub radius: f64,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub rates: Rates,
    pub most_affected_region: Option<String>,
    pub most_affected_country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub rows: usize,
    pub deltas: DeltaSet,
    pub trend: Vec<TrendPoint>,
    pub regions: Vec<GroupSum>,
    pub top_metric: Metric,
    pub top_countries: Vec<(String, u64)>,
    pub map_metric: Metric,
    pub markers: Vec<Marker>,
    pub insights: Insights,
}

/// Result of one recompute pass. `NoData` is the empty-selection state and
/// short-circuits every dependent figure.
#[derive(Debug, Clone)]
pub enum Outcome {
    Ready(Box<Dashboard>),
    NoData,
}

pub fn build_dashboard(view: &View<'_>, opts: &DashboardOptions) -> Outcome {
    let Some(deltas) = latest_deltas(view) else {
        return Outcome::NoData;
    };

    let trend = trend_points(view, opts.rolling_window);
    let regions = group_sum(view, GroupKey::WhoRegion, &Metric::ALL);
    let top_countries = top_n(view, GroupKey::Country, opts.top_metric, opts.top_n);
    let markers = map_markers(view, opts.map_metric);

    let insights = Insights {
        rates: metrics::rates(view),
        most_affected_region: max_group(&regions, Metric::Confirmed).map(|g| g.key.clone()),
        most_affected_country: top_countries.first().map(|(k, _)| k.clone()),
    };

    Outcome::Ready(Box::new(Dashboard {
        rows: view.len(),
        deltas,
        trend,
        regions,
        top_metric: opts.top_metric,
        top_countries,
        map_metric: opts.map_metric,
        markers,
        insights,
    }))
}

pub fn trend_points(view: &View<'_>, window: Option<NonZeroUsize>) -> Vec<TrendPoint> {
    let series = daily_series(view);
    let rolling: Vec<Vec<Option<f64>>> = match window {
        Some(w) => Metric::ALL
            .iter()
            .map(|m| {
                let values: Vec<f64> = series.iter().map(|(_, t)| t.get(*m) as f64).collect();
                rolling_mean(&values, w)
            })
            .collect(),
        None => Vec::new(),
    };
    series
        .into_iter()
        .enumerate()
        .map(|(i, (date, totals))| TrendPoint {
            date,
            totals,
            rolling: rolling.iter().map(|col| col[i]).collect(),
        })
        .collect()
}

/// One marker per row with a positive value; radius grows with ln(value).
pub fn map_markers(view: &View<'_>, metric: Metric) -> Vec<Marker> {
    view.iter()
        .filter(|r| r.value(metric) > 0)
        .map(|r| {
            let value = r.value(metric);
            let mut totals = Totals::default();
            totals.add(r);
            Marker {
                country: r.country.clone(),
                date: r.date,
                lat: r.lat,
                long: r.long,
                value,
                radius: (value as f64 + 1.0).ln() * 2.0,
                totals,
            }
        })
        .collect()
}

impl Dashboard {
    pub fn card_rows(&self) -> Vec<MetricCardRow> {
        Metric::ALL
            .iter()
            .map(|m| MetricCardRow {
                label: m.card_label().to_string(),
                value: format_int(self.deltas.latest.get(*m)),
                change: self.deltas.change(*m).to_string(),
            })
            .collect()
    }

    pub fn trend_rows(&self) -> Vec<TrendRow> {
        self.trend
            .iter()
            .map(|p| TrendRow {
                date: p.date.to_string(),
                confirmed: format_int(p.totals.confirmed),
                deaths: format_int(p.totals.deaths),
                recovered: format_int(p.totals.recovered),
                active: format_int(p.totals.active),
                confirmed_avg: match p.rolling.first().copied().flatten() {
                    Some(v) => format_number(v, 1),
                    None => "-".to_string(),
                },
            })
            .collect()
    }

    pub fn region_rows(&self) -> Vec<RegionRow> {
        let cell = |g: &GroupSum, m: Metric| format_int(g.get(m).unwrap_or(0));
        self.regions
            .iter()
            .map(|g| RegionRow {
                region: g.key.clone(),
                confirmed: cell(g, Metric::Confirmed),
                deaths: cell(g, Metric::Deaths),
                recovered: cell(g, Metric::Recovered),
                active: cell(g, Metric::Active),
            })
            .collect()
    }

    pub fn country_rows(&self) -> Vec<CountryRankRow> {
        self.top_countries
            .iter()
            .enumerate()
            .map(|(i, (country, total))| CountryRankRow {
                rank: i + 1,
                country: country.clone(),
                total: format_int(*total),
            })
            .collect()
    }

    /// Marker rows, largest value first.
    pub fn marker_rows(&self) -> Vec<MarkerRow> {
        let mut markers: Vec<&Marker> = self.markers.iter().collect();
        markers.sort_by(|a, b| b.value.cmp(&a.value));
        markers
            .into_iter()
            .map(|m| MarkerRow {
                country: m.country.clone(),
                date: m.date.to_string(),
                lat: format!("{:.4}", m.lat),
                long: format!("{:.4}", m.long),
                value: format_int(m.value),
                radius: format!("{:.2}", m.radius),
            })
            .collect()
    }

    pub fn summary(&self) -> SummaryStats {
        SummaryStats {
            latest_date: self.deltas.latest_date,
            previous_date: self.deltas.previous_date,
            rows: self.rows,
            cards: self.card_rows(),
            mortality_rate: self.insights.rates.mortality,
            recovery_rate: self.insights.rates.recovery,
            most_affected_region: self.insights.most_affected_region.clone(),
            most_affected_country: self.insights.most_affected_country.clone(),
        }
    }
}

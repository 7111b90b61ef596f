// Aggregations over a filtered view: day totals, deltas, group sums,
// rankings, rolling means and rates. Everything here is pure.
use crate::filter::View;
use crate::types::{Metric, Record, Totals};
use crate::util::average;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::num::NonZeroUsize;

pub fn daily_totals(view: &View<'_>, date: NaiveDate) -> Totals {
    let mut totals = Totals::default();
    for r in view.iter().filter(|r| r.date == date) {
        totals.add(r);
    }
    totals
}

/// Relative change against a baseline.
///
/// A zero baseline yields `NoBaseline`, which reads as 0 wherever a plain
/// number is needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change {
    Percent(f64),
    NoBaseline,
}

impl Change {
    pub fn as_f64(self) -> f64 {
        match self {
            Change::Percent(p) => p,
            Change::NoBaseline => 0.0,
        }
    }

    pub fn percent(self) -> Option<f64> {
        match self {
            Change::Percent(p) => Some(p),
            Change::NoBaseline => None,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.as_f64();
        if v == 0.0 {
            f.write_str("No change")
        } else {
            write!(f, "{:+.1}%", v)
        }
    }
}

pub fn percent_change(current: f64, previous: f64) -> Change {
    if previous == 0.0 {
        return Change::NoBaseline;
    }
    Change::Percent((current - previous) / previous * 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeltaSet {
    pub latest_date: NaiveDate,
    pub previous_date: NaiveDate,
    pub latest: Totals,
    pub previous: Totals,
}

impl DeltaSet {
    pub fn change(&self, metric: Metric) -> Change {
        percent_change(
            self.latest.get(metric) as f64,
            self.previous.get(metric) as f64,
        )
    }
}

/// Totals on the view's latest date against the calendar day before it.
/// `None` when the view is empty.
pub fn latest_deltas(view: &View<'_>) -> Option<DeltaSet> {
    let latest_date = view.latest_date()?;
    let previous_date = latest_date - Duration::days(1);
    Some(DeltaSet {
        latest_date,
        previous_date,
        latest: daily_totals(view, latest_date),
        previous: daily_totals(view, previous_date),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Country,
    WhoRegion,
    Date,
}

impl GroupKey {
    fn value(self, r: &Record) -> String {
        match self {
            GroupKey::Country => r.country.clone(),
            GroupKey::WhoRegion => r.who_region.clone(),
            GroupKey::Date => r.date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSum {
    pub key: String,
    pub sums: Vec<(Metric, u64)>,
}

impl GroupSum {
    pub fn get(&self, metric: Metric) -> Option<u64> {
        self.sums.iter().find(|(m, _)| *m == metric).map(|(_, v)| *v)
    }
}

/// One row per distinct key, in the order keys are first seen.
pub fn group_sum(view: &View<'_>, key: GroupKey, fields: &[Metric]) -> Vec<GroupSum> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<GroupSum> = Vec::new();
    for r in view.iter() {
        let k = key.value(r);
        let slot = match index.get(&k) {
            Some(&i) => i,
            None => {
                index.insert(k.clone(), out.len());
                out.push(GroupSum {
                    key: k,
                    sums: fields.iter().map(|m| (*m, 0)).collect(),
                });
                out.len() - 1
            }
        };
        for (m, v) in out[slot].sums.iter_mut() {
            *v = v.saturating_add(r.value(*m));
        }
    }
    out
}

/// Highest `n` groups by summed `field`. Ties keep first-seen order.
pub fn top_n(view: &View<'_>, key: GroupKey, field: Metric, n: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = group_sum(view, key, &[field])
        .into_iter()
        .map(|g| (g.key, g.sums[0].1))
        .collect();
    // `sort_by` is stable.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Totals per date, ascending.
pub fn daily_series(view: &View<'_>) -> Vec<(NaiveDate, Totals)> {
    let mut by_date: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
    for r in view.iter() {
        by_date.entry(r.date).or_default().add(r);
    }
    by_date.into_iter().collect()
}

/// Trailing mean over `window` values. The first `window - 1` positions
/// have no value.
pub fn rolling_mean(series: &[f64], window: NonZeroUsize) -> Vec<Option<f64>> {
    let w = window.get();
    (0..series.len())
        .map(|i| {
            if i + 1 < w {
                None
            } else {
                Some(average(&series[i + 1 - w..=i]))
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rates {
    pub mortality: Option<f64>,
    pub recovery: Option<f64>,
}

/// Mortality and recovery percentages on the view's latest date.
/// Both are `None` when there are no confirmed cases to divide by.
pub fn rates(view: &View<'_>) -> Rates {
    let Some(latest) = view.latest_date() else {
        return Rates::default();
    };
    let totals = daily_totals(view, latest);
    if totals.confirmed == 0 {
        return Rates::default();
    }
    let confirmed = totals.confirmed as f64;
    Rates {
        mortality: Some(totals.deaths as f64 / confirmed * 100.0),
        recovery: Some(totals.recovered as f64 / confirmed * 100.0),
    }
}

/// First group holding the largest sum of `field`.
pub fn max_group<'g>(groups: &'g [GroupSum], field: Metric) -> Option<&'g GroupSum> {
    groups.iter().fold(None, |best, g| match best {
        None => Some(g),
        Some(b) => match g.get(field).cmp(&b.get(field)) {
            Ordering::Greater => Some(g),
            _ => Some(b),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn rec(country: &str, region: &str, date: NaiveDate, c: u64, d: u64, r: u64) -> Record {
        Record {
            country: country.to_string(),
            who_region: region.to_string(),
            date,
            lat: 0.0,
            long: 0.0,
            confirmed: c,
            deaths: d,
            recovered: r,
            active: c - d - r,
        }
    }

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn daily_totals_for_country_scenario() {
        let rows = vec![
            rec("A", "Europe", day(1), 10, 0, 0),
            rec("A", "Europe", day(2), 15, 0, 0),
        ];
        let view: View = rows.iter().collect();
        assert_eq!(daily_totals(&view, day(2)).confirmed, 15);
        assert_eq!(daily_totals(&view, day(1)).confirmed, 10);
        assert!((percent_change(15.0, 10.0).as_f64() - 50.0).abs() < EPS);
    }

    #[test]
    fn daily_totals_outside_span_are_zero() {
        let rows = vec![rec("A", "Europe", day(1), 10, 2, 3)];
        let view: View = rows.iter().collect();
        assert_eq!(daily_totals(&view, day(9)), Totals::default());
    }

    #[test]
    fn percent_change_without_baseline_reads_as_zero() {
        for c in [0.0, 5.0, -3.0] {
            let change = percent_change(c, 0.0);
            assert_eq!(change, Change::NoBaseline);
            assert_eq!(change.as_f64(), 0.0);
            assert_eq!(change.percent(), None);
        }
    }

    #[test]
    fn percent_change_matches_formula() {
        for (c, p) in [(15.0, 10.0), (3.0, 7.0), (0.0, 4.0), (1e6, 3.0)] {
            let expected = (c - p) / p * 100.0;
            assert!((percent_change(c, p).as_f64() - expected).abs() < EPS);
        }
    }

    #[test]
    fn change_display() {
        assert_eq!(percent_change(15.0, 10.0).to_string(), "+50.0%");
        assert_eq!(percent_change(5.0, 10.0).to_string(), "-50.0%");
        assert_eq!(percent_change(10.0, 10.0).to_string(), "No change");
        assert_eq!(Change::NoBaseline.to_string(), "No change");
    }

    #[test]
    fn latest_deltas_compare_with_previous_day() {
        let rows = vec![
            rec("A", "Europe", day(1), 10, 1, 1),
            rec("B", "Asia", day(1), 10, 1, 1),
            rec("A", "Europe", day(2), 15, 2, 2),
            rec("B", "Asia", day(2), 15, 2, 2),
        ];
        let view: View = rows.iter().collect();
        let deltas = latest_deltas(&view).unwrap();
        assert_eq!(deltas.latest_date, day(2));
        assert_eq!(deltas.previous_date, day(1));
        assert_eq!(deltas.latest.confirmed, 30);
        assert_eq!(deltas.previous.confirmed, 20);
        assert!((deltas.change(Metric::Confirmed).as_f64() - 50.0).abs() < EPS);
        assert!((deltas.change(Metric::Deaths).as_f64() - 100.0).abs() < EPS);
    }

    #[test]
    fn latest_deltas_gap_day_has_no_baseline() {
        let rows = vec![
            rec("A", "Europe", day(1), 10, 0, 0),
            rec("A", "Europe", day(5), 12, 0, 0),
        ];
        let view: View = rows.iter().collect();
        let deltas = latest_deltas(&view).unwrap();
        assert_eq!(deltas.previous, Totals::default());
        assert_eq!(deltas.change(Metric::Confirmed), Change::NoBaseline);
    }

    #[test]
    fn latest_deltas_empty_view() {
        let view = View::new(Vec::new());
        assert_eq!(latest_deltas(&view), None);
    }

    #[test]
    fn group_sum_by_region() {
        let rows = vec![
            rec("France", "Europe", day(1), 60, 0, 0),
            rec("India", "Asia", day(1), 50, 0, 0),
            rec("Spain", "Europe", day(1), 40, 0, 0),
        ];
        let view: View = rows.iter().collect();
        let groups = group_sum(&view, GroupKey::WhoRegion, &[Metric::Confirmed, Metric::Deaths]);
        assert_eq!(groups.len(), 2);
        let europe = groups.iter().find(|g| g.key == "Europe").unwrap();
        let asia = groups.iter().find(|g| g.key == "Asia").unwrap();
        assert_eq!(europe.get(Metric::Confirmed), Some(100));
        assert_eq!(asia.get(Metric::Confirmed), Some(50));
        assert_eq!(asia.get(Metric::Active), None);
    }

    #[test]
    fn sums_saturate_instead_of_overflowing() {
        let big = u64::MAX / 2 + 1;
        let rows = vec![
            rec("A", "Europe", day(1), big, 0, 0),
            rec("B", "Europe", day(1), big, 0, 0),
        ];
        let view: View = rows.iter().collect();
        assert_eq!(daily_totals(&view, day(1)).confirmed, u64::MAX);
        assert_eq!(daily_series(&view)[0].1.confirmed, u64::MAX);
        let groups = group_sum(&view, GroupKey::WhoRegion, &[Metric::Confirmed]);
        assert_eq!(groups[0].get(Metric::Confirmed), Some(u64::MAX));
    }

    #[test]
    fn group_sum_by_date_key() {
        let rows = vec![
            rec("A", "Europe", day(2), 1, 0, 0),
            rec("B", "Europe", day(2), 2, 0, 0),
        ];
        let view: View = rows.iter().collect();
        let groups = group_sum(&view, GroupKey::Date, &[Metric::Confirmed]);
        assert_eq!(groups[0].key, "2020-01-02");
        assert_eq!(groups[0].get(Metric::Confirmed), Some(3));
    }

    #[test]
    fn top_one_of_three() {
        let rows = vec![
            rec("A", "Europe", day(1), 5, 0, 0),
            rec("B", "Europe", day(1), 20, 0, 0),
            rec("C", "Europe", day(1), 15, 0, 0),
        ];
        let view: View = rows.iter().collect();
        assert_eq!(
            top_n(&view, GroupKey::Country, Metric::Confirmed, 1),
            vec![("B".to_string(), 20)]
        );
    }

    #[test]
    fn top_n_is_bounded_descending_and_stable() {
        let rows = vec![
            rec("A", "Europe", day(1), 5, 0, 0),
            rec("B", "Europe", day(1), 9, 0, 0),
            rec("C", "Europe", day(1), 9, 0, 0),
            rec("A", "Europe", day(2), 4, 0, 0),
        ];
        let view: View = rows.iter().collect();
        let ranked = top_n(&view, GroupKey::Country, Metric::Confirmed, 10);
        assert_eq!(ranked.len(), 3);
        let keys: Vec<&str> = ranked.iter().map(|(k, _)| k.as_str()).collect();
        // A (9) was seen before B (9) and C (9).
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(top_n(&view, GroupKey::Country, Metric::Confirmed, 0).is_empty());
    }

    #[test]
    fn daily_series_is_sorted() {
        let rows = vec![
            rec("A", "Europe", day(3), 3, 0, 0),
            rec("A", "Europe", day(1), 1, 0, 0),
            rec("B", "Asia", day(3), 4, 0, 0),
        ];
        let view: View = rows.iter().collect();
        let series = daily_series(&view);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, day(1));
        assert_eq!(series[1].1.confirmed, 7);
    }

    #[test]
    fn rolling_mean_marks_insufficient_history() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], nz(3));
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap() - 2.0).abs() < EPS);
        assert!((out[4].unwrap() - 4.0).abs() < EPS);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn rolling_mean_window_one_is_identity() {
        let series = [0.1, 7.25, 1e12, 3.0];
        let out = rolling_mean(&series, nz(1));
        let expected: Vec<Option<f64>> = series.iter().map(|v| Some(*v)).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn rolling_mean_longer_than_series() {
        assert_eq!(rolling_mean(&[1.0, 2.0], nz(7)), vec![None, None]);
    }

    #[test]
    fn rates_on_latest_date() {
        let rows = vec![
            rec("A", "Europe", day(1), 1000, 500, 0),
            rec("A", "Europe", day(2), 200, 10, 50),
            rec("B", "Asia", day(2), 200, 10, 50),
        ];
        let view: View = rows.iter().collect();
        let r = rates(&view);
        assert!((r.mortality.unwrap() - 5.0).abs() < EPS);
        assert!((r.recovery.unwrap() - 25.0).abs() < EPS);
    }

    #[test]
    fn rates_not_computable_without_cases() {
        assert_eq!(rates(&View::new(Vec::new())), Rates::default());
        let rows = vec![rec("A", "Europe", day(1), 0, 0, 0)];
        let view: View = rows.iter().collect();
        let r = rates(&view);
        assert_eq!(r.mortality, None);
        assert_eq!(r.recovery, None);
    }

    #[test]
    fn max_group_prefers_first_on_ties() {
        let groups = vec![
            GroupSum { key: "X".into(), sums: vec![(Metric::Confirmed, 5)] },
            GroupSum { key: "Y".into(), sums: vec![(Metric::Confirmed, 5)] },
        ];
        assert_eq!(max_group(&groups, Metric::Confirmed).unwrap().key, "X");
        assert!(max_group(&[], Metric::Confirmed).is_none());
    }
}

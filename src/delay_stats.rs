//! Delay aggregation for the statistics charts: per-day, per-service-class
//! totals, averages and delayed percentages over a date range, plus the
//! top-N lists shown next to the charts.
//!
//! A run only counts as delayed once its arrival delay reaches
//! [`DELAY_THRESHOLD_MINUTES`]; smaller delays and missing observations
//! contribute nothing to the totals.

use crate::models::{DelayRecord, TrainType};
use chrono::NaiveDate;
use itertools::Itertools;
use std::collections::HashMap;

/// Minimum arrival delay, in minutes, for a run to count as delayed.
pub const DELAY_THRESHOLD_MINUTES: i32 = 5;

/// Aggregates for one (date, service class) cell of the chart grid.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct DailyTypeDelay {
    pub date: NaiveDate,
    pub train_type: TrainType,
    /// Sum of arrival delays at or above the threshold, in minutes.
    pub total_delay: i64,
    /// Mean delay of the delayed runs, rounded to whole minutes. 0 when
    /// nothing was delayed.
    pub average_delay: i64,
    /// Share of runs that were delayed, rounded to a whole percent. 0 when
    /// there were no runs at all.
    pub delay_percentage: u32,
    pub total_count: u32,
    pub delayed_count: u32,
}

/// Route occurrence count among delayed runs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RouteDelayCount {
    pub route: String,
    pub count: u32,
}

#[derive(Clone, Copy, Default)]
struct Bucket {
    total: u32,
    delayed: u32,
    delay_sum: i64,
}

fn is_delayed(record: &DelayRecord) -> bool {
    record.arrival_delay.unwrap_or(0) >= DELAY_THRESHOLD_MINUTES
}

fn route_label(record: &DelayRecord) -> String {
    format!(
        "{} → {}",
        record.start_station.as_deref().unwrap_or("Unknown"),
        record.end_station.as_deref().unwrap_or("Unknown")
    )
}

/// Partition `delays` by (date, service class) and emit one row for every
/// date in `[from, to]` crossed with every service class, zero-filled where
/// no data exists, so all chart series stay aligned on the same axis.
///
/// Records with a service class outside [`TrainType::ALL`] are not part of
/// the grid.
pub fn aggregate_daily(
    delays: &[DelayRecord],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<DailyTypeDelay> {
    let mut buckets: HashMap<(NaiveDate, TrainType), Bucket> = HashMap::new();

    for record in delays {
        let Some(train_type) = TrainType::from_code(&record.train_type) else {
            continue;
        };

        let bucket = buckets.entry((record.date, train_type)).or_default();
        bucket.total += 1;
        if is_delayed(record) {
            bucket.delayed += 1;
            bucket.delay_sum += i64::from(record.arrival_delay.unwrap_or(0));
        }
    }

    let mut rows = Vec::new();
    let mut date = from;
    while date <= to {
        for train_type in TrainType::ALL {
            let bucket = buckets
                .get(&(date, train_type))
                .copied()
                .unwrap_or_default();

            rows.push(DailyTypeDelay {
                date,
                train_type,
                total_delay: bucket.delay_sum,
                average_delay: if bucket.delayed > 0 {
                    (bucket.delay_sum as f64 / bucket.delayed as f64).round() as i64
                } else {
                    0
                },
                delay_percentage: if bucket.total > 0 {
                    (bucket.delayed as f64 / bucket.total as f64 * 100.0).round() as u32
                } else {
                    0
                },
                total_count: bucket.total,
                delayed_count: bucket.delayed,
            });
        }

        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    rows
}

/// The `limit` longest individual delays, descending. Ties keep their
/// original order.
pub fn longest_delays(delays: &[DelayRecord], limit: usize) -> Vec<DelayRecord> {
    delays
        .iter()
        .filter(|record| is_delayed(record))
        .cloned()
        .sorted_by(|a, b| b.arrival_delay.cmp(&a.arrival_delay))
        .take(limit)
        .collect()
}

/// The `limit` routes with the most delayed runs, descending by count.
/// Ties keep the order in which the routes first appear.
pub fn most_delayed_routes(delays: &[DelayRecord], limit: usize) -> Vec<RouteDelayCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u32> = HashMap::new();

    for record in delays.iter().filter(|record| is_delayed(record)) {
        let route = route_label(record);
        *counts.entry(route.clone()).or_insert_with(|| {
            order.push(route);
            0
        }) += 1;
    }

    order
        .into_iter()
        .map(|route| {
            let count = counts[&route];
            RouteDelayCount { route, count }
        })
        .sorted_by(|a, b| b.count.cmp(&a.count))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        date: &str,
        train_id: &str,
        train_type: &str,
        arrival_delay: Option<i32>,
        start: &str,
        end: &str,
    ) -> DelayRecord {
        DelayRecord {
            date: date.parse().unwrap(),
            train_id: train_id.to_string(),
            train_type: train_type.to_string(),
            sequence: 5,
            arrival_delay,
            departure_delay: None,
            start_station: Some(start.to_string()),
            end_station: Some(end.to_string()),
        }
    }

    fn cell<'a>(
        rows: &'a [DailyTypeDelay],
        date: &str,
        train_type: TrainType,
    ) -> &'a DailyTypeDelay {
        let date: NaiveDate = date.parse().unwrap();
        rows.iter()
            .find(|row| row.date == date && row.train_type == train_type)
            .unwrap()
    }

    #[test]
    fn threshold_and_zero_fill() {
        let delays = vec![
            record("2024-01-01", "T1", "GV", Some(10), "CASA VOYAGEURS", "TANGER"),
            record("2024-01-01", "T2", "GV", Some(2), "TANGER", "CASA VOYAGEURS"),
            record("2024-01-02", "T3", "GV", None, "CASA VOYAGEURS", "TANGER"),
        ];

        let from: NaiveDate = "2024-01-01".parse().unwrap();
        let to: NaiveDate = "2024-01-02".parse().unwrap();
        let rows = aggregate_daily(&delays, from, to);

        // Two dates, each with the full set of service classes.
        assert_eq!(rows.len(), 2 * TrainType::ALL.len());

        let day_one = cell(&rows, "2024-01-01", TrainType::Gv);
        assert_eq!(day_one.total_delay, 10);
        assert_eq!(day_one.average_delay, 10);
        assert_eq!(day_one.delay_percentage, 50);
        assert_eq!(day_one.total_count, 2);
        assert_eq!(day_one.delayed_count, 1);

        // A run with no observed delay still counts toward the total.
        let day_two = cell(&rows, "2024-01-02", TrainType::Gv);
        assert_eq!(day_two.total_delay, 0);
        assert_eq!(day_two.average_delay, 0);
        assert_eq!(day_two.delay_percentage, 0);
        assert_eq!(day_two.total_count, 1);

        // Classes with no data at all are present and zeroed.
        let empty = cell(&rows, "2024-01-01", TrainType::Tnr);
        assert_eq!(empty.total_delay, 0);
        assert_eq!(empty.average_delay, 0);
        assert_eq!(empty.delay_percentage, 0);
        assert_eq!(empty.total_count, 0);
    }

    #[test]
    fn totals_match_a_direct_filter_over_the_raw_records() {
        let delays = vec![
            record("2024-03-01", "T1", "TNR", Some(7), "CASA PORT", "KENITRA"),
            record("2024-03-01", "T2", "TNR", Some(12), "KENITRA", "CASA PORT"),
            record("2024-03-01", "T3", "TNR", Some(4), "CASA PORT", "KENITRA"),
            record("2024-03-02", "T1", "TNR", Some(30), "CASA PORT", "KENITRA"),
            record("2024-03-02", "T4", "TLR", Some(9), "FES", "MARRAKECH"),
        ];

        let from: NaiveDate = "2024-03-01".parse().unwrap();
        let to: NaiveDate = "2024-03-02".parse().unwrap();
        let rows = aggregate_daily(&delays, from, to);

        let grid_total: i64 = rows
            .iter()
            .filter(|row| row.train_type == TrainType::Tnr)
            .map(|row| row.total_delay)
            .sum();
        let direct_total: i64 = delays
            .iter()
            .filter(|r| r.train_type == "TNR" && r.arrival_delay.unwrap_or(0) >= 5)
            .map(|r| i64::from(r.arrival_delay.unwrap()))
            .sum();

        assert_eq!(grid_total, direct_total);
    }

    #[test]
    fn every_date_in_range_appears_even_without_data() {
        let delays = vec![record(
            "2024-05-02",
            "T1",
            "GV",
            Some(20),
            "CASA VOYAGEURS",
            "TANGER",
        )];

        let from: NaiveDate = "2024-05-01".parse().unwrap();
        let to: NaiveDate = "2024-05-03".parse().unwrap();
        let rows = aggregate_daily(&delays, from, to);

        assert_eq!(rows.len(), 3 * TrainType::ALL.len());
        assert_eq!(cell(&rows, "2024-05-01", TrainType::Gv).total_count, 0);
        assert_eq!(cell(&rows, "2024-05-03", TrainType::Gv).total_count, 0);
    }

    #[test]
    fn unknown_service_classes_stay_out_of_the_grid() {
        let delays = vec![record(
            "2024-05-01",
            "T1",
            "ICE",
            Some(45),
            "CASA VOYAGEURS",
            "TANGER",
        )];

        let from: NaiveDate = "2024-05-01".parse().unwrap();
        let rows = aggregate_daily(&delays, from, from);

        assert!(rows.iter().all(|row| row.total_count == 0));
        // But they still show up in the top lists.
        assert_eq!(longest_delays(&delays, 5).len(), 1);
        assert_eq!(most_delayed_routes(&delays, 5).len(), 1);
    }

    #[test]
    fn inverted_range_is_empty() {
        let from: NaiveDate = "2024-05-02".parse().unwrap();
        let to: NaiveDate = "2024-05-01".parse().unwrap();
        assert!(aggregate_daily(&[], from, to).is_empty());
    }

    #[test]
    fn longest_delays_sorts_descending_and_applies_the_threshold() {
        let delays = vec![
            record("2024-01-01", "T1", "GV", Some(12), "CASA VOYAGEURS", "TANGER"),
            record("2024-01-01", "T2", "TL", Some(3), "SAFI", "BENGUERIR"),
            record("2024-01-01", "T3", "TLR", Some(55), "FES", "MARRAKECH"),
            record("2024-01-01", "T4", "TNR", None, "CASA PORT", "KENITRA"),
            record("2024-01-02", "T5", "GV", Some(12), "TANGER", "CASA VOYAGEURS"),
        ];

        let top = longest_delays(&delays, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].train_id, "T3");
        // Tie between T1 and T5 resolves to the earlier record.
        assert_eq!(top[1].train_id, "T1");
    }

    #[test]
    fn most_delayed_routes_counts_occurrences() {
        let delays = vec![
            record("2024-01-01", "T1", "GV", Some(12), "CASA VOYAGEURS", "TANGER"),
            record("2024-01-02", "T2", "GV", Some(8), "CASA VOYAGEURS", "TANGER"),
            record("2024-01-02", "T3", "TLR", Some(9), "FES", "MARRAKECH"),
            record("2024-01-03", "T4", "TLR", Some(2), "FES", "MARRAKECH"),
        ];

        let routes = most_delayed_routes(&delays, 5);
        assert_eq!(
            routes,
            vec![
                RouteDelayCount {
                    route: "CASA VOYAGEURS → TANGER".to_string(),
                    count: 2,
                },
                RouteDelayCount {
                    route: "FES → MARRAKECH".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn missing_stations_group_under_unknown() {
        let mut delay = record("2024-01-01", "T1", "GV", Some(12), "", "");
        delay.start_station = None;
        delay.end_station = None;

        let routes = most_delayed_routes(&[delay], 5);
        assert_eq!(routes[0].route, "Unknown → Unknown");
    }
}

//! Finds the scheduled journeys connecting a departure and arrival station
//! on a given date, by scanning the route templates in the traffic table.
//!
//! A journey is a contiguous run of legs of a single train: the leg that
//! departs the requested station through the leg that arrives at the
//! requested station. Trains whose calendar does not include the date's
//! weekday are excluded outright.

use crate::models::TrafficRecord;
use crate::schedule_time;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("departure and arrival stations must differ")]
    SameStation,
}

/// A matched sub-journey: the inclusive slice of one train's legs from the
/// departure station to the arrival station.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MatchedTrip {
    pub train_id: String,
    pub legs: Vec<TrafficRecord>,
}

impl MatchedTrip {
    /// Scheduled departure from the first station of the slice.
    pub fn departure_time(&self) -> &str {
        &self.legs[0].scheduled_departure_time
    }

    /// Scheduled arrival at the last station of the slice.
    pub fn arrival_time(&self) -> &str {
        &self.legs[self.legs.len() - 1].scheduled_arrival_time
    }

    /// Total scheduled duration, wrapping past midnight when the arrival
    /// time is numerically earlier than the departure.
    pub fn duration_minutes(&self) -> Option<u32> {
        schedule_time::duration_minutes(self.departure_time(), self.arrival_time())
    }
}

/// Find every train serving `departure_station` to `arrival_station` on
/// `date`, ordered by scheduled departure time.
///
/// `now` is the wall clock supplied by the caller: when `date` is the
/// clock's own date, journeys that have already departed are dropped.
/// Requests for future dates are never filtered by time of day.
pub fn match_trips(
    traffic: &[TrafficRecord],
    departure_station: &str,
    arrival_station: &str,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<Vec<MatchedTrip>, MatchError> {
    if departure_station == arrival_station {
        return Err(MatchError::SameStation);
    }

    let weekday = date.weekday().num_days_from_sunday() as i16;

    // Group legs per train, keeping first-appearance order so the result
    // is stable across runs.
    let mut train_order: Vec<&str> = Vec::new();
    let mut legs_by_train: HashMap<&str, Vec<&TrafficRecord>> = HashMap::new();
    for record in traffic {
        legs_by_train
            .entry(record.train_id.as_str())
            .or_insert_with(|| {
                train_order.push(record.train_id.as_str());
                Vec::new()
            })
            .push(record);
    }

    let mut matches: Vec<MatchedTrip> = Vec::new();

    for train_id in train_order {
        let mut legs = legs_by_train.remove(train_id).unwrap_or_default();
        legs.sort_by_key(|leg| leg.sequence);

        // No leg running on the requested weekday means the train does not
        // operate that day. Excluded rather than assumed.
        if !legs.iter().any(|leg| leg.runs_on(weekday)) {
            continue;
        }

        let Some(dep_idx) = legs
            .iter()
            .position(|leg| leg.current_station == departure_station)
        else {
            continue;
        };

        // Earliest leg strictly after the departure that reaches the
        // arrival station. Loop routes that pass the station again later
        // therefore bind to the shortest sub-journey.
        let Some(arr_idx) = legs
            .iter()
            .enumerate()
            .skip(dep_idx + 1)
            .find(|(_, leg)| leg.next_station == arrival_station)
            .map(|(idx, _)| idx)
        else {
            continue;
        };

        matches.push(MatchedTrip {
            train_id: train_id.to_string(),
            legs: legs[dep_idx..=arr_idx].iter().map(|leg| (*leg).clone()).collect(),
        });
    }

    matches.sort_by_key(|trip| {
        schedule_time::minutes_since_midnight(trip.departure_time()).unwrap_or(u32::MAX)
    });

    if date == now.date() {
        let now_minutes = now.time().hour() * 60 + now.time().minute();
        matches.retain(|trip| {
            match schedule_time::minutes_since_midnight(trip.departure_time()) {
                Some(minutes) => minutes >= now_minutes,
                None => true,
            }
        });
    }

    Ok(matches)
}

/// Stations a journey can start from: every station the traffic table
/// departs, in first-appearance order. Feeds the departure picker of the
/// search form.
pub fn departure_options(traffic: &[TrafficRecord]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut options = Vec::new();

    for record in traffic {
        if seen.insert(record.current_station.as_str()) {
            options.push(record.current_station.clone());
        }
    }

    options
}

/// Stations still reachable after departing `departure_station`, keeping
/// the arrival picker consistent with the chosen departure. For each train
/// calling there, only stations from its last call onward qualify.
pub fn arrival_options(traffic: &[TrafficRecord], departure_station: &str) -> Vec<String> {
    let mut last_call_by_train: HashMap<&str, i32> = HashMap::new();
    for record in traffic {
        if record.current_station == departure_station {
            let sequence = last_call_by_train
                .entry(record.train_id.as_str())
                .or_insert(record.sequence);
            if record.sequence > *sequence {
                *sequence = record.sequence;
            }
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut options = Vec::new();

    for record in traffic {
        let Some(&from_sequence) = last_call_by_train.get(record.train_id.as_str()) else {
            continue;
        };
        if record.sequence >= from_sequence && seen.insert(record.next_station.as_str()) {
            options.push(record.next_station.clone());
        }
    }

    options
}

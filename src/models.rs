// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Service classes operated on the network, as stored in the `train_type`
/// text column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrainType {
    /// High speed ("TGV")
    #[serde(rename = "GV")]
    Gv,
    /// Intercity ("Al Atlas")
    #[serde(rename = "TLR")]
    Tlr,
    /// Shuttle ("Navette")
    #[serde(rename = "TNR")]
    Tnr,
    /// Classic line trains
    #[serde(rename = "TL")]
    Tl,
}

impl TrainType {
    /// Category order used by the dashboard charts.
    pub const ALL: [TrainType; 4] = [
        TrainType::Tnr,
        TrainType::Tlr,
        TrainType::Tl,
        TrainType::Gv,
    ];

    pub fn code(self) -> &'static str {
        match self {
            TrainType::Gv => "GV",
            TrainType::Tlr => "TLR",
            TrainType::Tnr => "TNR",
            TrainType::Tl => "TL",
        }
    }

    pub fn from_code(code: &str) -> Option<TrainType> {
        match code {
            "GV" => Some(TrainType::Gv),
            "TLR" => Some(TrainType::Tlr),
            "TNR" => Some(TrainType::Tnr),
            "TL" => Some(TrainType::Tl),
            _ => None,
        }
    }

    /// Marketing name shown in the dashboard filter options.
    pub fn label(self) -> &'static str {
        match self {
            TrainType::Gv => "TGV",
            TrainType::Tlr => "Al Atlas",
            TrainType::Tnr => "Navette",
            TrainType::Tl => "Train de ligne",
        }
    }
}

/// One scheduled leg of a train's route template: the hop from
/// `current_station` to `next_station` at position `sequence` (1-based)
/// along the route. `day_of_week` lists the days the leg runs,
/// 0 = Sunday through 6 = Saturday.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrafficRecord {
    pub id: i32,
    pub train_id: String,
    pub sequence: i32,
    pub current_station: String,
    pub next_station: String,
    pub train_type: String,
    pub scheduled_departure_time: String,
    pub scheduled_arrival_time: String,
    pub day_of_week: Vec<i16>,
}

impl TrafficRecord {
    pub fn runs_on(&self, weekday: i16) -> bool {
        self.day_of_week.contains(&weekday)
    }
}

/// One per-station status row from the `trips` table, served raw to the
/// Status view. Times are 24h "HH:MM" text; actual times and delays stay
/// absent until the observation exists.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct TripRow {
    pub id: i32,
    pub date: NaiveDate,
    pub train_id: String,
    pub train_type: String,
    pub sequence: i32,
    pub station_name: Option<String>,
    pub initial_departure_station: String,
    pub final_arrival_station: String,
    pub scheduled_departure_time: Option<String>,
    pub scheduled_arrival_time: Option<String>,
    pub actual_departure_time: Option<String>,
    pub actual_arrival_time: Option<String>,
    pub departure_delay: Option<i32>,
    pub arrival_delay: Option<i32>,
}

/// Lateness summary for one train on one day, from the `train_delays`
/// view (one row per train per date, carrying the final sequence of the
/// run). Delays are whole minutes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DelayRecord {
    pub date: NaiveDate,
    pub train_id: String,
    pub train_type: String,
    pub sequence: i32,
    pub arrival_delay: Option<i32>,
    pub departure_delay: Option<i32>,
    pub start_station: Option<String>,
    pub end_station: Option<String>,
}

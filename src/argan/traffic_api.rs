//! Endpoints over the `traffic` route templates and the `train_delays`
//! view, including the two computed ones: journey search for the Forecast
//! feature and the aggregated summary behind the statistics charts.

use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use oncycle::delay_stats;
use oncycle::models::{DelayRecord, TrafficRecord};
use oncycle::trip_matcher::{self, MatchedTrip};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;

/// How many entries the "longest delays" and "most delayed routes" lists
/// carry.
const TOP_LIST_SIZE: usize = 5;

/// Full traffic table, ordered the way the matcher and the form options
/// expect it.
#[actix_web::get("/traffic")]
pub async fn traffic(pool: web::Data<PgPool>) -> impl Responder {
    let rows = sqlx::query_as::<_, TrafficRecord>(
        "SELECT * FROM traffic ORDER BY train_id ASC, sequence ASC",
    )
    .fetch_all(pool.get_ref())
    .await;

    match rows {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("traffic query failed: {}", err);
            HttpResponse::InternalServerError().json(json!({"error": err.to_string()}))
        }
    }
}

/// Full delay view. Registered in both the public and the keyed group.
#[actix_web::get("/train_delays")]
pub async fn train_delays(pool: web::Data<PgPool>) -> impl Responder {
    let rows = sqlx::query_as::<_, DelayRecord>(
        "SELECT date, train_id, train_type, sequence,
                arrival_delay, departure_delay, start_station, end_station
         FROM train_delays",
    )
    .fetch_all(pool.get_ref())
    .await;

    match rows {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("train delays query failed: {}", err);
            HttpResponse::InternalServerError().json(json!({"error": err.to_string()}))
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct TrainSummary {
    train_id: String,
    train_type: String,
}

/// Distinct trains known to the traffic table.
#[actix_web::get("/trains")]
pub async fn trains(pool: web::Data<PgPool>) -> impl Responder {
    let rows = sqlx::query_as::<_, TrainSummary>(
        "SELECT DISTINCT train_id, train_type FROM traffic ORDER BY train_id ASC",
    )
    .fetch_all(pool.get_ref())
    .await;

    match rows {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("trains query failed: {}", err);
            HttpResponse::InternalServerError().json(json!({"error": err.to_string()}))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JourneyQuery {
    departure_station: Option<String>,
    arrival_station: Option<String>,
    date: Option<NaiveDate>,
}

#[derive(Serialize)]
struct JourneyOut {
    train_id: String,
    train_type: String,
    departure_station: String,
    arrival_station: String,
    scheduled_departure_time: String,
    scheduled_arrival_time: String,
    duration_minutes: Option<u32>,
    legs: Vec<TrafficRecord>,
}

impl From<MatchedTrip> for JourneyOut {
    fn from(trip: MatchedTrip) -> JourneyOut {
        JourneyOut {
            train_type: trip.legs[0].train_type.clone(),
            departure_station: trip.legs[0].current_station.clone(),
            arrival_station: trip.legs[trip.legs.len() - 1].next_station.clone(),
            scheduled_departure_time: trip.departure_time().to_string(),
            scheduled_arrival_time: trip.arrival_time().to_string(),
            duration_minutes: trip.duration_minutes(),
            train_id: trip.train_id,
            legs: trip.legs,
        }
    }
}

/// Journey search over the route templates: every train connecting the
/// two stations on the requested date, earliest departure first.
#[actix_web::get("/journeys")]
pub async fn journeys(
    pool: web::Data<PgPool>,
    query: web::Query<JourneyQuery>,
) -> impl Responder {
    let query = query.into_inner();

    let (Some(departure), Some(arrival), Some(date)) =
        (query.departure_station, query.arrival_station, query.date)
    else {
        return HttpResponse::BadRequest().json(json!({
            "error": "Missing required query parameters: departure_station, arrival_station, date"
        }));
    };

    let rows = sqlx::query_as::<_, TrafficRecord>(
        "SELECT * FROM traffic ORDER BY train_id ASC, sequence ASC",
    )
    .fetch_all(pool.get_ref())
    .await;

    let traffic_records = match rows {
        Ok(rows) => rows,
        Err(err) => {
            log::error!("traffic query failed: {}", err);
            return HttpResponse::InternalServerError().json(json!({"error": err.to_string()}));
        }
    };

    match trip_matcher::match_trips(
        &traffic_records,
        &departure,
        &arrival,
        date,
        chrono::Local::now().naive_local(),
    ) {
        Ok(trips) => HttpResponse::Ok().json(
            trips
                .into_iter()
                .map(JourneyOut::from)
                .collect::<Vec<JourneyOut>>(),
        ),
        Err(err) => HttpResponse::BadRequest().json(json!({"error": err.to_string()})),
    }
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

#[derive(Serialize)]
struct DelaySummaryOut {
    daily: Vec<delay_stats::DailyTypeDelay>,
    longest_delays: Vec<DelayRecord>,
    most_delayed_routes: Vec<delay_stats::RouteDelayCount>,
}

/// Aggregated statistics over a date range: the per-day grid plus the two
/// top lists, computed from the delay view in one pass.
#[actix_web::get("/delays/summary")]
pub async fn delay_summary(
    pool: web::Data<PgPool>,
    query: web::Query<SummaryQuery>,
) -> impl Responder {
    let (Some(from), Some(to)) = (query.from, query.to) else {
        return HttpResponse::BadRequest().json(json!({
            "error": "Missing required query parameters: from, to"
        }));
    };

    let rows = sqlx::query_as::<_, DelayRecord>(
        "SELECT date, train_id, train_type, sequence,
                arrival_delay, departure_delay, start_station, end_station
         FROM train_delays
         WHERE date >= $1 AND date <= $2",
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool.get_ref())
    .await;

    match rows {
        Ok(delays) => HttpResponse::Ok().json(DelaySummaryOut {
            daily: delay_stats::aggregate_daily(&delays, from, to),
            longest_delays: delay_stats::longest_delays(&delays, TOP_LIST_SIZE),
            most_delayed_routes: delay_stats::most_delayed_routes(&delays, TOP_LIST_SIZE),
        }),
        Err(err) => {
            log::error!("delay summary query failed: {}", err);
            HttpResponse::InternalServerError().json(json!({"error": err.to_string()}))
        }
    }
}

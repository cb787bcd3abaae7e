//! Passthrough queries against the `trips` table and the `train_delays`
//! view. These endpoints do no computation of their own; they forward the
//! caller's filters to the store and hand the rows back as JSON.

use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use oncycle::models::{DelayRecord, TripRow};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

#[derive(Debug, Deserialize)]
pub struct TripsQuery {
    initial_departure_station: Option<String>,
    final_arrival_station: Option<String>,
    train_type: Option<String>,
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

/// Strict variant for the public group: every filter is required, matching
/// what the Status view always sends.
#[actix_web::get("/trips")]
pub async fn public_trips(
    pool: web::Data<PgPool>,
    query: web::Query<TripsQuery>,
) -> impl Responder {
    let query = query.into_inner();

    let (Some(departure), Some(arrival), Some(train_type), Some(date)) = (
        query.initial_departure_station,
        query.final_arrival_station,
        query.train_type,
        query.date,
    ) else {
        return HttpResponse::BadRequest().json(json!({
            "error": "Missing required query parameters: initial_departure_station, final_arrival_station, train_type, date"
        }));
    };

    let rows = sqlx::query_as::<_, TripRow>(
        "SELECT * FROM trips
         WHERE initial_departure_station = $1
           AND final_arrival_station = $2
           AND train_type = $3
           AND date = $4
         ORDER BY scheduled_departure_time ASC",
    )
    .bind(&departure)
    .bind(&arrival)
    .bind(&train_type)
    .bind(date)
    .fetch_all(pool.get_ref())
    .await;

    match rows {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("trips query failed: {}", err);
            HttpResponse::InternalServerError().json(json!({"error": err.to_string()}))
        }
    }
}

/// Lenient variant for the keyed group: filters apply only when present.
#[actix_web::get("/trips")]
pub async fn trips(pool: web::Data<PgPool>, query: web::Query<TripsQuery>) -> impl Responder {
    let query = query.into_inner();

    let mut builder = sqlx::QueryBuilder::new("SELECT * FROM trips WHERE 1=1");
    if let Some(departure) = &query.initial_departure_station {
        builder.push(" AND initial_departure_station = ");
        builder.push_bind(departure);
    }
    if let Some(arrival) = &query.final_arrival_station {
        builder.push(" AND final_arrival_station = ");
        builder.push_bind(arrival);
    }
    if let Some(train_type) = &query.train_type {
        builder.push(" AND train_type = ");
        builder.push_bind(train_type);
    }
    if let Some(date) = query.date {
        builder.push(" AND date = ");
        builder.push_bind(date);
    }
    builder.push(" ORDER BY scheduled_departure_time ASC");

    let rows = builder
        .build_query_as::<TripRow>()
        .fetch_all(pool.get_ref())
        .await;

    match rows {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("trips query failed: {}", err);
            HttpResponse::InternalServerError().json(json!({"error": err.to_string()}))
        }
    }
}

/// Raw delay-view rows over a date range, for the statistics charts.
/// Registered in both the public and the keyed group.
#[actix_web::get("/trips/statistics")]
pub async fn trip_statistics(
    pool: web::Data<PgPool>,
    query: web::Query<DateRangeQuery>,
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
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => {
            log::error!("delay statistics query failed: {}", err);
            HttpResponse::InternalServerError().json(json!({"error": err.to_string()}))
        }
    }
}

/// Most recent service date present in the `trips` table. The date picker
/// uses it to anchor its default range.
#[actix_web::get("/latest_date")]
pub async fn latest_date(pool: web::Data<PgPool>) -> impl Responder {
    let row = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT date FROM trips ORDER BY date DESC LIMIT 1",
    )
    .fetch_optional(pool.get_ref())
    .await;

    match row {
        Ok(Some(date)) => HttpResponse::Ok().json(json!({"latest_date": date})),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "No trips found"})),
        Err(err) => {
            log::error!("latest date query failed: {}", err);
            HttpResponse::InternalServerError().json(json!({"error": err.to_string()}))
        }
    }
}

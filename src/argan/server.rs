// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::arc_with_non_send_sync,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::bytes_nth,
    clippy::deprecated_clippy_cfg_attr,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

mod api_key;
mod prediction_proxy;
mod rate_limit;
mod traffic_api;
mod trips_api;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use api_key::RequireApiKey;
use prediction_proxy::PredictionUpstream;
use rate_limit::RateLimit;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

const RATE_LIMIT_MAX_REQUESTS: u32 = 250;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

async fn index(_req: HttpRequest) -> impl Responder {
    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/plain"))
        .body("ONCycle rail data API")
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let api_key = std::env::var("API_KEY").expect("API_KEY must be set");
    let upstream = PredictionUpstream {
        url: std::env::var("PREDICTION_SERVICE_URL")
            .expect("PREDICTION_SERVICE_URL must be set"),
        api_key: std::env::var("ML_SERVICE_API_KEY").expect("ML_SERVICE_API_KEY must be set"),
    };

    let allowed_origins: Vec<String> = std::env::var("FRONTEND_URL")
        .map(|urls| {
            urls.split(',')
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let production = std::env::var("APP_ENV")
        .map(|env| env == "production")
        .unwrap_or(false);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url.as_str())
        .await
        .expect("could not connect to postgres");

    let http_client = reqwest::Client::new();
    let rate_limit = RateLimit::new(RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(3001);

    log::info!("Starting argan API server on port {}", port);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        if !production {
            cors = cors.allowed_origin("http://localhost:5173");
        }

        App::new()
            .wrap(middleware::Compress::default())
            .wrap(cors)
            .wrap(rate_limit.clone())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(http_client.clone()))
            .app_data(web::Data::new(upstream.clone()))
            .route("/", web::get().to(index))
            .route("/health", web::get().to(health))
            .service(
                web::scope("/api/public")
                    .service(trips_api::public_trips)
                    .service(trips_api::trip_statistics)
                    .service(trips_api::latest_date)
                    .service(traffic_api::traffic)
                    .service(traffic_api::train_delays)
                    .service(traffic_api::journeys)
                    .service(traffic_api::delay_summary)
                    .service(prediction_proxy::predict),
            )
            .service(
                web::scope("/api")
                    .wrap(RequireApiKey::new(api_key.as_str()))
                    .service(trips_api::trips)
                    .service(trips_api::trip_statistics)
                    .service(traffic_api::train_delays)
                    .service(traffic_api::trains),
            )
    })
    .workers(4)
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

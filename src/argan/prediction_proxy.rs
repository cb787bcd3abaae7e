//! Proxy to the external delay-prediction service. The caller sends the
//! bare list of trains; the upstream wants it wrapped in a `predictions`
//! envelope and authenticated with its own key, neither of which the
//! browser should know about.

use actix_web::{web, HttpResponse, Responder};
use oncycle::prediction::PredictionQuery;
use serde_json::json;

#[derive(Clone)]
pub struct PredictionUpstream {
    pub url: String,
    pub api_key: String,
}

#[actix_web::post("/predict")]
pub async fn predict(
    client: web::Data<reqwest::Client>,
    upstream: web::Data<PredictionUpstream>,
    body: web::Json<Vec<PredictionQuery>>,
) -> impl Responder {
    let payload = json!({ "predictions": body.into_inner() });

    let response = client
        .post(&upstream.url)
        .header("x-api-key", upstream.api_key.as_str())
        .json(&payload)
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            log::error!("prediction service call failed: {}", err);
            return HttpResponse::InternalServerError().json(json!({"error": err.to_string()}));
        }
    };

    // Upstream answers are passed through untouched, aligned with the
    // request by index.
    match response.json::<serde_json::Value>().await {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(err) => {
            log::error!("prediction service returned an unreadable body: {}", err);
            HttpResponse::InternalServerError().json(json!({"error": err.to_string()}))
        }
    }
}

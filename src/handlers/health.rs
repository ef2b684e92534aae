// GET /health handler

use std::convert::Infallible;
use warp::http::StatusCode;

use crate::models::HealthResponse;

pub async fn health_handler() -> Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::with_status(
        warp::reply::json(&HealthResponse::ok()),
        StatusCode::OK,
    ))
}

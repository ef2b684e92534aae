// Route definitions and handlers

use std::collections::HashMap;
use std::convert::Infallible;
use warp::Filter;

use crate::error::{handle_rejection, AppError};
use crate::handlers;
use crate::state::AppState;

/// Largest webhook body accepted, in bytes
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

pub fn configure_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    // POST /kommo-webhook
    let webhook = warp::path("kommo-webhook")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::query::<HashMap<String, String>>())
        .and(body_limit())
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(handlers::webhook_handler);

    // GET /health
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::health_handler);

    webhook
        .or(health)
        .recover(handle_rejection)
        .with(warp::log("kommo_bridge::http"))
}

// Rejects a declared `Content-Length` over the limit before reading the body.
// Requests without the header (empty or chunked) pass through; the handler
// checks the size of what was actually read.
fn body_limit() -> impl Filter<Extract = (), Error = warp::Rejection> + Clone {
    warp::header::optional::<u64>("content-length")
        .and_then(|length: Option<u64>| async move {
            match length {
                Some(length) if length > MAX_BODY_BYTES => {
                    Err(warp::reject::custom(AppError::PayloadTooLarge))
                }
                _ => Ok(()),
            }
        })
        .untuple_one()
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

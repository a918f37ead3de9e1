//! Cron trigger route
//!
//! - POST /cron/ranking - Kick off a contributor ranking cycle
//!
//! The trigger is authorized by a shared key in the X-Cron-Key header,
//! not a user token. The cycle runs in a background task; the endpoint
//! answers 202 immediately so the caller's timeout never couples to
//! course count.

use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::routes::{
    cors_preflight, json_response, method_not_allowed, not_found, BoxBody, ErrorResponse,
    SuccessResponse,
};
use crate::server::AppState;

/// POST /cron/ranking
async fn handle_run_ranking(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let provided = req
        .headers()
        .get("X-Cron-Key")
        .and_then(|v| v.to_str().ok());

    let authorized = match (&state.args.cron_secret, provided) {
        (Some(secret), Some(key)) => key == secret,
        // Without a configured secret the trigger only works in dev mode
        (None, _) => state.args.dev_mode,
        (Some(_), None) => false,
    };

    if !authorized {
        warn!("Ranking trigger rejected: bad or missing X-Cron-Key");
        return json_response(
            StatusCode::UNAUTHORIZED,
            &ErrorResponse {
                error: "Invalid cron key".into(),
                code: Some("UNAUTHORIZED".into()),
            },
        );
    }

    info!("Ranking cycle triggered");

    // Fire and forget: the cycle outlives this request
    let ranking = state.ranking.clone();
    tokio::spawn(async move {
        if let Err(e) = ranking.run_cycle().await {
            error!(error = %e, "Ranking cycle failed");
        }
    });

    json_response(
        StatusCode::ACCEPTED,
        &SuccessResponse {
            success: true,
            message: "Ranking cycle started".into(),
        },
    )
}

/// Handle /cron/* requests.
///
/// Returns Some(response) if the request was handled, None otherwise.
pub async fn handle_cron_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !path.starts_with("/cron") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let response = match (method, path.as_str()) {
        (Method::POST, "/cron/ranking") => handle_run_ranking(req, state).await,
        (_, "/cron/ranking") => method_not_allowed(),
        _ => not_found(&path),
    };

    Some(response)
}

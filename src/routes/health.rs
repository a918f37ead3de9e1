//! Health check endpoint

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::config::Args;
use crate::routes::{json_response, BoxBody};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    node_id: String,
    version: &'static str,
}

/// GET /health
pub fn health_check(args: &Args) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "ok",
            node_id: args.node_id.to_string(),
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each area of the
//! API has its own dispatcher in [`crate::routes`]; this module owns
//! the accept loop and the top-level path split.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::MongoClient;
use crate::ranking::RankingEngine;
use crate::rewards::RewardEngine;
use crate::routes::{self, BoxBody};
use crate::types::CafeError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: MongoClient,
    pub jwt: JwtValidator,
    pub rewards: RewardEngine,
    pub ranking: RankingEngine,
}

impl AppState {
    pub fn new(
        args: Args,
        mongo: MongoClient,
        jwt: JwtValidator,
        rewards: RewardEngine,
        ranking: RankingEngine,
    ) -> Self {
        Self {
            args,
            mongo,
            jwt,
            rewards,
            ranking,
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), CafeError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "ClassCafe listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - insecure JWT secret in use");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    // Health check first, no auth
    if method == Method::GET && (path == "/health" || path == "/healthz") {
        return Ok(routes::health_check(&state.args));
    }

    if method == Method::OPTIONS {
        return Ok(routes::cors_preflight());
    }

    // Each dispatcher owns a path prefix and consumes the request.
    // /courses also covers course-scoped forum and meme paths; bare
    // /posts and /replies paths go straight to the forum dispatcher.
    let response = if path.starts_with("/auth") {
        routes::handle_auth_request(req, state).await
    } else if path.starts_with("/courses") {
        routes::handle_course_request(req, state).await
    } else if path.starts_with("/posts") || path.starts_with("/replies") {
        routes::handle_forum_request(req, state).await
    } else if path.starts_with("/avatar") {
        routes::handle_avatar_request(req, state).await
    } else if path.starts_with("/admin") {
        routes::handle_admin_request(req, state).await
    } else if path.starts_with("/cron") {
        routes::handle_cron_request(req, state).await
    } else {
        None
    };

    Ok(response.unwrap_or_else(|| routes::not_found(&path)))
}

//! ClassCafe - course forum backend with coin rewards

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classcafe::{
    auth::JwtValidator,
    config::Args,
    db::MongoClient,
    ranking::{RankingEngine, RankingWeights},
    rewards::{RewardEngine, RewardPolicy},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("classcafe={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  ClassCafe - course forum backend");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("MongoDB: {}", args.mongodb_uri);
    info!(
        "Rewards: post +{}, reply every {}, like every {}",
        args.post_reward, args.reply_divisor, args.like_divisor
    );
    info!(
        "Meme board: cost {}, top-contributor gate {}",
        args.meme_cost,
        if args.meme_top_contributor_only { "on" } else { "off" }
    );
    info!("======================================");

    // Connect to MongoDB; nothing works without the store
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            client
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    // Build the JWT validator
    let jwt = if args.dev_mode {
        JwtValidator::new_dev()
    } else {
        match JwtValidator::new(args.jwt_secret(), args.jwt_expiry_seconds) {
            Ok(j) => j,
            Err(e) => {
                error!("JWT configuration error: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Wire up the engines
    let rewards = RewardEngine::new(mongo.clone(), RewardPolicy::from_args(&args));
    let ranking = RankingEngine::new(
        mongo.clone(),
        RankingWeights {
            post_weight: args.post_weight as i64,
            reply_weight: args.reply_weight as i64,
        },
    );

    let state = Arc::new(AppState::new(args, mongo, jwt, rewards, ranking));

    server::run(state).await?;

    Ok(())
}

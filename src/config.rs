//! Configuration for ClassCafe
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// ClassCafe - course social backend
#[derive(Parser, Debug, Clone)]
#[command(name = "classcafe")]
#[command(about = "Course forums, coin rewards, and top-contributor rotation")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "classcafe")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds (default 7 days)
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "604800")]
    pub jwt_expiry_seconds: u64,

    /// Shared secret expected in the X-Cron-Key header of ranking triggers.
    /// When unset, the cron endpoint is open (dev/MVP behavior).
    #[arg(long, env = "CRON_SECRET")]
    pub cron_secret: Option<String>,

    /// Enable development mode (relaxes JWT secret requirement)
    #[arg(long, env = "DEV_MODE", default_value = "false", action = clap::ArgAction::Set)]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Coins credited for creating a forum post
    #[arg(long, env = "POST_REWARD", default_value = "1")]
    pub post_reward: i64,

    /// Award 1 coin whenever the author's total reply count hits a
    /// multiple of this divisor
    #[arg(long, env = "REPLY_DIVISOR", default_value = "2")]
    pub reply_divisor: u64,

    /// Award 1 coin to the liker whenever their total likes-given count
    /// hits a multiple of this divisor
    #[arg(long, env = "LIKE_DIVISOR", default_value = "3")]
    pub like_divisor: u64,

    /// Coin cost of posting to the meme board (0 disables the cost gate)
    #[arg(long, env = "MEME_COST", default_value = "5")]
    pub meme_cost: i64,

    /// Restrict meme posting to the course's current top contributor
    #[arg(long, env = "MEME_TOP_CONTRIBUTOR_ONLY", default_value = "true", action = clap::ArgAction::Set)]
    pub meme_top_contributor_only: bool,

    /// Ranking score weight per forum post
    #[arg(long, env = "POST_WEIGHT", default_value = "5")]
    pub post_weight: u64,

    /// Ranking score weight per reply (must not exceed the post weight)
    #[arg(long, env = "REPLY_WEIGHT", default_value = "3")]
    pub reply_weight: u64,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        if self.dev_mode {
            self.jwt_secret
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-secret-0123456789abcdef".to_string())
        } else {
            self.jwt_secret
                .clone()
                .expect("JWT_SECRET is required in production mode")
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.post_reward < 0 {
            return Err("POST_REWARD must not be negative".to_string());
        }

        if self.reply_divisor == 0 {
            return Err("REPLY_DIVISOR must be at least 1".to_string());
        }

        if self.like_divisor == 0 {
            return Err("LIKE_DIVISOR must be at least 1".to_string());
        }

        if self.meme_cost < 0 {
            return Err("MEME_COST must not be negative".to_string());
        }

        if self.reply_weight > self.post_weight {
            return Err("REPLY_WEIGHT must not exceed POST_WEIGHT".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["classcafe", "--dev-mode", "true"])
    }

    #[test]
    fn test_defaults_are_valid() {
        let args = base_args();
        assert!(args.validate().is_ok());
        assert_eq!(args.post_reward, 1);
        assert_eq!(args.reply_divisor, 2);
        assert_eq!(args.like_divisor, 3);
        assert_eq!(args.meme_cost, 5);
        assert!(args.meme_top_contributor_only);
        assert_eq!(args.post_weight, 5);
        assert_eq!(args.reply_weight, 3);
    }

    #[test]
    fn test_jwt_secret_required_in_production() {
        let mut args = base_args();
        args.dev_mode = false;
        args.jwt_secret = None;
        assert!(args.validate().is_err());

        args.jwt_secret = Some("a-strong-secret-of-sufficient-length!".into());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_zero_divisors_rejected() {
        let mut args = base_args();
        args.reply_divisor = 0;
        assert!(args.validate().is_err());

        let mut args = base_args();
        args.like_divisor = 0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_reply_weight_must_not_exceed_post_weight() {
        let mut args = base_args();
        args.post_weight = 2;
        args.reply_weight = 3;
        assert!(args.validate().is_err());
    }
}

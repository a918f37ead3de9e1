//! Reward policy: tunable thresholds, the milestone rule, and the meme gate
//!
//! The like reward is liker-centric: the user *giving* likes earns a coin
//! on every Nth like given, counted across posts and replies. An
//! author-centric variant (a coin to the content's author per Nth like
//! received) would fire on the same like events and double-reward them,
//! so only the liker-centric rule exists.

use crate::config::Args;
use crate::types::CafeError;

/// Coin reward tunables, loaded from configuration
#[derive(Debug, Clone)]
pub struct RewardPolicy {
    /// Flat credit for creating a post
    pub post_reward: i64,

    /// Award 1 coin on every Nth reply by the author
    pub reply_divisor: u64,

    /// Award 1 coin on every Nth like given by the liker
    pub like_divisor: u64,

    /// Coin cost of a meme board post (0 disables the cost gate)
    pub meme_cost: i64,

    /// Restrict meme posting to the current top contributor
    pub meme_top_contributor_only: bool,
}

impl RewardPolicy {
    pub fn from_args(args: &Args) -> Self {
        Self {
            post_reward: args.post_reward,
            reply_divisor: args.reply_divisor,
            like_divisor: args.like_divisor,
            meme_cost: args.meme_cost,
            meme_top_contributor_only: args.meme_top_contributor_only,
        }
    }

    /// Bonus for the author's total reply count reaching `total_replies`
    pub fn reply_bonus(&self, total_replies: u64) -> i64 {
        milestone_bonus(total_replies, self.reply_divisor)
    }

    /// Bonus for the liker's total likes-given count reaching `total_likes`
    pub fn like_bonus(&self, total_likes: u64) -> i64 {
        milestone_bonus(total_likes, self.like_divisor)
    }

    /// Decide whether a user may post to a course's meme board.
    ///
    /// Checks run in a fixed order: enrollment, then top-contributor
    /// status, then balance. `enrollment` is `None` when the user has no
    /// enrollment record for the course; `Some(is_top)` carries the
    /// enrollment's top-contributor flag. The balance check only applies
    /// when `meme_cost` is positive.
    pub fn check_meme_gate(
        &self,
        enrollment: Option<bool>,
        coins: i64,
    ) -> Result<(), CafeError> {
        let is_top = match enrollment {
            Some(is_top) => is_top,
            None => {
                return Err(CafeError::Forbidden(
                    "Not enrolled in this course".to_string(),
                ));
            }
        };
        if self.meme_top_contributor_only && !is_top {
            return Err(CafeError::Forbidden(
                "Meme board is reserved for the top contributor".to_string(),
            ));
        }
        if self.meme_cost > 0 && coins < self.meme_cost {
            return Err(CafeError::InsufficientFunds(format!(
                "Meme post costs {} coins, balance is {}",
                self.meme_cost, coins
            )));
        }
        Ok(())
    }
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            post_reward: 1,
            reply_divisor: 2,
            like_divisor: 3,
            meme_cost: 5,
            meme_top_contributor_only: true,
        }
    }
}

/// 1 coin exactly when `count` is a positive multiple of `divisor`.
///
/// The count must be the authoritative stored total *including* the action
/// being rewarded, recomputed inside the same transaction that inserted it.
/// The check is one-directional: crossing a milestone grants a coin, and
/// later deletions (unlikes) never claw it back.
pub fn milestone_bonus(count: u64, divisor: u64) -> i64 {
    if divisor > 0 && count > 0 && count % divisor == 0 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Total bonus coins after `k` consecutive actions with divisor `n`
    fn cumulative_bonus(k: u64, n: u64) -> i64 {
        (1..=k).map(|count| milestone_bonus(count, n)).sum()
    }

    #[test]
    fn test_milestone_bonus_fires_on_exact_multiples() {
        assert_eq!(milestone_bonus(0, 3), 0);
        assert_eq!(milestone_bonus(1, 3), 0);
        assert_eq!(milestone_bonus(2, 3), 0);
        assert_eq!(milestone_bonus(3, 3), 1);
        assert_eq!(milestone_bonus(4, 3), 0);
        assert_eq!(milestone_bonus(6, 3), 1);
    }

    #[test]
    fn test_like_threshold_law() {
        // After exactly k likes given (no unlikes), total bonus = floor(k/N)
        for k in 0..50 {
            assert_eq!(cumulative_bonus(k, 3), (k / 3) as i64, "k={}", k);
        }
    }

    #[test]
    fn test_reply_threshold_law() {
        // After r replies, total reply-bonus coins = floor(r/2)
        for r in 0..50 {
            assert_eq!(cumulative_bonus(r, 2), (r / 2) as i64, "r={}", r);
        }
    }

    #[test]
    fn test_divisor_one_rewards_every_action() {
        for k in 1..10 {
            assert_eq!(milestone_bonus(k, 1), 1);
        }
    }

    #[test]
    fn test_policy_defaults_match_observed_rules() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.reply_bonus(2), 1);
        assert_eq!(policy.reply_bonus(3), 0);
        assert_eq!(policy.like_bonus(3), 1);
        assert_eq!(policy.like_bonus(5), 0);
        assert_eq!(policy.post_reward, 1);
        assert_eq!(policy.meme_cost, 5);
    }

    #[test]
    fn test_meme_gate_allows_funded_top_contributor() {
        let policy = RewardPolicy::default();
        assert!(policy.check_meme_gate(Some(true), 5).is_ok());
        assert!(policy.check_meme_gate(Some(true), 100).is_ok());
    }

    #[test]
    fn test_meme_gate_rejects_unenrolled_user() {
        let policy = RewardPolicy::default();
        assert!(matches!(
            policy.check_meme_gate(None, 1000),
            Err(CafeError::Forbidden(_))
        ));
    }

    #[test]
    fn test_meme_gate_rejects_non_top_contributor() {
        let policy = RewardPolicy::default();
        assert!(matches!(
            policy.check_meme_gate(Some(false), 1000),
            Err(CafeError::Forbidden(_))
        ));
    }

    #[test]
    fn test_meme_gate_insufficient_funds_for_enrolled_top_contributor() {
        // A broke top contributor gets 402, not 403, and no meme is created
        let policy = RewardPolicy::default();
        assert!(matches!(
            policy.check_meme_gate(Some(true), 0),
            Err(CafeError::InsufficientFunds(_))
        ));
        assert!(matches!(
            policy.check_meme_gate(Some(true), 4),
            Err(CafeError::InsufficientFunds(_))
        ));
    }

    #[test]
    fn test_meme_gate_checks_enrollment_before_balance() {
        // An unenrolled user with no coins fails on enrollment, and a
        // non-top contributor with no coins fails on status, before the
        // balance is ever consulted.
        let policy = RewardPolicy::default();
        assert!(matches!(
            policy.check_meme_gate(None, 0),
            Err(CafeError::Forbidden(_))
        ));
        assert!(matches!(
            policy.check_meme_gate(Some(false), 0),
            Err(CafeError::Forbidden(_))
        ));
    }

    #[test]
    fn test_meme_gate_with_contributor_restriction_disabled() {
        let policy = RewardPolicy {
            meme_top_contributor_only: false,
            ..RewardPolicy::default()
        };
        assert!(policy.check_meme_gate(Some(false), 5).is_ok());
        assert!(matches!(
            policy.check_meme_gate(Some(false), 4),
            Err(CafeError::InsufficientFunds(_))
        ));
        // Enrollment is still required even with the restriction off
        assert!(matches!(
            policy.check_meme_gate(None, 5),
            Err(CafeError::Forbidden(_))
        ));
    }

    #[test]
    fn test_meme_gate_free_board_skips_balance() {
        let policy = RewardPolicy {
            meme_cost: 0,
            ..RewardPolicy::default()
        };
        assert!(policy.check_meme_gate(Some(true), 0).is_ok());
    }
}

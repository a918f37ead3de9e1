//! Winner selection over a course's enrollments
//!
//! Pure functions, no store access: the engine loads candidates, this
//! module decides. Scoring weights posts above replies; winners rotate
//! until every active student has won once, then history resets.

use bson::oid::ObjectId;

/// Scoring weights for posts and replies
#[derive(Debug, Clone, Copy)]
pub struct RankingWeights {
    pub post_weight: i64,
    pub reply_weight: i64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            post_weight: 5,
            reply_weight: 3,
        }
    }
}

/// One enrollment's activity snapshot for a course
#[derive(Debug, Clone)]
pub struct Candidate {
    pub enrollment_id: ObjectId,
    pub user_id: ObjectId,
    pub posts: u64,
    pub replies: u64,
    pub has_won_before: bool,
}

impl Candidate {
    /// Active means any activity at all in the course
    pub fn is_active(&self) -> bool {
        self.posts > 0 || self.replies > 0
    }

    pub fn score(&self, weights: RankingWeights) -> i64 {
        self.posts as i64 * weights.post_weight + self.replies as i64 * weights.reply_weight
    }
}

/// The chosen winner for a course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub enrollment_id: ObjectId,
    pub user_id: ObjectId,
    pub score: i64,
    /// True when every active student had already won, so the course's
    /// win history must be cleared before crowning
    pub reset_history: bool,
}

/// Pick the top contributor among a course's enrollments.
///
/// Returns `None` when no enrollment has any activity. Otherwise the
/// highest-scoring active student who has not yet won is selected; if
/// all active students have won, history resets and the top scorer
/// wins again. Ties break toward the earlier candidate in the input.
pub fn select_winner(candidates: &[Candidate], weights: RankingWeights) -> Option<Selection> {
    let mut active: Vec<&Candidate> = candidates.iter().filter(|c| c.is_active()).collect();
    if active.is_empty() {
        return None;
    }

    // Stable sort keeps input order on equal scores
    active.sort_by(|a, b| b.score(weights).cmp(&a.score(weights)));

    if let Some(winner) = active.iter().find(|c| !c.has_won_before) {
        return Some(Selection {
            enrollment_id: winner.enrollment_id,
            user_id: winner.user_id,
            score: winner.score(weights),
            reset_history: false,
        });
    }

    // Rotation exhausted: everyone active has already won
    let winner = active[0];
    Some(Selection {
        enrollment_id: winner.enrollment_id,
        user_id: winner.user_id,
        score: winner.score(weights),
        reset_history: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(posts: u64, replies: u64, has_won_before: bool) -> Candidate {
        Candidate {
            enrollment_id: ObjectId::new(),
            user_id: ObjectId::new(),
            posts,
            replies,
            has_won_before,
        }
    }

    #[test]
    fn test_highest_score_wins() {
        // Alice: 3 posts = 15; Bob: 1 post + 2 replies = 11
        let alice = candidate(3, 0, false);
        let bob = candidate(1, 2, false);
        let selection =
            select_winner(&[alice.clone(), bob], RankingWeights::default()).unwrap();
        assert_eq!(selection.enrollment_id, alice.enrollment_id);
        assert_eq!(selection.score, 15);
        assert!(!selection.reset_history);
    }

    #[test]
    fn test_previous_winner_excluded() {
        // Alice outscores Bob but has already won, so Bob takes the cycle
        let alice = candidate(3, 0, true);
        let bob = candidate(1, 2, false);
        let selection =
            select_winner(&[alice, bob.clone()], RankingWeights::default()).unwrap();
        assert_eq!(selection.enrollment_id, bob.enrollment_id);
        assert_eq!(selection.score, 11);
        assert!(!selection.reset_history);
    }

    #[test]
    fn test_rotation_exhaustion_resets_history() {
        // Both have won: history resets and the top scorer wins again
        let alice = candidate(3, 0, true);
        let bob = candidate(1, 2, true);
        let selection =
            select_winner(&[alice.clone(), bob], RankingWeights::default()).unwrap();
        assert_eq!(selection.enrollment_id, alice.enrollment_id);
        assert!(selection.reset_history);
    }

    #[test]
    fn test_inactive_course_has_no_winner() {
        let idle = candidate(0, 0, false);
        assert!(select_winner(&[idle], RankingWeights::default()).is_none());
    }

    #[test]
    fn test_inactive_students_never_win() {
        // The only eligible non-winner has no activity; the active student
        // has won, so the course hits rotation exhaustion instead
        let idle = candidate(0, 0, false);
        let veteran = candidate(2, 1, true);
        let selection =
            select_winner(&[idle, veteran.clone()], RankingWeights::default()).unwrap();
        assert_eq!(selection.enrollment_id, veteran.enrollment_id);
        assert!(selection.reset_history);
    }

    #[test]
    fn test_full_rotation_cycles_every_active_student() {
        // Static activity: each cycle crowns the best remaining non-winner
        // until everyone has won, then the next cycle resets and repeats.
        let mut candidates = vec![
            candidate(4, 0, false), // 20
            candidate(2, 1, false), // 13
            candidate(0, 2, false), // 6
        ];
        let weights = RankingWeights::default();
        let mut winners = Vec::new();

        for _ in 0..candidates.len() {
            let selection = select_winner(&candidates, weights).unwrap();
            assert!(!selection.reset_history);
            assert!(!winners.contains(&selection.enrollment_id));
            winners.push(selection.enrollment_id);
            for c in candidates.iter_mut() {
                if c.enrollment_id == selection.enrollment_id {
                    c.has_won_before = true;
                }
            }
        }
        assert_eq!(winners.len(), 3);

        // Cycle S+1: exhausted, resets, top scorer wins again
        let selection = select_winner(&candidates, weights).unwrap();
        assert!(selection.reset_history);
        assert_eq!(selection.enrollment_id, winners[0]);
    }

    #[test]
    fn test_tie_breaks_toward_input_order() {
        let first = candidate(1, 0, false);
        let second = candidate(1, 0, false);
        let selection =
            select_winner(&[first.clone(), second], RankingWeights::default()).unwrap();
        assert_eq!(selection.enrollment_id, first.enrollment_id);
    }
}

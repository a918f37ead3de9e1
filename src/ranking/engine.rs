//! Ranking cycle runner
//!
//! One invocation clears every current winner flag, then processes each
//! course in turn: load activity counts, pick a winner, and apply the
//! reset-and-crown inside a per-course transaction so a mid-update
//! failure never leaves two flagged winners in one course.

use bson::{doc, oid::ObjectId};
use mongodb::{ClientSession, Collection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::db::schemas::{
    CourseDoc, EnrollmentDoc, PostDoc, ReplyDoc, COURSE_COLLECTION, ENROLLMENT_COLLECTION,
    POST_COLLECTION, REPLY_COLLECTION,
};
use crate::db::MongoClient;
use crate::ranking::select::{select_winner, Candidate, RankingWeights, Selection};
use crate::types::CafeError;

/// Summary of one ranking cycle
#[derive(Debug, Default, Clone)]
pub struct CycleReport {
    pub courses_processed: u64,
    pub winners_crowned: u64,
    pub courses_failed: u64,
}

/// Contributor ranking engine, invoked by the cron trigger
#[derive(Clone)]
pub struct RankingEngine {
    mongo: MongoClient,
    weights: RankingWeights,
}

impl RankingEngine {
    pub fn new(mongo: MongoClient, weights: RankingWeights) -> Self {
        Self { mongo, weights }
    }

    fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        self.mongo
            .inner()
            .database(self.mongo.db_name())
            .collection::<T>(name)
    }

    /// Run one full ranking cycle across all courses.
    ///
    /// A failure in one course is logged and does not stop the others.
    pub async fn run_cycle(&self) -> Result<CycleReport, CafeError> {
        info!("Ranking cycle started");
        let mut report = CycleReport::default();

        let enrollments = self.collection::<EnrollmentDoc>(ENROLLMENT_COLLECTION);
        let courses = self.collection::<CourseDoc>(COURSE_COLLECTION);

        // Step 1: demote every current winner. Historical flags survive.
        enrollments
            .update_many(
                doc! { "is_top_contributor": true },
                doc! { "$set": { "is_top_contributor": false } },
            )
            .await?;

        let mut cursor = courses.find(doc! {}).await?;
        while cursor.advance().await? {
            let course = cursor.deserialize_current()?;
            let course_id = match course._id {
                Some(id) => id,
                None => continue,
            };
            report.courses_processed += 1;

            match self.rank_course(course_id).await {
                Ok(Some(selection)) => {
                    report.winners_crowned += 1;
                    info!(
                        course = %course.course_code,
                        winner = %selection.user_id,
                        score = selection.score,
                        reset = selection.reset_history,
                        "Top contributor crowned"
                    );
                }
                Ok(None) => {
                    info!(course = %course.course_code, "No activity, no winner this cycle");
                }
                Err(e) => {
                    report.courses_failed += 1;
                    error!(course = %course.course_code, error = %e, "Ranking failed for course, continuing");
                }
            }
        }

        info!(
            courses = report.courses_processed,
            winners = report.winners_crowned,
            failed = report.courses_failed,
            "Ranking cycle finished"
        );
        Ok(report)
    }

    /// Rank one course: gather candidates, select, persist in a transaction
    async fn rank_course(&self, course_id: ObjectId) -> Result<Option<Selection>, CafeError> {
        let candidates = self.load_candidates(course_id).await?;
        let selection = match select_winner(&candidates, self.weights) {
            Some(s) => s,
            None => return Ok(None),
        };

        let mut session = self.mongo.start_session().await?;
        session.start_transaction().await?;

        match self.crown_in_txn(&mut session, course_id, &selection).await {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(Some(selection))
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }

    /// Load every enrollment in the course with per-course activity counts
    async fn load_candidates(&self, course_id: ObjectId) -> Result<Vec<Candidate>, CafeError> {
        let enrollments = self.collection::<EnrollmentDoc>(ENROLLMENT_COLLECTION);
        let posts = self.collection::<PostDoc>(POST_COLLECTION);
        let replies = self.collection::<ReplyDoc>(REPLY_COLLECTION);

        let mut candidates = Vec::new();
        let mut cursor = enrollments.find(doc! { "course_id": course_id }).await?;
        while cursor.advance().await? {
            let enrollment = cursor.deserialize_current()?;
            let enrollment_id = match enrollment._id {
                Some(id) => id,
                None => continue,
            };

            let post_count = posts
                .count_documents(doc! { "user_id": enrollment.user_id, "course_id": course_id })
                .await?;
            let reply_count = replies
                .count_documents(doc! { "user_id": enrollment.user_id, "course_id": course_id })
                .await?;

            candidates.push(Candidate {
                enrollment_id,
                user_id: enrollment.user_id,
                posts: post_count,
                replies: reply_count,
                has_won_before: enrollment.has_won_before,
            });
        }
        Ok(candidates)
    }

    /// Apply the selection: optional history reset, then crown the winner
    async fn crown_in_txn(
        &self,
        session: &mut ClientSession,
        course_id: ObjectId,
        selection: &Selection,
    ) -> Result<(), CafeError> {
        let enrollments = self.collection::<EnrollmentDoc>(ENROLLMENT_COLLECTION);

        if selection.reset_history {
            warn!(course = %course_id, "Rotation exhausted, resetting win history");
            enrollments
                .update_many(
                    doc! { "course_id": course_id },
                    doc! { "$set": { "has_won_before": false } },
                )
                .session(&mut *session)
                .await?;
        }

        let updated = enrollments
            .update_one(
                doc! { "_id": selection.enrollment_id },
                doc! { "$set": { "is_top_contributor": true, "has_won_before": true } },
            )
            .session(&mut *session)
            .await?;
        if updated.matched_count == 0 {
            return Err(CafeError::NotFound("Enrollment disappeared mid-cycle".into()));
        }
        Ok(())
    }
}

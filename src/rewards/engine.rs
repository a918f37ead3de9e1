//! Transactional application of the reward policy
//!
//! Each operation opens a client session, runs the insert plus the
//! authoritative recount plus the conditional coin update inside one
//! transaction, and commits. An abort leaves no partial state: no post
//! without its credit, no debit without its meme.

use bson::{doc, oid::ObjectId};
use mongodb::{ClientSession, Collection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::mongo::is_duplicate_key_error;
use crate::db::schemas::{
    AvatarItemDoc, EnrollmentDoc, LikeDoc, LikeTarget, MemePostDoc, PostDoc, ReplyDoc,
    UserDoc, UserItemDoc, AVATAR_ITEM_COLLECTION, ENROLLMENT_COLLECTION, LIKE_COLLECTION,
    MEME_POST_COLLECTION, POST_COLLECTION, REPLY_COLLECTION, USER_COLLECTION,
    USER_ITEM_COLLECTION,
};
use crate::db::MongoClient;
use crate::rewards::RewardPolicy;
use crate::types::CafeError;

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// True if the target is now liked by the user
    pub liked: bool,
    /// Coins granted to the liker by this toggle
    pub coins_awarded: i64,
}

/// Reward engine: coin accounting for forum activity and purchases
#[derive(Clone)]
pub struct RewardEngine {
    mongo: MongoClient,
    policy: RewardPolicy,
}

impl RewardEngine {
    pub fn new(mongo: MongoClient, policy: RewardPolicy) -> Self {
        Self { mongo, policy }
    }

    pub fn policy(&self) -> &RewardPolicy {
        &self.policy
    }

    /// Raw collection handle for use inside transactions
    fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        self.mongo
            .inner()
            .database(self.mongo.db_name())
            .collection::<T>(name)
    }

    /// Create a post and credit the author, all-or-nothing
    pub async fn create_post(
        &self,
        user_id: ObjectId,
        course_id: ObjectId,
        content: String,
    ) -> Result<PostDoc, CafeError> {
        let mut session = self.mongo.start_session().await?;
        session.start_transaction().await?;

        match self
            .create_post_in_txn(&mut session, user_id, course_id, content)
            .await
        {
            Ok(post) => {
                session.commit_transaction().await?;
                Ok(post)
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }

    async fn create_post_in_txn(
        &self,
        session: &mut ClientSession,
        user_id: ObjectId,
        course_id: ObjectId,
        content: String,
    ) -> Result<PostDoc, CafeError> {
        let posts = self.collection::<PostDoc>(POST_COLLECTION);
        let users = self.collection::<UserDoc>(USER_COLLECTION);

        let mut post = PostDoc::new(user_id, course_id, content);
        let inserted = posts.insert_one(&post).session(&mut *session).await?;
        post._id = inserted.inserted_id.as_object_id();

        if self.policy.post_reward > 0 {
            let updated = users
                .update_one(
                    doc! { "_id": user_id },
                    doc! { "$inc": { "coins": self.policy.post_reward } },
                )
                .session(&mut *session)
                .await?;
            if updated.matched_count == 0 {
                return Err(CafeError::NotFound("User not found".into()));
            }
        }

        debug!(user = %user_id, course = %course_id, "Post created, author credited");
        Ok(post)
    }

    /// Create a reply; award a coin when the author's total reply count
    /// hits a multiple of the configured divisor. The count comes from the
    /// store inside the transaction, never from the client.
    pub async fn create_reply(
        &self,
        user_id: ObjectId,
        post_id: ObjectId,
        parent_id: Option<ObjectId>,
        content: String,
    ) -> Result<ReplyDoc, CafeError> {
        let mut session = self.mongo.start_session().await?;
        session.start_transaction().await?;

        match self
            .create_reply_in_txn(&mut session, user_id, post_id, parent_id, content)
            .await
        {
            Ok(reply) => {
                session.commit_transaction().await?;
                Ok(reply)
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }

    async fn create_reply_in_txn(
        &self,
        session: &mut ClientSession,
        user_id: ObjectId,
        post_id: ObjectId,
        parent_id: Option<ObjectId>,
        content: String,
    ) -> Result<ReplyDoc, CafeError> {
        let posts = self.collection::<PostDoc>(POST_COLLECTION);
        let replies = self.collection::<ReplyDoc>(REPLY_COLLECTION);
        let users = self.collection::<UserDoc>(USER_COLLECTION);

        let post = posts
            .find_one(doc! { "_id": post_id })
            .session(&mut *session)
            .await?
            .ok_or_else(|| CafeError::NotFound("Post not found".into()))?;

        if let Some(parent) = parent_id {
            let parent_exists = replies
                .find_one(doc! { "_id": parent, "post_id": post_id })
                .session(&mut *session)
                .await?
                .is_some();
            if !parent_exists {
                return Err(CafeError::NotFound("Parent reply not found".into()));
            }
        }

        let mut reply = ReplyDoc::new(user_id, post_id, post.course_id, parent_id, content);
        let inserted = replies.insert_one(&reply).session(&mut *session).await?;
        reply._id = inserted.inserted_id.as_object_id();

        // Recount including the reply just inserted
        let reply_count = replies
            .count_documents(doc! { "user_id": user_id })
            .session(&mut *session)
            .await?;

        let bonus = self.policy.reply_bonus(reply_count);
        if bonus > 0 {
            users
                .update_one(
                    doc! { "_id": user_id },
                    doc! { "$inc": { "coins": bonus } },
                )
                .session(&mut *session)
                .await?;
            info!(user = %user_id, reply_count, "Reply milestone reached, coin awarded");
        }

        Ok(reply)
    }

    /// Toggle a like on a post or reply.
    ///
    /// Unliking only removes the like row; coins granted by earlier
    /// milestones are kept. A duplicate-insert race is treated as
    /// already-liked rather than an error.
    pub async fn toggle_like(
        &self,
        user_id: ObjectId,
        target: LikeTarget,
    ) -> Result<ToggleOutcome, CafeError> {
        let mut session = self.mongo.start_session().await?;
        session.start_transaction().await?;

        match self.toggle_like_in_txn(&mut session, user_id, target).await {
            Ok(outcome) => {
                session.commit_transaction().await?;
                Ok(outcome)
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                // Concurrent like from the same user: idempotent, already liked
                if matches!(e, CafeError::Conflict(_)) {
                    return Ok(ToggleOutcome {
                        liked: true,
                        coins_awarded: 0,
                    });
                }
                Err(e)
            }
        }
    }

    async fn toggle_like_in_txn(
        &self,
        session: &mut ClientSession,
        user_id: ObjectId,
        target: LikeTarget,
    ) -> Result<ToggleOutcome, CafeError> {
        let likes = self.collection::<LikeDoc>(LIKE_COLLECTION);
        let users = self.collection::<UserDoc>(USER_COLLECTION);

        // Target must exist
        match target {
            LikeTarget::Post(id) => {
                let posts = self.collection::<PostDoc>(POST_COLLECTION);
                posts
                    .find_one(doc! { "_id": id })
                    .session(&mut *session)
                    .await?
                    .ok_or_else(|| CafeError::NotFound("Post not found".into()))?;
            }
            LikeTarget::Reply(id) => {
                let replies = self.collection::<ReplyDoc>(REPLY_COLLECTION);
                replies
                    .find_one(doc! { "_id": id })
                    .session(&mut *session)
                    .await?
                    .ok_or_else(|| CafeError::NotFound("Reply not found".into()))?;
            }
        }

        let filter = target.filter_for(user_id);
        let existing = likes
            .find_one(filter.clone())
            .session(&mut *session)
            .await?;

        if existing.is_some() {
            // Unlike: remove the row, keep any coins already granted
            likes.delete_one(filter).session(&mut *session).await?;
            return Ok(ToggleOutcome {
                liked: false,
                coins_awarded: 0,
            });
        }

        let like = LikeDoc::new(user_id, target);
        if let Err(e) = likes.insert_one(&like).session(&mut *session).await {
            if is_duplicate_key_error(&e) {
                return Err(CafeError::Conflict("Already liked".into()));
            }
            return Err(e.into());
        }

        // Liker-centric policy: count likes given across posts and replies
        let likes_given = likes
            .count_documents(doc! { "user_id": user_id })
            .session(&mut *session)
            .await?;

        let bonus = self.policy.like_bonus(likes_given);
        if bonus > 0 {
            users
                .update_one(
                    doc! { "_id": user_id },
                    doc! { "$inc": { "coins": bonus } },
                )
                .session(&mut *session)
                .await?;
            info!(user = %user_id, likes_given, "Like milestone reached, coin awarded");
        }

        Ok(ToggleOutcome {
            liked: true,
            coins_awarded: bonus,
        })
    }

    /// Post to the meme board: caller must be enrolled, (optionally) be the
    /// course's current top contributor, and afford the configured cost.
    /// Debit and insert happen in one transaction; failure leaves no
    /// partial state.
    pub async fn post_meme(
        &self,
        user_id: ObjectId,
        course_id: ObjectId,
        image_url: String,
    ) -> Result<MemePostDoc, CafeError> {
        let mut session = self.mongo.start_session().await?;
        session.start_transaction().await?;

        match self
            .post_meme_in_txn(&mut session, user_id, course_id, image_url)
            .await
        {
            Ok(meme) => {
                session.commit_transaction().await?;
                Ok(meme)
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }

    async fn post_meme_in_txn(
        &self,
        session: &mut ClientSession,
        user_id: ObjectId,
        course_id: ObjectId,
        image_url: String,
    ) -> Result<MemePostDoc, CafeError> {
        let enrollments = self.collection::<EnrollmentDoc>(ENROLLMENT_COLLECTION);
        let users = self.collection::<UserDoc>(USER_COLLECTION);
        let memes = self.collection::<MemePostDoc>(MEME_POST_COLLECTION);

        let enrollment = enrollments
            .find_one(doc! { "user_id": user_id, "course_id": course_id })
            .session(&mut *session)
            .await?;

        let user = users
            .find_one(doc! { "_id": user_id })
            .session(&mut *session)
            .await?
            .ok_or_else(|| CafeError::NotFound("User not found".into()))?;

        self.policy.check_meme_gate(
            enrollment.map(|e| e.is_top_contributor),
            user.coins,
        )?;

        let cost = self.policy.meme_cost;
        if cost > 0 {
            // Guarded decrement: the filter re-checks sufficiency so the
            // balance cannot go negative under concurrent debits
            let debited = users
                .update_one(
                    doc! { "_id": user_id, "coins": { "$gte": cost } },
                    doc! { "$inc": { "coins": -cost } },
                )
                .session(&mut *session)
                .await?;
            if debited.modified_count == 0 {
                return Err(CafeError::InsufficientFunds(format!(
                    "Posting costs {} coins",
                    cost
                )));
            }
        }

        let mut meme = MemePostDoc::new(user_id, course_id, image_url);
        let inserted = memes.insert_one(&meme).session(&mut *session).await?;
        meme._id = inserted.inserted_id.as_object_id();

        info!(user = %user_id, course = %course_id, cost, "Meme posted");
        Ok(meme)
    }

    /// Buy an avatar item: ownership check, balance guard, debit, grant.
    /// Returns the new balance.
    pub async fn buy_item(&self, user_id: ObjectId, item_id: ObjectId) -> Result<i64, CafeError> {
        let mut session = self.mongo.start_session().await?;
        session.start_transaction().await?;

        match self.buy_item_in_txn(&mut session, user_id, item_id).await {
            Ok(balance) => {
                session.commit_transaction().await?;
                Ok(balance)
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }

    async fn buy_item_in_txn(
        &self,
        session: &mut ClientSession,
        user_id: ObjectId,
        item_id: ObjectId,
    ) -> Result<i64, CafeError> {
        let items = self.collection::<AvatarItemDoc>(AVATAR_ITEM_COLLECTION);
        let user_items = self.collection::<UserItemDoc>(USER_ITEM_COLLECTION);
        let users = self.collection::<UserDoc>(USER_COLLECTION);

        let item = items
            .find_one(doc! { "_id": item_id })
            .session(&mut *session)
            .await?
            .ok_or_else(|| CafeError::NotFound("Item not found".into()))?;

        let already_owned = user_items
            .find_one(doc! { "user_id": user_id, "item_id": item_id })
            .session(&mut *session)
            .await?
            .is_some();
        if already_owned {
            return Err(CafeError::Conflict("You already own this item".into()));
        }

        let user = users
            .find_one(doc! { "_id": user_id })
            .session(&mut *session)
            .await?
            .ok_or_else(|| CafeError::NotFound("User not found".into()))?;

        if user.coins < item.price {
            return Err(CafeError::InsufficientFunds(format!(
                "{} costs {} coins, you have {}",
                item.name, item.price, user.coins
            )));
        }

        let debited = users
            .update_one(
                doc! { "_id": user_id, "coins": { "$gte": item.price } },
                doc! { "$inc": { "coins": -item.price } },
            )
            .session(&mut *session)
            .await?;
        if debited.modified_count == 0 {
            return Err(CafeError::InsufficientFunds(format!(
                "{} costs {} coins",
                item.name, item.price
            )));
        }

        let grant = UserItemDoc::new(user_id, item_id);
        if let Err(e) = user_items.insert_one(&grant).session(&mut *session).await {
            if is_duplicate_key_error(&e) {
                return Err(CafeError::Conflict("You already own this item".into()));
            }
            return Err(e.into());
        }

        info!(user = %user_id, item = %item.name, price = item.price, "Item purchased");
        Ok(user.coins - item.price)
    }
}

//! Database schemas for ClassCafe
//!
//! Defines MongoDB document structures for users, courses, enrollments,
//! forum content, likes, memes, and avatar shop items.

mod avatar_item;
mod course;
mod enrollment;
mod like;
mod meme;
mod metadata;
mod post;
mod reply;
mod user;

pub use avatar_item::{
    AvatarItemDoc, UserItemDoc, AVATAR_ITEM_COLLECTION, USER_ITEM_COLLECTION,
};
pub use course::{CourseDoc, COURSE_COLLECTION};
pub use enrollment::{EnrollmentDoc, ENROLLMENT_COLLECTION};
pub use like::{LikeDoc, LikeTarget, LIKE_COLLECTION};
pub use meme::{MemePostDoc, MEME_POST_COLLECTION};
pub use metadata::Metadata;
pub use post::{PostDoc, POST_COLLECTION};
pub use reply::{ReplyDoc, REPLY_COLLECTION};
pub use user::{UserDoc, UserRole, USER_COLLECTION};

//! HTTP routes for avatars and the item shop
//!
//! - GET  /avatar/me            - Avatar config and owned items
//! - PUT  /avatar/me            - Save the avatar config
//! - GET  /avatar/shop          - List purchasable items
//! - POST /avatar/shop/{id}/buy - Buy an item (debits coins)

use bson::{doc, oid::ObjectId, Bson, Document};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::authenticate;
use crate::db::schemas::{
    AvatarItemDoc, UserDoc, UserItemDoc, AVATAR_ITEM_COLLECTION, USER_COLLECTION,
    USER_ITEM_COLLECTION,
};
use crate::routes::{
    cors_preflight, json_response, method_not_allowed, not_found, parse_json_body,
    parse_object_id, respond, BoxBody, SuccessResponse,
};
use crate::server::AppState;
use crate::types::CafeError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAvatarRequest {
    pub avatar_config: Document,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarView {
    pub avatar_config: Document,
    pub coins: i64,
    pub owned_items: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub item_id: String,
    pub name: String,
    pub category: String,
    pub price: i64,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseView {
    pub item_id: String,
    pub balance: i64,
}

impl ItemView {
    fn from_doc(doc: &AvatarItemDoc) -> Self {
        Self {
            item_id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            name: doc.name.clone(),
            category: doc.category.clone(),
            price: doc.price,
            image_url: doc.image_url.clone(),
        }
    }
}

/// GET /avatar/me
async fn handle_me(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let user = users
        .find_one(doc! { "_id": identity.user_id })
        .await?
        .ok_or_else(|| CafeError::NotFound("User not found".into()))?;

    let user_items = state
        .mongo
        .collection::<UserItemDoc>(USER_ITEM_COLLECTION)
        .await?;
    let owned = user_items
        .find_many(doc! { "user_id": identity.user_id })
        .await?;

    let item_ids: Vec<Bson> = owned.iter().map(|ui| Bson::ObjectId(ui.item_id)).collect();
    let items = state
        .mongo
        .collection::<AvatarItemDoc>(AVATAR_ITEM_COLLECTION)
        .await?;
    let found = items.find_many(doc! { "_id": { "$in": item_ids } }).await?;

    Ok(json_response(
        StatusCode::OK,
        &AvatarView {
            avatar_config: user.avatar_config,
            coins: user.coins,
            owned_items: found.iter().map(ItemView::from_doc).collect(),
        },
    ))
}

/// PUT /avatar/me
async fn handle_save(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;
    let body: SaveAvatarRequest = parse_json_body(req).await?;

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let updated = users
        .update_one(
            doc! { "_id": identity.user_id },
            doc! { "$set": { "avatar_config": body.avatar_config } },
        )
        .await?;
    if updated.matched_count == 0 {
        return Err(CafeError::NotFound("User not found".into()));
    }

    Ok(json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Avatar saved".into(),
        },
    ))
}

/// GET /avatar/shop
async fn handle_shop(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>, CafeError> {
    authenticate(&req, &state.jwt)?;

    let items = state
        .mongo
        .collection::<AvatarItemDoc>(AVATAR_ITEM_COLLECTION)
        .await?;
    let found = items
        .find_sorted(doc! {}, Some(doc! { "category": 1, "price": 1 }), None)
        .await?;

    let views: Vec<ItemView> = found.iter().map(ItemView::from_doc).collect();
    Ok(json_response(StatusCode::OK, &views))
}

/// POST /avatar/shop/{id}/buy
async fn handle_buy(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    item_id: ObjectId,
) -> Result<Response<BoxBody>, CafeError> {
    let identity = authenticate(&req, &state.jwt)?;

    let balance = state.rewards.buy_item(identity.user_id, item_id).await?;
    info!(user = %identity.user_id, item = %item_id, balance, "Item purchased");

    Ok(json_response(
        StatusCode::OK,
        &PurchaseView {
            item_id: item_id.to_hex(),
            balance,
        },
    ))
}

/// Handle /avatar/* requests.
///
/// Returns Some(response) if the request was handled, None otherwise.
pub async fn handle_avatar_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !path.starts_with("/avatar") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let segments: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .map(|s| s.to_string())
        .collect();

    let response = match (method, segments.as_slice()) {
        (Method::GET, [a, b]) if a == "avatar" && b == "me" => respond(handle_me(req, state).await),
        (Method::PUT, [a, b]) if a == "avatar" && b == "me" => {
            respond(handle_save(req, state).await)
        }
        (Method::GET, [a, b]) if a == "avatar" && b == "shop" => {
            respond(handle_shop(req, state).await)
        }
        (Method::POST, [a, b, id, c]) if a == "avatar" && b == "shop" && c == "buy" => {
            match parse_object_id(id) {
                Ok(item_id) => respond(handle_buy(req, state, item_id).await),
                Err(e) => crate::routes::error_response(&e),
            }
        }
        (_, [a, b]) if a == "avatar" && (b == "me" || b == "shop") => method_not_allowed(),
        (_, [a, b, _, c]) if a == "avatar" && b == "shop" && c == "buy" => method_not_allowed(),
        _ => not_found(&path),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_avatar_request_accepts_opaque_config() {
        let json = r##"{"avatarConfig":{"hat":"wizard","color":"#aabbcc"}}"##;
        let req: SaveAvatarRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            req.avatar_config.get_str("hat").unwrap(),
            "wizard"
        );
    }
}

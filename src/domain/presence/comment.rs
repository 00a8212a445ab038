//! Comment record as handed over by the comment-management subsystem.
//!
//! Field names follow the document store's JSON shape (`_id`, `post`,
//! `user`, `createdAt`) so clients render broadcast comments exactly as they
//! render comments fetched over HTTP. Fields the store adds that the
//! presence layer has no use for (`__v`, reaction counts, ...) are carried
//! through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{CommentId, PostId, Timestamp, UserId};

/// Author summary embedded in a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
}

/// A durably stored comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    #[serde(rename = "_id")]
    pub id: CommentId,
    /// The post the comment belongs to; also the room it is broadcast to.
    pub post: PostId,
    pub user: CommentAuthor,
    pub content: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// Every other stored field, forwarded as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_document_store_shape() {
        let value = json!({
            "_id": "c1",
            "post": "p1",
            "user": {"_id": "u1", "username": "berry"},
            "content": "Nice post",
            "createdAt": "2025-01-10T00:00:00Z"
        });
        let record: CommentRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.id.as_str(), "c1");
        assert_eq!(record.post.as_str(), "p1");
        assert_eq!(record.user.username, "berry");
        assert!(record.updated_at.is_none());
    }

    #[test]
    fn serializes_with_underscore_id_and_camel_case() {
        let record = CommentRecord {
            id: CommentId::new("c1").unwrap(),
            post: PostId::new("p1").unwrap(),
            user: CommentAuthor {
                id: UserId::new("u1").unwrap(),
                username: "berry".to_string(),
            },
            content: "hi".to_string(),
            created_at: Timestamp::now(),
            updated_at: None,
            extra: Map::new(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], "c1");
        assert_eq!(value["user"]["_id"], "u1");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn stored_record_is_forwarded_unchanged() {
        let stored = json!({
            "_id": "c1",
            "post": "p1",
            "user": {"_id": "u1", "username": "berry"},
            "content": "Nice post",
            "createdAt": "2025-01-10T12:34:56.789Z",
            "updatedAt": "2025-01-10T12:35:00.000Z",
            "__v": 0
        });

        let record: CommentRecord = serde_json::from_value(stored.clone()).unwrap();

        assert_eq!(record.extra.get("__v"), Some(&json!(0)));
        assert_eq!(serde_json::to_value(&record).unwrap(), stored);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_by_id: Uuid,
    pub edited_by_id: Option<Uuid>,
    pub approved_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// New posts always start as drafts; only an explicit publish by an
    /// admin flips `published`.
    pub fn new(created_by_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            published: false,
            created_by_id,
            edited_by_id: None,
            approved_by_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Display name of the post creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRef {
    pub name: String,
}

/// Name and email of an editor or approver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorRef {
    pub name: String,
    pub email: String,
}

/// A post joined with the display identities behind its foreign keys, the
/// shape read endpoints return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithAuthors {
    #[serde(flatten)]
    pub post: Post,
    pub created_by: AuthorRef,
    pub edited_by: Option<EditorRef>,
    pub approved_by: Option<EditorRef>,
}

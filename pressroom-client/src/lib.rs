//! Typed HTTP client for the pressroom API.

mod error;

pub use error::ClientError;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

const TOKEN_FILE: &str = ".pressroom_token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorRef {
    pub name: String,
    pub email: String,
}

/// A post as the read endpoints return it: record fields plus the display
/// identities of creator, editor, and approver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_by_id: Uuid,
    pub edited_by_id: Option<Uuid>,
    pub approved_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: AuthorRef,
    pub edited_by: Option<EditorRef>,
    pub approved_by: Option<EditorRef>,
}

/// A post as mutation endpoints return it, without joined identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct PressroomClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    token_path: PathBuf,
}

impl PressroomClient {
    pub fn connect(endpoint: &str) -> Result<Self, ClientError> {
        let base_url = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            token: None,
            token_path: PathBuf::from(TOKEN_FILE),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn set_token(&mut self, token: String) -> Result<(), ClientError> {
        std::fs::write(&self.token_path, &token)?;
        self.token = Some(token);
        Ok(())
    }

    /// Token from memory, falling back to the file a previous login wrote.
    fn token(&self) -> Result<String, ClientError> {
        match &self.token {
            Some(t) if !t.is_empty() => Ok(t.clone()),
            _ => {
                let t = std::fs::read_to_string(&self.token_path)
                    .map_err(|_| ClientError::Unauthorized)?;
                Ok(t.trim().to_string())
            }
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        Ok(builder.bearer_auth(self.token()?))
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;
        let auth: AuthResponse = parse(res).await?;
        self.set_token(auth.access_token)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let auth: AuthResponse = parse(res).await?;
        self.set_token(auth.access_token)
    }

    pub async fn get_post(&self, id: Uuid) -> Result<PostView, ClientError> {
        let res = self
            .client
            .get(self.url(&format!("/posts/{}", id)))
            .send()
            .await?;
        parse(res).await
    }

    pub async fn list_posts(&self) -> Result<Vec<PostView>, ClientError> {
        let res = self.client.get(self.url("/posts")).send().await?;
        parse(res).await
    }

    pub async fn create_post(&self, title: &str, content: &str) -> Result<Post, ClientError> {
        let builder = self
            .client
            .post(self.url("/posts"))
            .json(&serde_json::json!({ "title": title, "content": content }));
        let res = self.authorized(builder)?.send().await?;
        parse(res).await
    }

    pub async fn update_post(
        &self,
        id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Post, ClientError> {
        let builder = self
            .client
            .put(self.url(&format!("/posts/{}", id)))
            .json(&serde_json::json!({ "title": title, "content": content }));
        let res = self.authorized(builder)?.send().await?;
        parse(res).await
    }

    pub async fn approve_post(&self, id: Uuid) -> Result<Post, ClientError> {
        let builder = self.client.post(self.url(&format!("/posts/{}/approve", id)));
        let res = self.authorized(builder)?.send().await?;
        parse(res).await
    }

    pub async fn publish_post(&self, id: Uuid) -> Result<Post, ClientError> {
        let builder = self.client.post(self.url(&format!("/posts/{}/publish", id)));
        let res = self.authorized(builder)?.send().await?;
        parse(res).await
    }

    pub async fn unpublish_post(&self, id: Uuid) -> Result<Post, ClientError> {
        let builder = self
            .client
            .post(self.url(&format!("/posts/{}/unpublish", id)));
        let res = self.authorized(builder)?.send().await?;
        parse(res).await
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), ClientError> {
        let builder = self.client.delete(self.url(&format!("/posts/{}", id)));
        let res = self.authorized(builder)?.send().await?;
        if res.status().is_success() {
            Ok(())
        } else {
            Err(error_from(res).await)
        }
    }

    pub async fn add_comment(&self, post_id: Uuid, content: &str) -> Result<Comment, ClientError> {
        let builder = self
            .client
            .post(self.url(&format!("/posts/{}/comments", post_id)))
            .json(&serde_json::json!({ "content": content }));
        let res = self.authorized(builder)?.send().await?;
        parse(res).await
    }

    pub async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentView>, ClientError> {
        let res = self
            .client
            .get(self.url(&format!("/posts/{}/comments", post_id)))
            .send()
            .await?;
        parse(res).await
    }
}

async fn parse<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    if res.status().is_success() {
        Ok(res.json().await?)
    } else {
        Err(error_from(res).await)
    }
}

async fn error_from(res: Response) -> ClientError {
    let status = res.status();
    let message = match res.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    match status.as_u16() {
        400 => ClientError::Validation(message),
        401 => ClientError::Unauthorized,
        403 => ClientError::Forbidden,
        404 => ClientError::NotFound,
        s => ClientError::Api { status: s, message },
    }
}

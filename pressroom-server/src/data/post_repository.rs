use crate::domain::error::DomainError;
use crate::domain::post::{AuthorRef, EditorRef, Post, PostWithAuthors};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError>;
    async fn find_with_authors(&self, id: Uuid) -> Result<Option<PostWithAuthors>, DomainError>;
    /// All posts with their author references, newest first.
    async fn list_with_authors(&self) -> Result<Vec<PostWithAuthors>, DomainError>;
    async fn update_content(
        &self,
        id: Uuid,
        editor_id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<Post>, DomainError>;
    async fn set_approved_by(
        &self,
        id: Uuid,
        approver_id: Uuid,
    ) -> Result<Option<Post>, DomainError>;
    async fn set_published(&self, id: Uuid, published: bool) -> Result<Option<Post>, DomainError>;
    /// Deletes the post and every comment referencing it in one
    /// transaction. Returns false when the post does not exist; in that
    /// case nothing is committed.
    async fn delete_with_comments(&self, id: Uuid) -> Result<bool, DomainError>;
}

/// Flat row shape for the three-way users join; folded into
/// `PostWithAuthors` before it leaves the repository.
#[derive(sqlx::FromRow)]
struct PostAuthorsRow {
    id: Uuid,
    title: String,
    content: String,
    published: bool,
    created_by_id: Uuid,
    edited_by_id: Option<Uuid>,
    approved_by_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by_name: String,
    edited_by_name: Option<String>,
    edited_by_email: Option<String>,
    approved_by_name: Option<String>,
    approved_by_email: Option<String>,
}

impl From<PostAuthorsRow> for PostWithAuthors {
    fn from(row: PostAuthorsRow) -> Self {
        let edited_by = match (row.edited_by_name, row.edited_by_email) {
            (Some(name), Some(email)) => Some(EditorRef { name, email }),
            _ => None,
        };
        let approved_by = match (row.approved_by_name, row.approved_by_email) {
            (Some(name), Some(email)) => Some(EditorRef { name, email }),
            _ => None,
        };
        PostWithAuthors {
            post: Post {
                id: row.id,
                title: row.title,
                content: row.content,
                published: row.published,
                created_by_id: row.created_by_id,
                edited_by_id: row.edited_by_id,
                approved_by_id: row.approved_by_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            created_by: AuthorRef {
                name: row.created_by_name,
            },
            edited_by,
            approved_by,
        }
    }
}

const POST_AUTHORS_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.content, p.published,
        p.created_by_id, p.edited_by_id, p.approved_by_id,
        p.created_at, p.updated_at,
        c.name AS created_by_name,
        e.name AS edited_by_name, e.email AS edited_by_email,
        a.name AS approved_by_name, a.email AS approved_by_email
    FROM posts p
    JOIN users c ON c.id = p.created_by_id
    LEFT JOIN users e ON e.id = p.edited_by_id
    LEFT JOIN users a ON a.id = p.approved_by_id
"#;

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, content, published, created_by_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.published)
        .bind(post.created_by_id)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Storage(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, created_by = %post.created_by_id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, content, published, created_by_id, edited_by_id,
                   approved_by_id, created_at, updated_at
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })
    }

    async fn find_with_authors(&self, id: Uuid) -> Result<Option<PostWithAuthors>, DomainError> {
        let query = format!("{} WHERE p.id = $1", POST_AUTHORS_SELECT);
        let row = sqlx::query_as::<_, PostAuthorsRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_with_authors {}: {}", id, e);
                DomainError::Storage(e.to_string())
            })?;

        Ok(row.map(PostWithAuthors::from))
    }

    async fn list_with_authors(&self) -> Result<Vec<PostWithAuthors>, DomainError> {
        let query = format!("{} ORDER BY p.created_at DESC", POST_AUTHORS_SELECT);
        let rows = sqlx::query_as::<_, PostAuthorsRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while listing posts: {}", e);
                DomainError::Storage(e.to_string())
            })?;

        Ok(rows.into_iter().map(PostWithAuthors::from).collect())
    }

    async fn update_content(
        &self,
        id: Uuid,
        editor_id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $1, content = $2, edited_by_id = $3, updated_at = $4
            WHERE id = $5
            RETURNING id, title, content, published, created_by_id, edited_by_id,
                      approved_by_id, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(editor_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })?;

        if post.is_some() {
            info!(post_id = %id, edited_by = %editor_id, "post updated");
        }

        Ok(post)
    }

    async fn set_approved_by(
        &self,
        id: Uuid,
        approver_id: Uuid,
    ) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET approved_by_id = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, title, content, published, created_by_id, edited_by_id,
                      approved_by_id, created_at, updated_at
            "#,
        )
        .bind(approver_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to approve post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })?;

        if post.is_some() {
            info!(post_id = %id, approved_by = %approver_id, "post approved");
        }

        Ok(post)
    }

    async fn set_published(&self, id: Uuid, published: bool) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET published = $1, updated_at = $2
            WHERE id = $3
            RETURNING id, title, content, published, created_by_id, edited_by_id,
                      approved_by_id, created_at, updated_at
            "#,
        )
        .bind(published)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to set published on post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })?;

        if post.is_some() {
            info!(post_id = %id, published, "post visibility changed");
        }

        Ok(post)
    }

    async fn delete_with_comments(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("failed to begin delete transaction for {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })?;

        // Comments first, the post's FK targets would block otherwise.
        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("failed to delete comments of post {}: {}", id, e);
                DomainError::Storage(e.to_string())
            })?;

        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("failed to delete post {}: {}", id, e);
                DomainError::Storage(e.to_string())
            })?;

        if deleted.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DomainError::Storage(e.to_string()))?;
            return Ok(false);
        }

        tx.commit().await.map_err(|e| {
            error!("failed to commit delete of post {}: {}", id, e);
            DomainError::Storage(e.to_string())
        })?;

        info!(post_id = %id, "post and comments deleted");
        Ok(true)
    }
}

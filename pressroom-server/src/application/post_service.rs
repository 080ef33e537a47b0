use std::sync::Arc;

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, CommentWithAuthor};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostWithAuthors};
use crate::domain::user::Caller;
use crate::presentation::dto::{CreateCommentRequest, CreatePostRequest, UpdatePostRequest};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

/// The post lifecycle: create, read, edit, approve, publish, delete, and
/// comments. Every mutation takes the caller explicitly and checks its
/// role before touching storage, so a denied call has no side effects.
#[derive(Clone)]
pub struct PostService<P: PostRepository + 'static, C: CommentRepository + 'static> {
    posts: Arc<P>,
    comments: Arc<C>,
}

impl<P, C> PostService<P, C>
where
    P: PostRepository + 'static,
    C: CommentRepository + 'static,
{
    pub fn new(posts: Arc<P>, comments: Arc<C>) -> Self {
        Self { posts, comments }
    }

    pub async fn get_post(&self, id: Uuid) -> Result<PostWithAuthors, DomainError> {
        self.posts
            .find_with_authors(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn get_posts(&self) -> Result<Vec<PostWithAuthors>, DomainError> {
        self.posts.list_with_authors().await
    }

    #[instrument(skip(self, input))]
    pub async fn create_post(
        &self,
        caller: Caller,
        input: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        input.validate()?;
        let post = Post::new(caller.id, input.title, input.content);
        self.posts.create(post).await
    }

    /// Open to any authenticated caller, not only the creator. Stamps the
    /// caller as last editor; the published flag is untouched.
    #[instrument(skip(self, input))]
    pub async fn update_post(
        &self,
        caller: Caller,
        post_id: Uuid,
        input: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        input.validate()?;
        self.posts
            .update_content(post_id, caller.id, input.title, input.content)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    /// Editorial sign-off. Independent of the published flag: a WRITER can
    /// approve a post it can never publish.
    #[instrument(skip(self))]
    pub async fn approve_post(&self, caller: Caller, post_id: Uuid) -> Result<Post, DomainError> {
        if !caller.role.can_approve() {
            return Err(DomainError::Forbidden);
        }
        self.posts
            .set_approved_by(post_id, caller.id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    #[instrument(skip(self))]
    pub async fn publish_post(&self, caller: Caller, post_id: Uuid) -> Result<Post, DomainError> {
        if !caller.role.can_publish() {
            return Err(DomainError::Forbidden);
        }
        self.posts
            .set_published(post_id, true)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    #[instrument(skip(self))]
    pub async fn unpublish_post(&self, caller: Caller, post_id: Uuid) -> Result<Post, DomainError> {
        if !caller.role.can_publish() {
            return Err(DomainError::Forbidden);
        }
        self.posts
            .set_published(post_id, false)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, caller: Caller, post_id: Uuid) -> Result<(), DomainError> {
        if !caller.role.can_delete() {
            return Err(DomainError::Forbidden);
        }
        if self.posts.delete_with_comments(post_id).await? {
            Ok(())
        } else {
            Err(DomainError::PostNotFound(post_id))
        }
    }

    #[instrument(skip(self, input))]
    pub async fn add_comment(
        &self,
        caller: Caller,
        post_id: Uuid,
        input: CreateCommentRequest,
    ) -> Result<Comment, DomainError> {
        input.validate()?;
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::PostNotFound(post_id));
        }
        let comment = Comment::new(post_id, caller.id, input.content);
        self.comments.create(comment).await
    }

    pub async fn get_comments(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, DomainError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::PostNotFound(post_id));
        }
        self.comments.list_for_post(post_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::post::{AuthorRef, EditorRef};
    use crate::domain::user::Role;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-process stand-in for the Postgres repositories. `fail_delete`
    /// makes `delete_with_comments` fail after the comments are gone but
    /// before the post is, and undo the comment delete, which is what a
    /// rolled-back transaction looks like from outside.
    #[derive(Default)]
    struct MemoryStore {
        posts: Mutex<Vec<Post>>,
        comments: Mutex<Vec<Comment>>,
        users: Mutex<HashMap<Uuid, (String, String)>>,
        fail_delete: AtomicBool,
    }

    impl MemoryStore {
        fn add_user(&self, id: Uuid, name: &str, email: &str) {
            self.users
                .lock()
                .unwrap()
                .insert(id, (name.to_string(), email.to_string()));
        }

        fn with_authors(&self, post: &Post) -> PostWithAuthors {
            let users = self.users.lock().unwrap();
            let lookup = |id: Uuid| {
                users
                    .get(&id)
                    .map(|(name, email)| EditorRef {
                        name: name.clone(),
                        email: email.clone(),
                    })
            };
            PostWithAuthors {
                post: post.clone(),
                created_by: AuthorRef {
                    name: users
                        .get(&post.created_by_id)
                        .map(|(name, _)| name.clone())
                        .unwrap_or_else(|| "unknown".into()),
                },
                edited_by: post.edited_by_id.and_then(&lookup),
                approved_by: post.approved_by_id.and_then(&lookup),
            }
        }
    }

    #[async_trait]
    impl PostRepository for MemoryStore {
        async fn create(&self, post: Post) -> Result<Post, DomainError> {
            self.posts.lock().unwrap().push(post.clone());
            Ok(post)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == id)
                .cloned())
        }

        async fn find_with_authors(
            &self,
            id: Uuid,
        ) -> Result<Option<PostWithAuthors>, DomainError> {
            let post = self.find_by_id(id).await?;
            Ok(post.map(|p| self.with_authors(&p)))
        }

        async fn list_with_authors(&self) -> Result<Vec<PostWithAuthors>, DomainError> {
            let mut posts = self.posts.lock().unwrap().clone();
            posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(posts.iter().map(|p| self.with_authors(p)).collect())
        }

        async fn update_content(
            &self,
            id: Uuid,
            editor_id: Uuid,
            title: String,
            content: String,
        ) -> Result<Option<Post>, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            post.title = title;
            post.content = content;
            post.edited_by_id = Some(editor_id);
            post.updated_at = Utc::now();
            Ok(Some(post.clone()))
        }

        async fn set_approved_by(
            &self,
            id: Uuid,
            approver_id: Uuid,
        ) -> Result<Option<Post>, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            post.approved_by_id = Some(approver_id);
            post.updated_at = Utc::now();
            Ok(Some(post.clone()))
        }

        async fn set_published(
            &self,
            id: Uuid,
            published: bool,
        ) -> Result<Option<Post>, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            post.published = published;
            post.updated_at = Utc::now();
            Ok(Some(post.clone()))
        }

        async fn delete_with_comments(&self, id: Uuid) -> Result<bool, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            let mut comments = self.comments.lock().unwrap();

            let snapshot = comments.clone();
            comments.retain(|c| c.post_id != id);

            // Simulates the connection dying between the two DELETEs;
            // rollback restores the already-deleted comments.
            if self.fail_delete.load(Ordering::SeqCst) {
                *comments = snapshot;
                return Err(DomainError::Storage("connection reset".into()));
            }

            let before = posts.len();
            posts.retain(|p| p.id != id);
            if posts.len() == before {
                *comments = snapshot;
                return Ok(false);
            }
            Ok(true)
        }
    }

    #[async_trait]
    impl CommentRepository for MemoryStore {
        async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
            self.comments.lock().unwrap().push(comment.clone());
            Ok(comment)
        }

        async fn list_for_post(
            &self,
            post_id: Uuid,
        ) -> Result<Vec<CommentWithAuthor>, DomainError> {
            let users = self.users.lock().unwrap();
            let mut comments: Vec<CommentWithAuthor> = self
                .comments
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.post_id == post_id)
                .map(|c| CommentWithAuthor {
                    id: c.id,
                    post_id: c.post_id,
                    author_id: c.author_id,
                    author_name: users
                        .get(&c.author_id)
                        .map(|(name, _)| name.clone())
                        .unwrap_or_else(|| "unknown".into()),
                    content: c.content.clone(),
                    created_at: c.created_at,
                })
                .collect();
            comments.sort_by_key(|c| c.created_at);
            Ok(comments)
        }
    }

    fn service(store: &Arc<MemoryStore>) -> PostService<MemoryStore, MemoryStore> {
        PostService::new(Arc::clone(store), Arc::clone(store))
    }

    fn caller(role: Role) -> Caller {
        Caller {
            id: Uuid::new_v4(),
            role,
        }
    }

    fn create_input(title: &str, content: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.into(),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn create_enforces_field_minimums() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);
        let writer = caller(Role::Writer);

        let err = service
            .create_post(writer, create_input("", "0123456789"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service
            .create_post(writer, create_input("T", "123456789"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let post = service
            .create_post(writer, create_input("T", "1234567890"))
            .await
            .unwrap();
        assert_eq!(post.title, "T");
    }

    #[tokio::test]
    async fn new_posts_are_unpublished_drafts() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);

        let post = service
            .create_post(caller(Role::Reader), create_input("Draft", "long enough body"))
            .await
            .unwrap();

        assert!(!post.published);
        assert!(post.approved_by_id.is_none());
        assert!(post.edited_by_id.is_none());
    }

    #[tokio::test]
    async fn update_stamps_editor_and_never_touches_published() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);
        let admin = caller(Role::Admin);
        let reader = caller(Role::Reader);

        let post = service
            .create_post(admin, create_input("Original", "original body text"))
            .await
            .unwrap();

        // Editing a draft leaves it a draft.
        let updated = service
            .update_post(
                reader,
                post.id,
                UpdatePostRequest {
                    title: "Edited".into(),
                    content: "edited body text".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.edited_by_id, Some(reader.id));
        assert!(!updated.published);

        // Editing a published post leaves it published.
        service.publish_post(admin, post.id).await.unwrap();
        let updated = service
            .update_post(
                reader,
                post.id,
                UpdatePostRequest {
                    title: "Edited again".into(),
                    content: "edited once more".into(),
                },
            )
            .await
            .unwrap();
        assert!(updated.published);
    }

    #[tokio::test]
    async fn update_rejects_invalid_fields() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);
        let writer = caller(Role::Writer);

        let post = service
            .create_post(writer, create_input("Valid", "valid content here"))
            .await
            .unwrap();

        let err = service
            .update_post(
                writer,
                post.id,
                UpdatePostRequest {
                    title: "".into(),
                    content: "still valid content".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let unchanged = store.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(unchanged.title, "Valid");
    }

    #[tokio::test]
    async fn approve_requires_writer_or_admin() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);

        let post = service
            .create_post(caller(Role::Reader), create_input("Pending", "pending body text"))
            .await
            .unwrap();

        let err = service
            .approve_post(caller(Role::Reader), post.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
        let unchanged = store.find_by_id(post.id).await.unwrap().unwrap();
        assert!(unchanged.approved_by_id.is_none());

        let writer = caller(Role::Writer);
        let approved = service.approve_post(writer, post.id).await.unwrap();
        assert_eq!(approved.approved_by_id, Some(writer.id));
        // Sign-off never publishes by itself.
        assert!(!approved.published);
    }

    #[tokio::test]
    async fn publish_is_admin_only() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);

        let post = service
            .create_post(caller(Role::Writer), create_input("Story", "a story worth telling"))
            .await
            .unwrap();

        for role in [Role::Reader, Role::Writer] {
            let err = service
                .publish_post(caller(role), post.id)
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Forbidden));
            let unchanged = store.find_by_id(post.id).await.unwrap().unwrap();
            assert!(!unchanged.published);
        }

        let admin = caller(Role::Admin);
        let published = service.publish_post(admin, post.id).await.unwrap();
        assert!(published.published);

        let err = service
            .unpublish_post(caller(Role::Writer), post.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
        let unchanged = store.find_by_id(post.id).await.unwrap().unwrap();
        assert!(unchanged.published);

        let unpublished = service.unpublish_post(admin, post.id).await.unwrap();
        assert!(!unpublished.published);
    }

    #[tokio::test]
    async fn delete_requires_writer_or_admin() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);
        let author = caller(Role::Reader);

        let post = service
            .create_post(author, create_input("Keep", "content to keep around"))
            .await
            .unwrap();
        service
            .add_comment(
                author,
                post.id,
                CreateCommentRequest {
                    content: "nice".into(),
                },
            )
            .await
            .unwrap();

        let err = service.delete_post(author, post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
        assert!(store.find_by_id(post.id).await.unwrap().is_some());
        assert_eq!(store.comments.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_post_and_its_comments() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);
        let writer = caller(Role::Writer);

        let post = service
            .create_post(writer, create_input("Doomed", "content to be removed"))
            .await
            .unwrap();
        service
            .add_comment(
                writer,
                post.id,
                CreateCommentRequest {
                    content: "first".into(),
                },
            )
            .await
            .unwrap();

        service.delete_post(writer, post.id).await.unwrap();

        assert!(store.find_by_id(post.id).await.unwrap().is_none());
        assert!(store.comments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_delete_leaves_post_and_comments_intact() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);
        let admin = caller(Role::Admin);

        let post = service
            .create_post(admin, create_input("Survivor", "content that survives"))
            .await
            .unwrap();
        service
            .add_comment(
                admin,
                post.id,
                CreateCommentRequest {
                    content: "still here".into(),
                },
            )
            .await
            .unwrap();

        store.fail_delete.store(true, Ordering::SeqCst);
        let err = service.delete_post(admin, post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));

        // All or nothing: the post and its comment are both still present.
        assert!(store.find_by_id(post.id).await.unwrap().is_some());
        assert_eq!(store.comments.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_of_missing_post_is_not_found() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);

        let err = service
            .delete_post(caller(Role::Admin), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn get_posts_returns_newest_first() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);
        let author = caller(Role::Writer);
        store.add_user(author.id, "Ann", "ann@example.com");

        let now = Utc::now();
        for (i, title) in ["A", "B", "C"].iter().enumerate() {
            let mut post = Post::new(author.id, title.to_string(), "body body body".into());
            post.created_at = now + Duration::seconds(i as i64);
            PostRepository::create(&*store, post).await.unwrap();
        }

        let posts = service.get_posts().await.unwrap();
        let titles: Vec<&str> = posts.iter().map(|p| p.post.title.as_str()).collect();
        assert_eq!(titles, ["C", "B", "A"]);
    }

    #[tokio::test]
    async fn get_post_joins_author_names() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);
        let author = caller(Role::Reader);
        let editor = caller(Role::Writer);
        let admin = caller(Role::Admin);
        store.add_user(author.id, "Ann", "ann@example.com");
        store.add_user(editor.id, "Ben", "ben@example.com");
        store.add_user(admin.id, "Cyd", "cyd@example.com");

        let post = service
            .create_post(author, create_input("Joined", "joined relations body"))
            .await
            .unwrap();
        service
            .update_post(
                editor,
                post.id,
                UpdatePostRequest {
                    title: "Joined".into(),
                    content: "joined relations body".into(),
                },
            )
            .await
            .unwrap();
        service.approve_post(admin, post.id).await.unwrap();

        let full = service.get_post(post.id).await.unwrap();
        assert_eq!(full.created_by.name, "Ann");
        let edited_by = full.edited_by.unwrap();
        assert_eq!(edited_by.name, "Ben");
        assert_eq!(edited_by.email, "ben@example.com");
        assert_eq!(full.approved_by.unwrap().name, "Cyd");
    }

    #[tokio::test]
    async fn get_post_on_unknown_id_is_not_found() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);

        let missing = Uuid::new_v4();
        let err = service.get_post(missing).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn comments_require_an_existing_post() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);

        let err = service
            .add_comment(
                caller(Role::Reader),
                Uuid::new_v4(),
                CreateCommentRequest {
                    content: "into the void".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn comments_come_back_oldest_first_with_author_names() {
        let store = Arc::new(MemoryStore::default());
        let service = service(&store);
        let author = caller(Role::Reader);
        store.add_user(author.id, "Ann", "ann@example.com");

        let post = service
            .create_post(author, create_input("Thread", "a thread to comment on"))
            .await
            .unwrap();
        for text in ["first", "second"] {
            service
                .add_comment(
                    author,
                    post.id,
                    CreateCommentRequest {
                        content: text.into(),
                    },
                )
                .await
                .unwrap();
        }

        let comments = service.get_comments(post.id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "first");
        assert_eq!(comments[0].author_name, "Ann");
    }
}

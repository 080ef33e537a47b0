use crate::application::post_service::PostService;
use crate::data::comment_repository::PostgresCommentRepository;
use crate::data::post_repository::PostgresPostRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::{CreatePostRequest, UpdatePostRequest};
use crate::presentation::middleware::RequestId;
use crate::presentation::utils::AuthenticatedUser;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, delete, get, post, put, web};
use tracing::info;
use uuid::Uuid;

type Posts = web::Data<PostService<PostgresPostRepository, PostgresCommentRepository>>;

#[post("/posts")]
pub async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: Posts,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = posts
        .create_post(user.caller(), payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user = %user.name,
        post_id = %post.id,
        "post created"
    );

    Ok(HttpResponse::Created().json(post))
}

#[get("/posts")]
pub async fn get_posts(posts: Posts) -> Result<HttpResponse, DomainError> {
    let posts = posts.get_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

#[get("/posts/{id}")]
pub async fn get_post(posts: Posts, path: web::Path<Uuid>) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[put("/posts/{id}")]
pub async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: Posts,
    payload: web::Json<UpdatePostRequest>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = posts
        .update_post(user.caller(), post_id, payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user = %user.name,
        post_id = %post.id,
        "post updated"
    );

    Ok(HttpResponse::Ok().json(post))
}

#[post("/posts/{id}/approve")]
pub async fn approve_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: Posts,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = posts
        .approve_post(user.caller(), path.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user = %user.name,
        post_id = %post.id,
        "post approved"
    );

    Ok(HttpResponse::Ok().json(post))
}

#[post("/posts/{id}/publish")]
pub async fn publish_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: Posts,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = posts
        .publish_post(user.caller(), path.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user = %user.name,
        post_id = %post.id,
        "post published"
    );

    Ok(HttpResponse::Ok().json(post))
}

#[post("/posts/{id}/unpublish")]
pub async fn unpublish_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: Posts,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = posts
        .unpublish_post(user.caller(), path.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user = %user.name,
        post_id = %post.id,
        "post unpublished"
    );

    Ok(HttpResponse::Ok().json(post))
}

#[delete("/posts/{id}")]
pub async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: Posts,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    posts.delete_post(user.caller(), post_id).await?;

    info!(
        request_id = %request_id(&req),
        user = %user.name,
        post_id = %post_id,
        "post deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}

pub(super) fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

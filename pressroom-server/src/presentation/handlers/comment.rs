use crate::application::post_service::PostService;
use crate::data::comment_repository::PostgresCommentRepository;
use crate::data::post_repository::PostgresPostRepository;
use crate::domain::error::DomainError;
use crate::presentation::dto::CreateCommentRequest;
use crate::presentation::handlers::post::request_id;
use crate::presentation::utils::AuthenticatedUser;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;
use uuid::Uuid;

type Posts = web::Data<PostService<PostgresPostRepository, PostgresCommentRepository>>;

#[get("/posts/{id}/comments")]
pub async fn get_comments(posts: Posts, path: web::Path<Uuid>) -> Result<HttpResponse, DomainError> {
    let comments = posts.get_comments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comments))
}

#[post("/posts/{id}/comments")]
pub async fn add_comment(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: Posts,
    payload: web::Json<CreateCommentRequest>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let comment = posts
        .add_comment(user.caller(), post_id, payload.into_inner())
        .await?;

    info!(
        request_id = %request_id(&req),
        user = %user.name,
        post_id = %post_id,
        comment_id = %comment.id,
        "comment added"
    );

    Ok(HttpResponse::Created().json(comment))
}

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(rename = "token_type")]
    pub token_type: String, // "Bearer"
}

// ======================= POSTS =======================

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 10, message = "content must be at least 10 characters"))]
    pub content: String,
}

/// Full overwrite of the editable fields. The `published` flag is not
/// part of the payload; it only moves through publish and unpublish.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 10, message = "content must be at least 10 characters"))]
    pub content: String,
}

// ======================= COMMENTS =======================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "comment must not be empty"))]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_content_minimums() {
        let empty_title = CreatePostRequest {
            title: "".into(),
            content: "0123456789".into(),
        };
        assert!(empty_title.validate().is_err());

        let short_content = CreatePostRequest {
            title: "T".into(),
            content: "123456789".into(),
        };
        assert!(short_content.validate().is_err());

        let at_boundary = CreatePostRequest {
            title: "T".into(),
            content: "1234567890".into(),
        };
        assert!(at_boundary.validate().is_ok());
    }

    #[test]
    fn validation_reports_the_offending_field() {
        let input = CreatePostRequest {
            title: "".into(),
            content: "short".into(),
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("content"));
    }

    #[test]
    fn empty_comment_is_rejected() {
        let input = CreateCommentRequest { content: "".into() };
        assert!(input.validate().is_err());
    }
}

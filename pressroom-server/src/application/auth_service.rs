use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::data::user_repository::UserRepository;
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::{JwtKeys, hash_password, verify_password};
use crate::presentation::dto::{LoginRequest, RegisterRequest};

#[derive(Clone)]
pub struct AuthService<R: UserRepository + 'static> {
    repo: Arc<R>,
    keys: JwtKeys,
}

impl<R> AuthService<R>
where
    R: UserRepository + 'static,
{
    pub fn new(repo: Arc<R>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub fn token_ttl(&self) -> i64 {
        self.keys.ttl_secs()
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound(id))
    }

    /// New accounts always start with the unprivileged READER role; WRITER
    /// and ADMIN are granted directly in storage.
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterRequest) -> Result<User, DomainError> {
        input.validate()?;
        let hash =
            hash_password(&input.password).map_err(|err| DomainError::Internal(err.to_string()))?;
        let user = User::new(input.name, input.email.to_lowercase(), hash);
        self.repo.create(user).await
    }

    #[instrument(skip(self, input))]
    pub async fn login(&self, input: &LoginRequest) -> Result<String, DomainError> {
        let user = self
            .repo
            .find_by_email(&input.email.to_lowercase())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = verify_password(&input.password, &user.password_hash)
            .map_err(|_| DomainError::Unauthorized)?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        self.keys
            .generate_token(user.id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }
}

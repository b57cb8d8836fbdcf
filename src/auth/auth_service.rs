use super::{jwt::create_jwt, password};
use crate::error::{AppError, Result};
use crate::user::{User, UserRepository};

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    jwt_secret: String,
    jwt_expiration_hours: i64,
}

impl AuthService {
    pub fn new(users: UserRepository, jwt_secret: String, jwt_expiration_hours: i64) -> Self {
        Self {
            users,
            jwt_secret,
            jwt_expiration_hours,
        }
    }

    pub async fn register(&self, username: &str, email: &str, pass: &str) -> Result<(User, String)> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }

        let password_hash = password::hash_password(pass)?;
        let user = self.users.create(username, email, &password_hash).await?;
        let token = create_jwt(user.id, &user.email, &self.jwt_secret, self.jwt_expiration_hours)?;

        Ok((user, token))
    }

    pub async fn login(&self, email: &str, pass: &str) -> Result<(User, String)> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !password::verify_password(pass, hash)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let token = create_jwt(user.id, &user.email, &self.jwt_secret, self.jwt_expiration_hours)?;

        Ok((user, token))
    }
}

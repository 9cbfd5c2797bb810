//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, LoginResult, UserInfo};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

const MAX_USERNAME_CHARS: usize = 150;

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Invalid regex"))
}

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn validate_username(username: &str) -> Result<(), AuthError> {
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_CHARS {
            return Err(AuthError::Validation(format!(
                "Username must be at most {MAX_USERNAME_CHARS} characters"
            )));
        }
        if !username_regex().is_match(username) {
            return Err(AuthError::Validation(
                "Username may only contain letters, digits and @/./+/-/_".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        let min = self.security.min_password_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min} characters"
            )));
        }
        Ok(())
    }

    async fn create(
        &self,
        username: &str,
        password: &str,
        is_staff: bool,
    ) -> Result<User, AuthError> {
        Self::validate_username(username)?;
        self.validate_password(password)?;

        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let user = self
            .store
            .create_user(username, password, is_staff, &self.security)
            .await?;

        tracing::info!(username = %user.username, is_staff, "Account created");
        Ok(user)
    }
}

fn user_info(user: User) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username,
        is_staff: user.is_staff,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self.create(username.trim(), password, false).await?;

        Ok(LoginResult {
            id: user.id,
            username: user.username,
            api_key: user.api_key,
            is_staff: user.is_staff,
        })
    }

    async fn create_superuser(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserInfo, AuthError> {
        let user = self.create(username.trim(), password, true).await?;
        Ok(user_info(user))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let is_valid = self.store.verify_user_password(username, password).await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(LoginResult {
            id: user.id,
            username: user.username,
            api_key: user.api_key,
            is_staff: user.is_staff,
        })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<UserInfo>, AuthError> {
        let user = self.store.verify_api_key(api_key).await?;
        Ok(user.map(user_info))
    }

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user_info(user))
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.validate_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let is_valid = self
            .store
            .verify_user_password(username, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(username, new_password, &self.security)
            .await?;

        Ok(())
    }

    async fn regenerate_api_key(&self, username: &str) -> Result<String, AuthError> {
        let new_api_key = self.store.regenerate_user_api_key(username).await?;
        Ok(new_api_key)
    }
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::password::PasswordEncoder;
use crate::auth::token::{TokenCodec, ROLE_CLAIM};
use crate::db::models::{NewUser, User};
use crate::db::store::CredentialStore;
use crate::error::{AppError, AuthError, DatabaseError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReissuedToken {
    pub access_token: String,
}

/// Registration, login and access-token reissue.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    passwords: Arc<dyn PasswordEncoder>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: Arc<TokenCodec>,
        passwords: Arc<dyn PasswordEncoder>,
    ) -> Self {
        Self {
            store,
            codec,
            passwords,
        }
    }

    pub async fn register(&self, email: &str, password: &str, nickname: &str) -> Result<User, AppError> {
        if email.trim().is_empty() || password.is_empty() || nickname.trim().is_empty() {
            return Err(AppError::ValidationError(
                "email, password and nickname are required".into(),
            ));
        }
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AppError::Conflict("email is already registered".into()));
        }
        if self.store.exists_by_nickname(nickname).await? {
            return Err(AppError::Conflict("nickname is already taken".into()));
        }

        let password_hash = self.passwords.hash(password)?;
        let user = self
            .store
            .save_user(NewUser::new(email.to_string(), password_hash, nickname.to_string()))
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration.
                AppError::DatabaseError(DatabaseError::Duplicate) => {
                    AppError::Conflict("email or nickname is already taken".into())
                }
                other => other,
            })?;

        info!(email = %user.email, user_id = user.id, "user registered");
        Ok(user)
    }

    pub async fn is_nickname_available(&self, nickname: &str) -> Result<bool, AppError> {
        Ok(!self.store.exists_by_nickname(nickname).await?)
    }

    /// Verifies the password, issues both tokens and replaces the user's
    /// refresh record. Any earlier refresh token stops working.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginTokens, AppError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.passwords.matches(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token = self
            .codec
            .issue_access_token(&user.email, &user.role, &user.nickname)?;
        let refresh_token = self.codec.issue_refresh_token(&user.email)?;

        self.store
            .save_refresh_record(&user.email, &refresh_token)
            .await?;

        info!(email = %user.email, "login succeeded");
        Ok(LoginTokens {
            access_token,
            refresh_token,
            nickname: user.nickname,
        })
    }

    /// Exchanges the current refresh token for a new access token. The role
    /// is carried over from the (possibly expired) old access token.
    pub async fn reissue(
        &self,
        old_access_token: &str,
        refresh_token: &str,
    ) -> Result<ReissuedToken, AppError> {
        if !self.codec.validate(refresh_token) {
            warn!("reissue rejected: refresh token invalid or expired");
            return Err(AuthError::InvalidToken.into());
        }
        let email = self.codec.extract_subject(refresh_token)?;

        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no account for token subject {}", email)))?;

        let stored = self
            .store
            .find_refresh_record(&email)
            .await?
            .ok_or_else(|| {
                warn!(email = %email, "reissue rejected: no refresh session");
                AuthError::SessionNotFound
            })?;

        if stored.as_bytes() != refresh_token.as_bytes() {
            warn!(email = %email, "reissue rejected: refresh token superseded");
            return Err(AuthError::RefreshTokenMismatch.into());
        }

        let role = self.codec.extract_claim(old_access_token, ROLE_CLAIM)?;
        let access_token = self
            .codec
            .issue_access_token(&email, &role, &user.nickname)?;

        info!(email = %email, "access token reissued");
        Ok(ReissuedToken { access_token })
    }
}

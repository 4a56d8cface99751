//! Self-hosted identity provider: accounts, password checks, session tokens.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::SessionUser;
use crate::database::store::{RecordStore, StoreError};
use crate::forms::{CredentialsForm, FormError};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &SessionUser, expiry_hours: u64) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(expiry_hours as i64)).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Password must be at least {0} characters long")]
    WeakPassword(usize),

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => IdentityError::EmailTaken,
            other => IdentityError::Store(other),
        }
    }
}

/// A signed-in user and the token that carries the session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn RecordStore>,
    secret: String,
    expiry_hours: u64,
    min_password_length: usize,
}

impl IdentityService {
    pub fn new(store: Arc<dyn RecordStore>, security: &SecurityConfig) -> Self {
        Self {
            store,
            secret: security.jwt_secret.clone(),
            expiry_hours: security.session_expiry_hours,
            min_password_length: security.min_password_length,
        }
    }

    pub async fn sign_up(&self, form: CredentialsForm) -> Result<Session, IdentityError> {
        let form = form.normalized()?;
        if form.password.chars().count() < self.min_password_length {
            return Err(IdentityError::WeakPassword(self.min_password_length));
        }

        let password_hash = hash_password(&form.password)?;
        let user = self.store.insert_user(&form.email, &password_hash).await?;
        info!(user_id = %user.id, "Account created");

        self.issue(SessionUser::from(&user))
    }

    pub async fn sign_in(&self, form: CredentialsForm) -> Result<Session, IdentityError> {
        let form = form.normalized()?;
        let user = self
            .store
            .find_user_by_email(&form.email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !verify_password(&form.password, &user.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }
        info!(user_id = %user.id, "Signed in");

        self.issue(SessionUser::from(&user))
    }

    /// Resolves a token to its user. Missing, invalid or expired tokens and
    /// deleted accounts all resolve to `None`.
    pub async fn current_user(&self, token: &str) -> Result<Option<SessionUser>, IdentityError> {
        let claims = match self.validate(token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!("Rejected session token: {}", err);
                return Ok(None);
            }
        };

        let user = self.store.find_user(claims.sub).await?;
        Ok(user.as_ref().map(SessionUser::from))
    }

    fn issue(&self, user: SessionUser) -> Result<Session, IdentityError> {
        if self.secret.is_empty() {
            return Err(IdentityError::MissingSecret);
        }
        let claims = Claims::new(&user, self.expiry_hours);
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(Session { token, user })
    }

    fn validate(&self, token: &str) -> Result<Claims, IdentityError> {
        if self.secret.is_empty() {
            return Err(IdentityError::MissingSecret);
        }
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Hash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, IdentityError> {
    let parsed = PasswordHash::new(hash).map_err(|e| IdentityError::Hash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(IdentityError::Hash(e.to_string())),
    }
}

//! JWT authentication and password hashing
//!
//! Tokens are HS256 JWTs carrying the learner id and email. Passwords are
//! stored as Argon2id PHC strings.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm as Argon2Algorithm, Argon2, Params, Version,
};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (learner ID)
    pub sub: String,
    pub email: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT secret key (should be 256-bit for HS256)
    pub jwt_secret: String,
    /// Token expiration (days)
    pub token_expiry_days: i64,
    /// Argon2 memory cost (KiB)
    pub password_memory_kib: u32,
    /// Argon2 iterations
    pub password_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: generate_jwt_secret(),
            token_expiry_days: 7,
            password_memory_kib: 19456,
            password_iterations: 2,
        }
    }
}

impl AuthConfig {
    /// Build from the file/env configuration, generating a secret if none is set
    pub fn from_settings(settings: &crate::config::AuthConfig) -> Self {
        Self {
            jwt_secret: settings.jwt_secret.clone().unwrap_or_else(generate_jwt_secret),
            token_expiry_days: settings.token_expiry_days,
            password_memory_kib: settings.password_memory_kib,
            password_iterations: settings.password_iterations,
        }
    }
}

/// Authentication state
pub struct AuthState {
    config: AuthConfig,
}

impl AuthState {
    /// Create new auth state with config
    pub fn new(config: AuthConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }

    /// Issue a token for a learner
    pub fn issue_token(&self, learner_id: &str, email: &str) -> Result<String> {
        let now = Utc::now();
        let expiry = now + Duration::days(self.config.token_expiry_days);

        let claims = Claims {
            sub: learner_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .context("Failed to encode JWT")
    }

    /// Validate and decode token
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .context("Invalid token")?;

        Ok(token_data.claims)
    }

    fn cost(&self) -> (u32, u32) {
        (self.config.password_memory_kib, self.config.password_iterations)
    }

    /// Hash a password into a PHC string on the blocking pool
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let (memory, iterations) = self.cost();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            let hash = hasher(memory, iterations)?
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
            Ok(hash.to_string())
        })
        .await
        .context("Password hashing task failed")?
    }

    /// Verify a password against a stored hash. A malformed hash never matches.
    pub async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let (memory, iterations) = self.cost();
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || {
            let Ok(parsed) = PasswordHash::new(&hash) else {
                return false;
            };
            match hasher(memory, iterations) {
                Ok(hasher) => hasher.verify_password(password.as_bytes(), &parsed).is_ok(),
                Err(_) => false,
            }
        })
        .await
        .unwrap_or(false)
    }
}

fn hasher(memory_kib: u32, iterations: u32) -> Result<Argon2<'static>> {
    let params = Params::new(memory_kib, iterations, 1, None)
        .map_err(|e| anyhow!("Invalid password hashing parameters: {}", e))?;
    Ok(Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, params))
}

/// Generate a secure JWT secret
pub fn generate_jwt_secret() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

/// Axum middleware for JWT authentication
pub async fn auth_middleware(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Auth("No token provided".to_string()))?;

    let claims = state
        .validate_token(token)
        .map_err(|_| AppError::Auth("Invalid or expired token".to_string()))?;

    // Add claims to request extensions for handlers
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

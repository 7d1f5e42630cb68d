// gemstore/src/services/auth_service.rs

//! Registration, login, and bearer-session resolution, plus the Argon2
//! password hashing primitives they rest on.

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::user::User;
use argon2::{
  password_hash::{
    rand_core::OsRng,
    PasswordHash,
    PasswordHasher,   // The main trait for hashing
    PasswordVerifier, // The main trait for verifying
    SaltString,
  },
  Argon2,
};
use chrono::{Duration, Utc};
use rand_core::RngCore;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};

/// Hashes a plain-text password using Argon2 with a fresh random salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty for hashing.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  let argon2_hasher = Argon2::default(); // Default parameters (recommended)

  match argon2_hasher.hash_password(password.as_bytes(), &salt) {
    Ok(password_hash_obj) => Ok(password_hash_obj.to_string()),
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// Verifies a plain-text password against a stored Argon2 hash.
/// Returns `Ok(false)` on a clean mismatch; errors only on malformed input.
#[instrument(name = "auth_service::verify_password", skip(hashed_password_str, provided_password), err(Display))]
pub fn verify_password(hashed_password_str: &str, provided_password: &str) -> Result<bool, AppError> {
  if hashed_password_str.is_empty() {
    return Err(AppError::Auth("Invalid stored password format (empty).".to_string()));
  }
  if provided_password.is_empty() {
    return Err(AppError::Auth("Provided password for verification cannot be empty.".to_string()));
  }

  let parsed_hash = match PasswordHash::new(hashed_password_str) {
    Ok(ph) => ph,
    Err(parse_err) => {
      error!(error = %parse_err, "Failed to parse stored password hash string.");
      return Err(AppError::Internal(format!("Invalid stored password hash format: {}", parse_err)));
    }
  };

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: passwords do not match.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

/// 256 bits from the OS RNG, hex-encoded. Opaque to clients.
pub fn generate_session_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn validate_registration(email: &str, password: &str, name: &str) -> Result<(), AppError> {
  let mut field_errors = Vec::new();
  if email.is_empty() || !email.contains('@') {
    field_errors.push("A valid email address is required.".to_string());
  }
  if password.len() < 8 {
    field_errors.push("Password must be at least 8 characters long.".to_string());
  }
  if name.trim().is_empty() {
    field_errors.push("Name is required.".to_string());
  }
  if field_errors.is_empty() {
    Ok(())
  } else {
    Err(AppError::FieldValidation(field_errors))
  }
}

#[instrument(name = "auth_service::register_user", skip(pool, password), fields(email = %email))]
pub async fn register_user(pool: &PgPool, email: &str, password: &str, name: &str) -> Result<User, AppError> {
  validate_registration(email, password, name)?;

  let email = email.trim().to_lowercase();
  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
    .bind(&email)
    .fetch_one(pool)
    .await?;
  if exists {
    warn!("Attempt to register with existing email: {}", email);
    return Err(AppError::FieldValidation(vec![
      "An account with this email already exists.".to_string(),
    ]));
  }

  let password_hash = hash_password(password)?;

  let new_user: User = sqlx::query_as(
    "INSERT INTO users (email, password_hash, name)
     VALUES ($1, $2, $3)
     RETURNING id, email, password_hash, name, is_admin, created_at, updated_at",
  )
  .bind(&email)
  .bind(password_hash)
  .bind(name.trim())
  .fetch_one(pool)
  .await?;

  info!("User created successfully: ID={}, Email={}", new_user.id, new_user.email);
  Ok(new_user)
}

/// Verifies credentials and opens a session. Unknown email and wrong
/// password are indistinguishable to the caller.
#[instrument(name = "auth_service::login", skip(pool, config, password), fields(email = %email))]
pub async fn login(pool: &PgPool, config: &AppConfig, email: &str, password: &str) -> Result<(User, String), AppError> {
  let email = email.trim().to_lowercase();
  let user: Option<User> = sqlx::query_as(
    "SELECT id, email, password_hash, name, is_admin, created_at, updated_at FROM users WHERE email = $1",
  )
  .bind(&email)
  .fetch_optional(pool)
  .await?;

  let invalid = || AppError::Auth("Invalid email or password.".to_string());
  let user = match user {
    Some(u) => u,
    None => {
      warn!("Login attempt for unknown email.");
      return Err(invalid());
    }
  };

  if !verify_password(&user.password_hash, password)? {
    warn!("Login attempt with wrong password for user {}.", user.id);
    return Err(invalid());
  }

  let token = generate_session_token();
  let expires_at = Utc::now() + Duration::hours(config.session_ttl_hours);
  sqlx::query("INSERT INTO sessions (user_id, token, expires_at) VALUES ($1, $2, $3)")
    .bind(user.id)
    .bind(&token)
    .bind(expires_at)
    .execute(pool)
    .await?;

  info!("Login successful for user {}.", user.id);
  Ok((user, token))
}

/// Resolves a bearer token to its user, enforcing session expiry.
#[instrument(name = "auth_service::resolve_session", skip(pool, token))]
pub async fn resolve_session(pool: &PgPool, token: &str) -> Result<User, AppError> {
  let user: Option<User> = sqlx::query_as(
    "SELECT u.id, u.email, u.password_hash, u.name, u.is_admin, u.created_at, u.updated_at
     FROM sessions s
     JOIN users u ON u.id = s.user_id
     WHERE s.token = $1 AND s.expires_at > NOW()",
  )
  .bind(token)
  .fetch_optional(pool)
  .await?;

  user.ok_or_else(|| {
    warn!("Bearer token did not resolve to a live session.");
    AppError::Auth("Invalid or expired session token.".to_string())
  })
}

// gemstore/src/web/extractors.rs

//! Request extractors for authenticated identities. Handlers declare
//! `AuthenticatedUser` (or `AdminUser`) as a parameter and never see
//! unauthenticated traffic.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub email: String,
  pub is_admin: bool,
}

fn bearer_token(header_value: Option<&str>) -> Option<&str> {
  header_value?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|token| !token.is_empty())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, AppError>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let header_value = req
      .headers()
      .get(header::AUTHORIZATION)
      .and_then(|h| h.to_str().ok())
      .map(str::to_owned);

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
      let token = match bearer_token(header_value.as_deref()) {
        Some(t) => t.to_owned(),
        None => {
          warn!("AuthenticatedUser extractor: missing or malformed Authorization header.");
          return Err(AppError::Auth("Missing or malformed bearer token.".to_string()));
        }
      };

      let user = auth_service::resolve_session(&state.db_pool, &token).await?;
      Ok(AuthenticatedUser {
        user_id: user.id,
        email: user.email,
        is_admin: user.is_admin,
      })
    })
  }
}

/// An `AuthenticatedUser` that has also passed the admin check.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, AppError>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let user_future = AuthenticatedUser::from_request(req, payload);
    Box::pin(async move {
      let user = user_future.await?;
      if !user.is_admin {
        warn!("User {} attempted an admin operation.", user.user_id);
        return Err(AppError::Auth("Administrator access required.".to_string()));
      }
      Ok(AdminUser(user))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bearer_token_parses_well_formed_headers() {
    assert_eq!(bearer_token(Some("Bearer abc123")), Some("abc123"));
    assert_eq!(bearer_token(Some("Bearer   abc123  ")), Some("abc123"));
  }

  #[test]
  fn bearer_token_rejects_malformed_headers() {
    assert_eq!(bearer_token(None), None);
    assert_eq!(bearer_token(Some("")), None);
    assert_eq!(bearer_token(Some("Bearer ")), None);
    assert_eq!(bearer_token(Some("Basic dXNlcjpwdw==")), None);
    assert_eq!(bearer_token(Some("bearer abc")), None);
  }
}

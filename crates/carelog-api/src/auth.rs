//! Caller identity extractor.
//!
//! Authentication happens upstream. The authenticating proxy forwards the
//! caller as two headers, which this module trusts but checks for shape:
//!
//! - `X-Carelog-User`: the caller's UUID
//! - `X-Carelog-Role`: `admin` or `caregiver`

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-carelog-user";
pub const ROLE_HEADER: &str = "x-carelog-role";

/// Roles allowed to read and write daily logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Caregiver,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

/// Identify the caller from request headers.
pub fn identify(headers: &HeaderMap) -> Result<Actor, ApiError> {
  let user_id = header(headers, USER_HEADER)
    .and_then(|v| Uuid::parse_str(v).ok())
    .ok_or(ApiError::Unauthenticated)?;
  let role = header(headers, ROLE_HEADER).ok_or(ApiError::Unauthenticated)?;
  let role = role
    .parse::<Role>()
    .map_err(|_| ApiError::Forbidden(role.to_owned()))?;
  Ok(Actor { user_id, role })
}

impl<S> FromRequestParts<S> for Actor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    identify(&parts.headers)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(user: Option<&str>, role: Option<&str>) -> HeaderMap {
    let mut h = HeaderMap::new();
    if let Some(user) = user {
      h.insert(USER_HEADER, HeaderValue::from_str(user).unwrap());
    }
    if let Some(role) = role {
      h.insert(ROLE_HEADER, HeaderValue::from_str(role).unwrap());
    }
    h
  }

  #[test]
  fn accepts_caregiver_and_admin() {
    let id = Uuid::new_v4().to_string();
    for (raw, role) in [("caregiver", Role::Caregiver), ("admin", Role::Admin)] {
      let actor = identify(&headers(Some(&id), Some(raw))).unwrap();
      assert_eq!(actor.role, role);
    }
  }

  #[test]
  fn missing_or_garbled_user_is_unauthenticated() {
    assert!(matches!(
      identify(&headers(None, Some("caregiver"))),
      Err(ApiError::Unauthenticated)
    ));
    assert!(matches!(
      identify(&headers(Some("not-a-uuid"), Some("caregiver"))),
      Err(ApiError::Unauthenticated)
    ));
    let id = Uuid::new_v4().to_string();
    assert!(matches!(identify(&headers(Some(&id), None)), Err(ApiError::Unauthenticated)));
  }

  #[test]
  fn other_roles_are_forbidden() {
    let id = Uuid::new_v4().to_string();
    for role in ["family", "Caregiver", "root"] {
      assert!(matches!(
        identify(&headers(Some(&id), Some(role))),
        Err(ApiError::Forbidden(r)) if r == role
      ));
    }
  }
}

//! Identity extraction from gateway-injected headers.
//!
//! Session resolution lives in an external auth collaborator (the API
//! gateway); by the time a request reaches this service its identity
//! arrives as `x-user-*` headers. Requests without a parseable
//! `x-user-id` are rejected with 401; role checks yield 403.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::CustomerId;

use crate::error::ApiError;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";
const USER_NAME_HEADER: &str = "x-user-name";
const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: CustomerId,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Rejects non-admin callers with 403.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }

    fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let raw_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing identity".to_string()))?;
        let uuid = uuid::Uuid::parse_str(raw_id)
            .map_err(|_| ApiError::Unauthorized("malformed identity".to_string()))?;

        let role = match headers.get(USER_ROLE_HEADER).and_then(|v| v.to_str().ok()) {
            Some("admin") => Role::Admin,
            Some("customer") | None => Role::Customer,
            Some(other) => {
                return Err(ApiError::Unauthorized(format!("unknown role: {other}")));
            }
        };

        let header_string = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };

        Ok(Self {
            user_id: CustomerId::from_uuid(uuid),
            role,
            name: header_string(USER_NAME_HEADER),
            email: header_string(USER_EMAIL_HEADER),
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: Option<&str>, role: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(id) = id {
            map.insert(USER_ID_HEADER, HeaderValue::from_str(id).unwrap());
        }
        if let Some(role) = role {
            map.insert(USER_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        }
        map
    }

    #[test]
    fn missing_id_is_unauthorized() {
        let err = Identity::from_headers(&headers(None, None)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn malformed_id_is_unauthorized() {
        let err = Identity::from_headers(&headers(Some("nope"), None)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn role_defaults_to_customer() {
        let id = uuid::Uuid::new_v4().to_string();
        let identity = Identity::from_headers(&headers(Some(&id), None)).unwrap();
        assert_eq!(identity.role, Role::Customer);
        assert!(identity.require_admin().is_err());
    }

    #[test]
    fn admin_role_is_recognised() {
        let id = uuid::Uuid::new_v4().to_string();
        let identity = Identity::from_headers(&headers(Some(&id), Some("admin"))).unwrap();
        assert!(identity.is_admin());
        assert!(identity.require_admin().is_ok());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let id = uuid::Uuid::new_v4().to_string();
        let err = Identity::from_headers(&headers(Some(&id), Some("superuser"))).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}

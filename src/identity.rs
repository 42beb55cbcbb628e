//! Tenant and actor resolution.
//!
//! The gateway in front of this service authenticates the caller and forwards
//! the result as plain headers: `X-Tenant-Id` scopes every query and
//! `X-Acting-User` names the staff member recorded on movements. This module
//! turns those headers into typed extractors; the core treats the actor as an
//! opaque string.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::ServiceError;

pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const ACTING_USER_HEADER: &str = "x-acting-user";

/// Tenant scope for read-only endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantId(pub Uuid);

/// Tenant scope plus the acting staff member, required on mutating endpoints.
#[derive(Debug, Clone)]
pub struct Identity {
    pub tenant_id: Uuid,
    pub actor: String,
}

fn tenant_from_parts(parts: &Parts) -> Result<Uuid, ServiceError> {
    let raw = parts
        .headers
        .get(TENANT_ID_HEADER)
        .ok_or_else(|| ServiceError::BadRequest("Missing X-Tenant-Id header".to_string()))?
        .to_str()
        .map_err(|_| ServiceError::BadRequest("X-Tenant-Id is not valid ASCII".to_string()))?;

    Uuid::parse_str(raw)
        .map_err(|_| ServiceError::BadRequest("X-Tenant-Id must be a UUID".to_string()))
}

fn actor_from_parts(parts: &Parts) -> Result<String, ServiceError> {
    let raw = parts
        .headers
        .get(ACTING_USER_HEADER)
        .ok_or_else(|| ServiceError::BadRequest("Missing X-Acting-User header".to_string()))?
        .to_str()
        .map_err(|_| ServiceError::BadRequest("X-Acting-User is not valid ASCII".to_string()))?
        .trim();

    if raw.is_empty() {
        return Err(ServiceError::BadRequest(
            "X-Acting-User must not be empty".to_string(),
        ));
    }
    Ok(raw.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        tenant_from_parts(parts).map(TenantId)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = tenant_from_parts(parts)?;
        let actor = actor_from_parts(parts)?;
        Ok(Identity { tenant_id, actor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_for(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn extracts_tenant_and_actor() {
        let tenant = Uuid::new_v4();
        let mut parts = parts_for(&[
            (TENANT_ID_HEADER, &tenant.to_string()),
            (ACTING_USER_HEADER, "marta"),
        ]);

        let identity = Identity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity.tenant_id, tenant);
        assert_eq!(identity.actor, "marta");
    }

    #[tokio::test]
    async fn rejects_missing_tenant_header() {
        let mut parts = parts_for(&[(ACTING_USER_HEADER, "marta")]);
        let err = Identity::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_tenant_id() {
        let mut parts = parts_for(&[
            (TENANT_ID_HEADER, "not-a-uuid"),
            (ACTING_USER_HEADER, "marta"),
        ]);
        let err = TenantId::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn rejects_blank_actor() {
        let tenant = Uuid::new_v4();
        let mut parts = parts_for(&[
            (TENANT_ID_HEADER, &tenant.to_string()),
            (ACTING_USER_HEADER, "   "),
        ]);
        let err = Identity::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn read_scope_does_not_require_an_actor() {
        let tenant = Uuid::new_v4();
        let mut parts = parts_for(&[(TENANT_ID_HEADER, &tenant.to_string())]);
        let scope = TenantId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(scope.0, tenant);
    }
}

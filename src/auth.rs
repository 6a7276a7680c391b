use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    error::{ApiError, StoreError},
    models::{Role, UserId},
    repository::RepositoryState,
};

/// Header accepted in `Env::Local` in place of a bearer token.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload of the bearer tokens this service accepts (HS256).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the user the token was issued to, as a decimal string.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Requester
///
/// The authenticated caller. The role is read from the store on every request, so
/// role changes and deletions take effect without waiting for the token to expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: UserId,
    pub role: Role,
}

/// Requester Extractor
///
/// Resolves the caller from the request headers:
/// 1. In `Env::Local`, an `x-user-id` header naming an existing user.
/// 2. Otherwise an `Authorization: Bearer <jwt>` header whose `sub` names an existing user.
///
/// Any failure rejects with `ApiError::Unauthorized` (401). A store outage is the one
/// exception and surfaces as `ApiError::Unexpected`.
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let dev_user = parts
                .headers
                .get(DEV_USER_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<UserId>().ok());

            if let Some(user_id) = dev_user {
                if let Ok(user) = repo.get_user(user_id).await {
                    return Ok(Requester {
                        id: user.id,
                        role: user.role,
                    });
                }
            }
        }
        // Production, or a bypass header that did not resolve: fall through to the token.

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let user_id = decode_subject(token, &config.jwt_secret)?;

        match repo.get_user(user_id).await {
            Ok(user) => Ok(Requester {
                id: user.id,
                role: user.role,
            }),
            // Valid token for a user that no longer exists.
            Err(StoreError::NotFound(_)) => Err(ApiError::Unauthorized),
            Err(e) => Err(e.into()),
        }
    }
}

fn decode_subject(token: &str, secret: &str) -> Result<UserId, ApiError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => data.claims.sub.parse().map_err(|_| {
            tracing::warn!("Rejected token with non-numeric subject");
            ApiError::Unauthorized
        }),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("Rejected expired token"),
                other => tracing::warn!("Rejected token: {:?}", other),
            }
            Err(ApiError::Unauthorized)
        }
    }
}

/// auth_middleware
///
/// The authentication gate in front of every `/users` route. Rejects with 401 when no
/// identity can be resolved; otherwise stores the `Requester` in the request extensions
/// for the handler to read.
pub async fn auth_middleware(requester: Requester, mut request: Request, next: Next) -> Response {
    tracing::debug!(user_id = requester.id, role = %requester.role, "Authenticated request");
    request.extensions_mut().insert(requester);
    next.run(request).await
}

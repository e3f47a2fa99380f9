use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// Header carrying the authenticated user id, injected by the fronting
/// auth layer. This service performs no authentication itself.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's identity, used to stamp `created_by` / `confirmed_by` on
/// every mutating operation.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[derive(Debug)]
pub struct AuthRejection(&'static str);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Unauthorized",
                "message": self.0,
            })),
        )
            .into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(AuthRejection("Missing X-User-Id header"))?;
        let value = header
            .to_str()
            .map_err(|_| AuthRejection("Invalid X-User-Id header"))?;
        let user_id = Uuid::parse_str(value).map_err(|_| AuthRejection("Invalid user id"))?;
        Ok(AuthUser { user_id })
    }
}

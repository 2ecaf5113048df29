use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::actor::{AccountRole, Actor};

/// Resolves the acting identity from the forwarded-identity headers set by
/// the authentication gateway. The role is decided here, once per call;
/// nothing downstream guesses at it.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = required_header(parts, "x-actor-id")?
            .parse::<Uuid>()
            .map_err(|_| AppError::BadRequest("x-actor-id must be a uuid".to_string()))?;

        let role = match required_header(parts, "x-actor-role")? {
            "driver" => AccountRole::Driver,
            "provider" => AccountRole::Provider,
            other => {
                return Err(AppError::BadRequest(format!(
                    "unknown actor role: {other}"
                )))
            }
        };

        Ok(Actor { id, role })
    }
}

fn required_header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(format!("missing {name} header")))
}

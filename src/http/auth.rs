use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderName;
use std::net::SocketAddr;

use crate::domain::user::Audit;
use crate::http::AppError;

const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// The caller of a mutating request: the acting user id from `x-user-id`
/// and the peer address of the connection.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: i64,
    pub ip: String,
}

impl Actor {
    pub fn audit(&self) -> Audit {
        Audit {
            actor_id: self.user_id,
            ip: self.ip.clone(),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::bad_request("missing x-user-id header"))?;

        let user_id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::bad_request("invalid x-user-id header"))?;

        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Actor { user_id, ip })
    }
}

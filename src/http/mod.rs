use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use auth::Actor;
pub use error::AppError;

pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit_bytes;

    Router::new()
        .merge(routes::health())
        .merge(routes::users())
        .merge(routes::attendants())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

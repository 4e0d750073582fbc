use axum::{routing::get, routing::post, routing::put, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/users/user/:id", get(handlers::get_user))
        .route(
            "/users/update/:id",
            put(handlers::update_user).patch(handlers::update_user),
        )
        .route("/users/search/", post(handlers::search_user))
        .route(
            "/users/client/:client_id/contacts",
            get(handlers::list_client_contacts),
        )
        .route(
            "/users/contact/:contact_id/clients",
            get(handlers::list_contact_clients),
        )
}

pub fn attendants() -> Router<AppState> {
    Router::new()
        .route(
            "/attendants/:id",
            get(handlers::get_attendant)
                .put(handlers::update_attendant)
                .patch(handlers::update_attendant),
        )
        .route(
            "/attendants/:id/clients",
            get(handlers::list_attendant_clients),
        )
}

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::app::contacts::ContactService;
use crate::app::projection::Projection;
use crate::app::users::UserService;
use crate::domain::user::{ResourceKind, SearchCriterion};
use crate::http::{Actor, AppError};
use crate::AppState;

// Output shape of each endpoint family.
const USER_DETAIL: Projection = Projection::OMIT_NULLS;
const ATTENDANT_DETAIL: Projection = Projection::INCLUDE_NULLS;
const ATTENDANT_CLIENTS: Projection = Projection::OMIT_NULLS;
const CLIENT_CONTACTS: Projection = Projection::INCLUDE_NULLS;
const CONTACT_CLIENTS: Projection = Projection::INCLUDE_NULLS;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::unprocessable(rejection.body_text()))
}

fn update_body(
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Map<String, Value>, AppError> {
    payload.map(|Json(body)| body).map_err(AppError::from)
}

fn render(body: serde_json::Result<Value>) -> Result<Json<Value>, AppError> {
    body.map(Json).map_err(|err| {
        tracing::error!(error = ?err, "failed to render response");
        AppError::internal("failed to render response")
    })
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.store.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

pub async fn get_user(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let id = path_id(path)?;
    let service = UserService::new(state.store.clone(), ResourceKind::User);
    let user = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = id, "failed to fetch user");
        AppError::internal("failed to fetch user")
    })?;

    match user {
        Some(user) => render(USER_DETAIL.user(&user)),
        None => Err(AppError::not_found("Subscriber not found.")),
    }
}

/// Serves both PUT and PATCH: only the keys present in the body are applied.
pub async fn update_user(
    path: Result<Path<i64>, PathRejection>,
    actor: Actor,
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_id(path)?;
    let payload = update_body(payload)?;

    let service = UserService::new(state.store.clone(), ResourceKind::User);
    let user = service.update(id, &payload, &actor.audit()).await?;

    render(USER_DETAIL.user(&user))
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cpf: Option<String>,
}

impl SearchRequest {
    /// Exactly one non-blank criterion, or `None`.
    fn single_criterion(self) -> Option<SearchCriterion> {
        let present = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut criteria: Vec<SearchCriterion> = [
            present(self.email).map(SearchCriterion::Email),
            present(self.phone).map(SearchCriterion::Phone),
            present(self.cpf).map(SearchCriterion::Cpf),
        ]
        .into_iter()
        .flatten()
        .collect();

        if criteria.len() == 1 {
            criteria.pop()
        } else {
            None
        }
    }
}

pub async fn search_user(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let criterion = payload.single_criterion().ok_or_else(|| {
        AppError::bad_request("Provide exactly one search criteria (email, phone, or cpf).")
    })?;

    let service = UserService::new(state.store.clone(), ResourceKind::User);
    let found = service.search(&criterion).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to search user");
        AppError::internal("failed to search user")
    })?;

    match found {
        Some(id) => Ok(Json(json!({ "id": id }))),
        None => Err(AppError::not_found("Subscriber not found.")),
    }
}

pub async fn list_client_contacts(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let client_id = path_id(path)?;
    let service = ContactService::new(state.store.clone());
    let contacts = service
        .contacts_of_client(client_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, client_id, "failed to list contacts");
            AppError::internal("failed to list contacts")
        })?;

    render(CLIENT_CONTACTS.users(&contacts))
}

pub async fn list_contact_clients(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let contact_id = path_id(path)?;
    let service = ContactService::new(state.store.clone());
    let links = service
        .clients_of_contact(contact_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, contact_id, "failed to list clients of contact");
            AppError::internal("failed to list clients")
        })?;

    let items = links
        .iter()
        .map(|link| CONTACT_CLIENTS.contact_link(link))
        .collect::<serde_json::Result<Vec<_>>>();
    render(items.map(Value::Array))
}

pub async fn get_attendant(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let id = path_id(path)?;
    let service = UserService::new(state.store.clone(), ResourceKind::Attendant);
    let attendant = service.get(id).await.map_err(|err| {
        tracing::error!(error = ?err, attendant_id = id, "failed to fetch attendant");
        AppError::internal("failed to fetch attendant")
    })?;

    match attendant {
        Some(attendant) => render(ATTENDANT_DETAIL.user(&attendant)),
        None => Err(AppError::not_found("Attendant not found.")),
    }
}

pub async fn update_attendant(
    path: Result<Path<i64>, PathRejection>,
    actor: Actor,
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let id = path_id(path)?;
    let payload = update_body(payload)?;

    let service = UserService::new(state.store.clone(), ResourceKind::Attendant);
    let attendant = service.update(id, &payload, &actor.audit()).await?;

    render(ATTENDANT_DETAIL.user(&attendant))
}

pub async fn list_attendant_clients(
    path: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let attendant_id = path_id(path)?;
    let service = ContactService::new(state.store.clone());
    let clients = service
        .clients_of_attendant(attendant_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, attendant_id, "failed to list attendant clients");
            AppError::internal("failed to list clients")
        })?;

    if clients.is_empty() {
        return Err(AppError::not_found("No clients found for the attendant"));
    }

    render(ATTENDANT_CLIENTS.users(&clients))
}

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::auth::TokenService;

use super::choices::{accept_submission, SubmittedChoice};
use super::domain::{NewUser, UniversityId, User, UserId};
use super::repository::{ExchangeStore, RepositoryError};
use super::service::{ExchangeService, ExchangeServiceError};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub uuid: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApplicationsRequest {
    pub applications: Vec<SubmittedChoice>,
}

/// Router builder exposing the student, session, and university endpoints.
pub fn exchange_router<S, T>(service: Arc<ExchangeService<S, T>>) -> Router
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    Router::new()
        .route("/auth/token", post(login_handler::<S, T>))
        .route("/users", post(register_handler::<S, T>))
        .route("/users/:user_id", get(public_profile_handler::<S, T>))
        .route("/me", get(own_profile_handler::<S, T>))
        .route("/me/applications", put(update_applications_handler::<S, T>))
        .route("/universities", get(universities_handler::<S, T>))
        .route(
            "/universities/:university_id",
            get(university_detail_handler::<S, T>),
        )
        .with_state(service)
}

pub(crate) async fn login_handler<S, T>(
    State(service): State<Arc<ExchangeService<S, T>>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    match service.login(&request.uuid) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn register_handler<S, T>(
    State(service): State<Arc<ExchangeService<S, T>>>,
    Json(user): Json<NewUser>,
) -> Response
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    match service.register(user) {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn own_profile_handler<S, T>(
    State(service): State<Arc<ExchangeService<S, T>>>,
    headers: HeaderMap,
) -> Response
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    let result = authenticated(&service, &headers).and_then(|user| service.profile(user.id));
    match result {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_applications_handler<S, T>(
    State(service): State<Arc<ExchangeService<S, T>>>,
    headers: HeaderMap,
    body: Result<Json<UpdateApplicationsRequest>, JsonRejection>,
) -> Response
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    // The token is checked before the body so anonymous callers always see 401.
    let result = authenticated(&service, &headers).and_then(|user| {
        let Json(request) =
            body.map_err(|rejection| ExchangeServiceError::InvalidBody(rejection.body_text()))?;
        let choices = accept_submission(&request.applications)?;
        service.update_applications(user.id, choices)
    });
    match result {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn public_profile_handler<S, T>(
    State(service): State<Arc<ExchangeService<S, T>>>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
) -> Response
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    let result = authenticated(&service, &headers)
        .and_then(|_| service.public_profile(UserId(user_id)));
    match result {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn universities_handler<S, T>(
    State(service): State<Arc<ExchangeService<S, T>>>,
    headers: HeaderMap,
) -> Response
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    let result = authenticated(&service, &headers).and_then(|_| service.universities());
    match result {
        Ok(universities) => (StatusCode::OK, Json(universities)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn university_detail_handler<S, T>(
    State(service): State<Arc<ExchangeService<S, T>>>,
    headers: HeaderMap,
    Path(university_id): Path<u32>,
) -> Response
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    let result = authenticated(&service, &headers)
        .and_then(|user| service.university_detail(&user, UniversityId(university_id)));
    match result {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err),
    }
}

fn authenticated<S, T>(
    service: &ExchangeService<S, T>,
    headers: &HeaderMap,
) -> Result<User, ExchangeServiceError>
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    service.authenticate(authorization)
}

pub(crate) fn error_response(err: ExchangeServiceError) -> Response {
    let status = match &err {
        ExchangeServiceError::Validation(_) | ExchangeServiceError::InvalidBody(_) => {
            StatusCode::BAD_REQUEST
        }
        ExchangeServiceError::BudgetExhausted | ExchangeServiceError::AccessDenied(_) => {
            StatusCode::FORBIDDEN
        }
        ExchangeServiceError::UnknownIdentity
        | ExchangeServiceError::UserNotFound(_)
        | ExchangeServiceError::UniversityNotFound(_) => StatusCode::NOT_FOUND,
        ExchangeServiceError::Unauthenticated => {
            let mut response = (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "not authenticated" })),
            )
                .into_response();
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            return response;
        }
        ExchangeServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ExchangeServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ExchangeServiceError::Repository(RepositoryError::Unavailable(_))
        | ExchangeServiceError::Token(_) => {
            error!(error = %err, "request failed");
            let payload = json!({ "error": "internal server error" });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::extract::{Json, Path, Query, State};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use herd_core::{
    BookingConstraint, BookingRequest, CurrentUser, NewAnimal, ProviderOrder, TriageEngine,
    Veterinarian, SPECIALIZATIONS,
};
use herd_desk::{ClinicDesk, ConsultationInput, DeskConfig, DeskError};
use herd_observability::AppMetrics;
use herd_storage::Store;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub desk: Arc<ClinicDesk<Store>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub store_backend: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    store: &'static str,
    metrics: herd_observability::MetricsSnapshot,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    #[serde(flatten)]
    constraint: BookingConstraint,
    #[serde(default)]
    order: ProviderOrder,
}

#[derive(Debug, Deserialize)]
struct RegisterAnimalRequest {
    owner: CurrentUser,
    animal: NewAnimal,
}

#[derive(Debug, Deserialize)]
struct OwnerQuery {
    owner_id: String,
}

#[derive(Debug, Deserialize)]
struct VeterinarianQuery {
    veterinarian_id: String,
}

pub async fn build_app(config: &DeskConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();
    let store = config.open_store().await?;
    let store_backend = store.backend_name();

    let desk = Arc::new(ClinicDesk::new(
        TriageEngine::standard(),
        Arc::new(store),
        metrics.clone(),
    ));
    if config.seed_directory {
        desk.seed_directory_if_empty().await?;
    }

    let state = ApiState {
        desk,
        metrics,
        api_key: config.api_key.clone(),
        store_backend,
    };

    Ok(build_router(state))
}

pub async fn serve(config: &DeskConfig) -> Result<()> {
    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, "herdcare api started");

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/triage", post(triage))
        .route("/v1/veterinarians/search", post(search_veterinarians))
        .route(
            "/v1/veterinarians/specializations",
            get(list_specializations),
        )
        .route("/v1/veterinarians/:id", get(get_veterinarian).put(update_veterinarian))
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/dates", get(booking_dates))
        .route("/v1/animals", post(register_animal).get(list_animals))
        .route("/v1/animals/:id", get(animal_profile))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        store: state.store_backend,
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn triage(
    State(state): State<ApiState>,
    Json(input): Json<ConsultationInput>,
) -> Response {
    match state.desk.consult(input).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn search_veterinarians(
    State(state): State<ApiState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    match state
        .desk
        .search_veterinarians(&request.constraint, request.order)
        .await
    {
        Ok(vets) => (StatusCode::OK, Json(vets)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_specializations() -> impl IntoResponse {
    Json(SPECIALIZATIONS)
}

async fn get_veterinarian(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.desk.veterinarian(&id).await {
        Ok(vet) => (StatusCode::OK, Json(vet)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_veterinarian(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(mut vet): Json<Veterinarian>,
) -> Response {
    vet.id = id;
    match state.desk.update_veterinarian(vet).await {
        Ok(vet) => (StatusCode::OK, Json(vet)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_booking(
    State(state): State<ApiState>,
    Json(request): Json<BookingRequest>,
) -> Response {
    match state.desk.book(request).await {
        Ok(booking) => (StatusCode::CREATED, Json(booking)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_bookings(
    State(state): State<ApiState>,
    Query(query): Query<VeterinarianQuery>,
) -> Response {
    match state
        .desk
        .bookings_for_veterinarian(&query.veterinarian_id)
        .await
    {
        Ok(bookings) => (StatusCode::OK, Json(bookings)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn booking_dates(State(state): State<ApiState>) -> impl IntoResponse {
    let dates = state
        .desk
        .available_dates()
        .into_iter()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>();
    Json(dates)
}

async fn register_animal(
    State(state): State<ApiState>,
    Json(request): Json<RegisterAnimalRequest>,
) -> Response {
    match state
        .desk
        .register_animal(&request.owner, request.animal)
        .await
    {
        Ok(animal) => (StatusCode::CREATED, Json(animal)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_animals(
    State(state): State<ApiState>,
    Query(query): Query<OwnerQuery>,
) -> Response {
    match state.desk.list_animals(&query.owner_id).await {
        Ok(animals) => (StatusCode::OK, Json(animals)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn animal_profile(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.desk.animal_profile(&id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: DeskError) -> Response {
    let status = match &err {
        DeskError::EmptyReport(_) | DeskError::Registry(_) => StatusCode::BAD_REQUEST,
        DeskError::UnknownVeterinarian(_) | DeskError::UnknownAnimal(_) => StatusCode::NOT_FOUND,
        DeskError::Booking(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DeskError::Storage(inner) => {
            tracing::error!(error = ?inner, "storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(serde_json::json!({
            "error": err.code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

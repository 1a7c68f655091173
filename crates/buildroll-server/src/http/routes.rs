use super::{AppError, AppResult, AppState, JsonResponse};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use buildroll_core::{Build, BuildrollError, RefreshSummary, RepositoryStats};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/build", get(random_build))
        .route("/refresh", post(refresh))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    healthy: bool,
    /// Both datasets have a non-empty cache.
    ready: bool,
    version: String,
    uptime_seconds: u64,
    datasets: Vec<RepositoryStats>,
}

async fn health(State(state): State<AppState>) -> Json<JsonResponse<HealthResponse>> {
    let datasets = state.service.stats();
    Json(JsonResponse::ok(HealthResponse {
        healthy: true,
        ready: datasets.iter().all(|s| s.items > 0),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        datasets,
    }))
}

#[derive(Deserialize)]
struct BuildQuery {
    characters: Option<usize>,
    equipment: Option<usize>,
}

async fn random_build(
    State(state): State<AppState>,
    query: Result<Query<BuildQuery>, QueryRejection>,
) -> AppResult<Json<JsonResponse<Build>>> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;

    // Counts above MAX_PICK_COUNT fail generator validation and map to 400.
    let build = match (query.characters, query.equipment) {
        (None, None) => state.service.get_random_build().await?,
        (characters, equipment) => {
            let defaults = state.service.generator().config();
            let characters = characters.unwrap_or(defaults.character_count);
            let equipment = equipment.unwrap_or(defaults.equipment_count);
            state
                .service
                .get_random_build_with(characters, equipment)
                .await?
        }
    };
    Ok(Json(JsonResponse::ok(build)))
}

#[derive(Serialize)]
struct DatasetRefresh {
    refreshed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DatasetRefresh {
    fn from_result(result: &Result<usize, BuildrollError>) -> Self {
        match result {
            Ok(n) => Self {
                refreshed: true,
                items: Some(*n),
                error: None,
            },
            Err(e) => Self {
                refreshed: false,
                items: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Serialize)]
struct RefreshResponse {
    characters: DatasetRefresh,
    equipment: DatasetRefresh,
}

async fn refresh(State(state): State<AppState>) -> Response {
    let summary: RefreshSummary = state.service.refresh_all().await;
    let body = RefreshResponse {
        characters: DatasetRefresh::from_result(&summary.characters),
        equipment: DatasetRefresh::from_result(&summary.equipment),
    };

    if summary.is_success() {
        (StatusCode::OK, Json(JsonResponse::ok(body))).into_response()
    } else {
        let response = JsonResponse {
            success: false,
            data: Some(body),
            error: Some(format!("refresh incomplete: {}", summary)),
        };
        (StatusCode::BAD_GATEWAY, Json(response)).into_response()
    }
}

async fn stats(State(state): State<AppState>) -> Json<JsonResponse<Vec<RepositoryStats>>> {
    Json(JsonResponse::ok(state.service.stats()))
}

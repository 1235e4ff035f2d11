use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use server_api::{
    add_entity, adjust_entity, bulk_replace, load_dashboard, remove_entity, reset_all, ApiContext,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        AddEntityRequest, AdjustOutcome, AdjustRequest, AdjustResponse, BulkReplaceRequest,
        BulkReplaceResponse, DashboardView,
    },
};
use storage::{prepare_database_url, Storage};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod page;

use app_state::AppState;
use config::load_settings;
use page::{describe_issues, parse_bulk_text, render_dashboard, Notice, NoticeKind};

#[derive(Debug, Deserialize)]
struct AddForm {
    name: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct AdjustForm {
    name: String,
    #[serde(default)]
    delta: String,
}

#[derive(Debug, Deserialize)]
struct NameForm {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BulkForm {
    #[serde(default)]
    rows: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, %database_url, "dashboard listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/add", post(page_add))
        .route("/adjust", post(page_adjust))
        .route("/delete", post(page_delete))
        .route("/reset", post(page_reset))
        .route("/bulk", post(page_bulk))
        .route("/healthz", get(healthz))
        .route(
            "/api/entities",
            get(api_list).post(api_add).put(api_bulk_replace),
        )
        .route("/api/entities/adjust", post(api_adjust))
        .route("/api/entities/:name", delete(api_remove))
        .route("/api/reset", post(api_reset))
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        error!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: ApiError) -> (StatusCode, Json<ApiError>) {
    if err.code == ErrorCode::Internal {
        error!(message = %err.message, "request failed");
    }
    (status_for(err.code), Json(err))
}

async fn render_with_notice(state: &AppState, status: StatusCode, notice: Notice) -> Response {
    match load_dashboard(&state.api).await {
        Ok(view) => (status, Html(render_dashboard(&view, Some(&notice)))).into_response(),
        Err(err) => {
            error!(message = %err.message, "failed to load dashboard");
            (StatusCode::INTERNAL_SERVER_ERROR, err.message).into_response()
        }
    }
}

async fn page_error(state: &AppState, err: ApiError) -> Response {
    let kind = match err.code {
        ErrorCode::Validation => NoticeKind::Warning,
        ErrorCode::NotFound | ErrorCode::Internal => NoticeKind::Error,
    };
    if err.code == ErrorCode::Internal {
        error!(message = %err.message, "request failed");
    }
    let status = status_for(err.code);
    render_with_notice(state, status, Notice::new(kind, err.message)).await
}

async fn page_result<T>(state: &AppState, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(_) => Redirect::to("/").into_response(),
        Err(err) => page_error(state, err).await,
    }
}

async fn dashboard_page(State(state): State<Arc<AppState>>) -> Response {
    match load_dashboard(&state.api).await {
        Ok(view) => Html(render_dashboard(&view, None)).into_response(),
        Err(err) => page_error(&state, err).await,
    }
}

async fn page_add(State(state): State<Arc<AppState>>, Form(form): Form<AddForm>) -> Response {
    let result = add_entity(&state.api, &form.name, &form.status).await;
    page_result(&state, result).await
}

async fn page_adjust(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AdjustForm>,
) -> Response {
    let result = adjust_entity(&state.api, &form.name, &form.delta).await;
    page_result(&state, result).await
}

async fn page_delete(State(state): State<Arc<AppState>>, Form(form): Form<NameForm>) -> Response {
    let result = remove_entity(&state.api, &form.name).await;
    page_result(&state, result).await
}

async fn page_reset(State(state): State<Arc<AppState>>) -> Response {
    let result = reset_all(&state.api).await;
    page_result(&state, result).await
}

async fn page_bulk(State(state): State<Arc<AppState>>, Form(form): Form<BulkForm>) -> Response {
    let rows = parse_bulk_text(&form.rows);
    match bulk_replace(&state.api, &rows).await {
        Ok(response) if response.issues.is_empty() => Redirect::to("/").into_response(),
        Ok(response) => {
            let notice = Notice::new(NoticeKind::Warning, describe_issues(&response.issues));
            (
                StatusCode::OK,
                Html(render_dashboard(&response.view, Some(&notice))),
            )
                .into_response()
        }
        Err(err) => page_error(&state, err).await,
    }
}

async fn api_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, (StatusCode, Json<ApiError>)> {
    let view = load_dashboard(&state.api).await.map_err(api_error)?;
    Ok(Json(view))
}

async fn api_add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddEntityRequest>,
) -> Result<Json<DashboardView>, (StatusCode, Json<ApiError>)> {
    let view = add_entity(&state.api, &req.name, &req.status)
        .await
        .map_err(api_error)?;
    Ok(Json(view))
}

async fn api_adjust(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdjustRequest>,
) -> Result<Json<AdjustResponse>, (StatusCode, Json<ApiError>)> {
    let response = adjust_entity(&state.api, &req.name, &req.delta)
        .await
        .map_err(api_error)?;
    if response.outcome == AdjustOutcome::Unchanged {
        info!(name = %req.name, "zero delta ignored");
    }
    Ok(Json(response))
}

async fn api_remove(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<DashboardView>, (StatusCode, Json<ApiError>)> {
    let view = remove_entity(&state.api, &name).await.map_err(api_error)?;
    Ok(Json(view))
}

async fn api_reset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, (StatusCode, Json<ApiError>)> {
    let view = reset_all(&state.api).await.map_err(api_error)?;
    Ok(Json(view))
}

async fn api_bulk_replace(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkReplaceRequest>,
) -> Result<Json<BulkReplaceResponse>, (StatusCode, Json<ApiError>)> {
    let response = bulk_replace(&state.api, &req.rows)
        .await
        .map_err(api_error)?;
    Ok(Json(response))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

use shared::{
    domain::RawRow,
    error::{ApiError, ErrorCode},
    protocol::{AdjustOutcome, AdjustResponse, BulkReplaceResponse, DashboardView},
};
use storage::Storage;
use tracing::info;

pub mod presenter;

use presenter::{apply_delta, parse_delta, parse_initial_status, present, validate_name};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Loads a fresh snapshot and prepares it for rendering. Nothing is cached
/// between calls.
pub async fn load_dashboard(ctx: &ApiContext) -> Result<DashboardView, ApiError> {
    let records = ctx.storage.load_all().await.map_err(internal)?;
    Ok(present(&records))
}

/// Adds `name_text` with the given initial status. An existing name is
/// overwritten rather than duplicated.
pub async fn add_entity(
    ctx: &ApiContext,
    name_text: &str,
    status_text: &str,
) -> Result<DashboardView, ApiError> {
    let name = validate_name(name_text)?;
    let status = parse_initial_status(status_text)?;

    ctx.storage.upsert(&name, status).await.map_err(internal)?;
    info!(%name, status, "entity upserted");
    load_dashboard(ctx).await
}

/// Applies a typed delta to an existing entity. A zero delta skips the write.
pub async fn adjust_entity(
    ctx: &ApiContext,
    name: &str,
    delta_text: &str,
) -> Result<AdjustResponse, ApiError> {
    let delta = parse_delta(delta_text)?;

    let current = ctx
        .storage
        .status_of(name)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, format!("no entity named '{name}'")))?;

    if delta == 0.0 {
        return Ok(AdjustResponse {
            outcome: AdjustOutcome::Unchanged,
            view: load_dashboard(ctx).await?,
        });
    }

    let next = apply_delta(current, delta_text)?;

    ctx.storage.upsert(name, next).await.map_err(internal)?;
    info!(%name, delta, status = next, "entity adjusted");
    Ok(AdjustResponse {
        outcome: AdjustOutcome::Applied,
        view: load_dashboard(ctx).await?,
    })
}

pub async fn remove_entity(ctx: &ApiContext, name: &str) -> Result<DashboardView, ApiError> {
    let removed = ctx.storage.delete(name).await.map_err(internal)?;
    if removed {
        info!(%name, "entity removed");
    }
    load_dashboard(ctx).await
}

pub async fn reset_all(ctx: &ApiContext) -> Result<DashboardView, ApiError> {
    let rows = ctx.storage.reset_all().await.map_err(internal)?;
    info!(rows, "statuses reset");
    load_dashboard(ctx).await
}

pub async fn bulk_replace(
    ctx: &ApiContext,
    rows: &[RawRow],
) -> Result<BulkReplaceResponse, ApiError> {
    let report = ctx.storage.replace_all(rows).await.map_err(internal)?;
    info!(
        submitted = rows.len(),
        kept = report.records.len(),
        issues = report.issues.len(),
        "snapshot replaced"
    );
    Ok(BulkReplaceResponse {
        issues: report.issues,
        view: load_dashboard(ctx).await?,
    })
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}

//! Read-only HTTP view over the latest snapshot
//!
//! Handlers only read through [`AppContext`]; a store error becomes a 500 for
//! that request and nothing else.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::html::render_items_page;
use crate::application::{AppContext, TickRecord};
use crate::domain::{GenerationInfo, Item, StockFilter, StorageError};

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    filter: Option<String>,
}

impl FilterQuery {
    fn stock_filter(&self) -> StockFilter {
        StockFilter::from_query(self.filter.as_deref())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub filter: StockFilter,
    pub count: usize,
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub latest: Option<GenerationInfo>,
    pub last_tick: Option<TickRecord>,
    pub check_interval_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(context: AppContext) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/items", get(api_items))
        .route("/api/status", get(api_status))
        .route("/healthz", get(healthz))
        .with_state(context)
}

/// Serve the view until `cancel` fires
pub async fn serve(
    listener: TcpListener,
    context: AppContext,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Read view listening on http://{}", addr);
    }
    axum::serve(listener, router(context))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

async fn index(
    State(context): State<AppContext>,
    Query(query): Query<FilterQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let filter = query.stock_filter();
    let (items, latest) = load(&context, filter)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let note = latest.map_or_else(
        || "No snapshot stored yet".to_string(),
        |info| {
            format!(
                "{} items, generation {} recorded {}",
                info.item_count,
                info.generation,
                info.recorded_at.format("%Y-%m-%d %H:%M:%S UTC")
            )
        },
    );
    Ok(Html(render_items_page(&items, filter, &note)))
}

async fn api_items(
    State(context): State<AppContext>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let filter = query.stock_filter();
    let (items, _) = load(&context, filter).await.map_err(internal_error)?;
    Ok(Json(ItemsResponse {
        filter,
        count: items.len(),
        items,
    }))
}

async fn api_status(State(context): State<AppContext>) -> Result<Json<StatusResponse>, ApiError> {
    let latest = context.store.latest_generation().await.map_err(internal_error)?;
    Ok(Json(StatusResponse {
        latest,
        last_tick: context.last_tick().await,
        check_interval_secs: context.check_interval.as_secs(),
    }))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn load(
    context: &AppContext,
    filter: StockFilter,
) -> Result<(Vec<Item>, Option<GenerationInfo>), StorageError> {
    let (items, latest) = context.store.read_latest_snapshot().await?;
    Ok((filter.apply(items), latest))
}

fn internal_error(err: StorageError) -> ApiError {
    error!("Read view storage error: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            message: err.to_string(),
        }),
    )
}

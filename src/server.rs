//! HTTP surface over the engine.
//!
//! This layer plays the caller role: it validates game metadata, runs engine
//! operations on the blocking pool and forwards committed claims to the
//! notification gateway.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument, warn};

use crate::engine::{
    AllocationError, Board, ClaimOutcome, Claimant, Grid, GridId, NewGrid, QuarterWinner,
    ScoreRecord, Settlement, SettlementError, SquareAllocator,
};
use crate::grid::{Payouts, Position, SealedAxes};
use crate::notify::{GridEvent, NotificationGateway, announce};
use crate::store::SquareStore;

/// Shared handler state.
pub struct AppState<S> {
    allocator: Arc<SquareAllocator<S>>,
    settlement: Arc<Settlement<S>>,
    gateway: Arc<dyn NotificationGateway>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            allocator: Arc::clone(&self.allocator),
            settlement: Arc::clone(&self.settlement),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<S: SquareStore + Clone> AppState<S> {
    /// Creates handler state over `store`, publishing events to `gateway`.
    #[instrument(skip(store, gateway))]
    pub fn new(store: S, gateway: Arc<dyn NotificationGateway>) -> Self {
        info!("Creating HTTP app state");
        Self {
            allocator: Arc::new(SquareAllocator::new(store.clone())),
            settlement: Arc::new(Settlement::new(store)),
            gateway,
        }
    }
}

/// Request body for opening a grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGridRequest {
    /// Unique grid name.
    pub name: String,
    /// Team along the columns.
    pub x_label: String,
    /// Team along the rows.
    pub y_label: String,
    /// Price per cell in cents.
    pub price_cents: i64,
    /// Percentage paid for each quarter; must total 100.
    pub payouts: [i64; 4],
}

impl CreateGridRequest {
    /// Checks the metadata the engine itself does not validate.
    fn validate(self) -> Result<NewGrid, ApiError> {
        let required = |value: String, what: &str| {
            let value = value.trim().to_string();
            if value.is_empty() {
                Err(ApiError::validation(format!("{} is required", what)))
            } else {
                Ok(value)
            }
        };
        let name = required(self.name, "Name")?;
        let x_label = required(self.x_label, "Column team name")?;
        let y_label = required(self.y_label, "Row team name")?;

        let price_cents = u32::try_from(self.price_cents)
            .ok()
            .filter(|p| *p > 0 && i32::try_from(*p).is_ok())
            .ok_or_else(|| ApiError::validation("Price must be greater than 0"))?;

        let mut weights = [0u8; 4];
        for (slot, value) in weights.iter_mut().zip(self.payouts) {
            *slot = u8::try_from(value)
                .ok()
                .filter(|w| *w <= 100)
                .ok_or_else(|| ApiError::validation(format!("Payout {} is not a percentage", value)))?;
        }
        let payouts = Payouts::new(weights);
        if payouts.total() != 100 {
            return Err(ApiError::validation(format!(
                "Payouts must total 100% (currently {}%)",
                payouts.total()
            )));
        }

        Ok(NewGrid::new(name, x_label, y_label, price_cents, payouts))
    }
}

/// Request body for claiming cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Name shown on the claimed cells.
    pub display_name: String,
    /// Optional contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Optional contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Cells to reserve, 1 through 100.
    pub positions: Vec<i64>,
}

/// Request body for recording a quarter's score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Running score of the column team.
    pub x_score: i64,
    /// Running score of the row team.
    pub y_score: i64,
}

/// JSON error body: `{"error": {"code", "message", "positions"}}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    positions: Vec<Position>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            positions: Vec::new(),
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION", message)
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "Internal storage error",
        )
    }

    /// HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AllocationError> for ApiError {
    fn from(err: AllocationError) -> Self {
        let status = match &err {
            AllocationError::Validation(_) => StatusCode::BAD_REQUEST,
            AllocationError::NotFound(_) => StatusCode::NOT_FOUND,
            AllocationError::Closed(_)
            | AllocationError::Capacity { .. }
            | AllocationError::Conflict { .. } => StatusCode::CONFLICT,
            AllocationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut api = Self::new(status, (&err).into(), err.to_string());
        if let AllocationError::Conflict { positions } = err {
            api.positions = positions;
        }
        api
    }
}

impl From<SettlementError> for ApiError {
    fn from(err: SettlementError) -> Self {
        let status = match &err {
            SettlementError::Validation(_) => StatusCode::BAD_REQUEST,
            SettlementError::NotFound(_) => StatusCode::NOT_FOUND,
            SettlementError::NotSealed(_) => StatusCode::CONFLICT,
            SettlementError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, (&err).into(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection, "Rejected request body");
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!(error = %rejection, "Rejected path parameters");
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(serde_json::json!({ "error": self }))).into_response()
    }
}

/// Runs a synchronous engine call on the blocking pool.
async fn blocking<T, E, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!(error = %e, "Blocking engine task failed");
            ApiError::internal()
        })?
        .map_err(Into::into)
}

/// Builds the router.
#[instrument(skip(state))]
pub fn router<S: SquareStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/grids", post(create_grid::<S>).get(list_grids::<S>))
        .route("/grids/{grid_id}", get(get_board::<S>))
        .route("/grids/{grid_id}/claims", post(claim_cells::<S>))
        .route("/grids/{grid_id}/close", post(close_grid::<S>))
        .route(
            "/grids/{grid_id}/scores/{quarter}",
            put(record_score::<S>).delete(delete_score::<S>),
        )
        .route("/grids/{grid_id}/winners", get(winners::<S>))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

#[instrument(skip_all)]
async fn create_grid<S: SquareStore + 'static>(
    State(state): State<AppState<S>>,
    req: Result<Json<CreateGridRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Grid>), ApiError> {
    let Json(req) = req?;
    debug!(name = %req.name, "Opening grid");
    let grid = req.validate()?;
    let allocator = Arc::clone(&state.allocator);
    let created = blocking(move || allocator.open_grid(grid)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
async fn list_grids<S: SquareStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Grid>>, ApiError> {
    let settlement = Arc::clone(&state.settlement);
    let grids = blocking(move || settlement.grids()).await?;
    Ok(Json(grids))
}

#[instrument(skip(state))]
async fn get_board<S: SquareStore + 'static>(
    State(state): State<AppState<S>>,
    grid_id: Result<Path<GridId>, PathRejection>,
) -> Result<Json<Board>, ApiError> {
    let Path(grid_id) = grid_id?;
    let settlement = Arc::clone(&state.settlement);
    let board = blocking(move || settlement.board(grid_id)).await?;
    Ok(Json(board))
}

#[instrument(skip_all)]
async fn claim_cells<S: SquareStore + 'static>(
    State(state): State<AppState<S>>,
    grid_id: Result<Path<GridId>, PathRejection>,
    req: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClaimOutcome>), ApiError> {
    let Path(grid_id) = grid_id?;
    let Json(req) = req?;
    debug!(grid_id, display_name = %req.display_name, count = req.positions.len(), "Claiming cells");
    let claimant = Claimant::new(req.display_name, req.email, req.phone);
    let allocator = Arc::clone(&state.allocator);
    let positions = req.positions;
    let outcome = blocking(move || allocator.claim(grid_id, claimant, &positions)).await?;

    let gateway = Arc::clone(&state.gateway);
    let announced = outcome.clone();
    tokio::spawn(async move {
        announce(gateway.as_ref(), &announced).await;
    });

    Ok((StatusCode::CREATED, Json(outcome)))
}

#[instrument(skip(state))]
async fn close_grid<S: SquareStore + 'static>(
    State(state): State<AppState<S>>,
    grid_id: Result<Path<GridId>, PathRejection>,
) -> Result<Json<SealedAxes>, ApiError> {
    let Path(grid_id) = grid_id?;
    let allocator = Arc::clone(&state.allocator);
    let axes = blocking(move || allocator.close(grid_id)).await?;

    let gateway = Arc::clone(&state.gateway);
    tokio::spawn(async move {
        if let Err(e) = gateway.publish(GridEvent::GridSealed { grid_id }).await {
            warn!(error = %e, grid_id, "Failed to publish grid event");
        }
    });

    Ok(Json(axes))
}

#[instrument(skip(state))]
async fn record_score<S: SquareStore + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<(GridId, i64)>, PathRejection>,
    req: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreRecord>, ApiError> {
    let Path((grid_id, quarter)) = path?;
    let Json(req) = req?;
    let settlement = Arc::clone(&state.settlement);
    let score =
        blocking(move || settlement.record_score(grid_id, quarter, req.x_score, req.y_score))
            .await?;
    Ok(Json(score))
}

#[instrument(skip(state))]
async fn delete_score<S: SquareStore + 'static>(
    State(state): State<AppState<S>>,
    path: Result<Path<(GridId, i64)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((grid_id, quarter)) = path?;
    let settlement = Arc::clone(&state.settlement);
    let removed = blocking(move || settlement.delete_score(grid_id, quarter)).await?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("No score recorded for quarter {}", quarter),
        ))
    }
}

#[instrument(skip(state))]
async fn winners<S: SquareStore + 'static>(
    State(state): State<AppState<S>>,
    grid_id: Result<Path<GridId>, PathRejection>,
) -> Result<Json<Vec<QuarterWinner>>, ApiError> {
    let Path(grid_id) = grid_id?;
    let settlement = Arc::clone(&state.settlement);
    let winners = blocking(move || settlement.winners(grid_id)).await?;
    Ok(Json(winners))
}

//! Canvas API endpoints
//!
//! POST   /api/canvas/create       - Create an empty canvas
//! PUT    /api/canvas/update       - Replace a canvas's elements
//! GET    /api/canvas/load/:id     - Load a canvas
//! PUT    /api/canvas/share/:id    - Share with a user by email
//! PUT    /api/canvas/unshare/:id  - Revoke a user's access
//! DELETE /api/canvas/delete/:id   - Delete a canvas (owner only)
//! GET    /api/canvas/list         - Canvases owned by or shared with the caller
//! PUT    /api/canvas/update-name  - Rename a canvas

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use inkboard_core::{Canvas, CanvasId, CanvasSummary, Element, UserId};
use inkboard_realtime::CanvasService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiResponse, ApiResult};
use crate::middleware::auth::RequireAuth;

/// Response to a create request
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCanvasResponse {
    pub canvas_id: CanvasId,
}

/// Request to replace a canvas's elements
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateElementsRequest {
    pub canvas_id: CanvasId,
    pub elements: Vec<Element>,
}

/// Request to share a canvas
#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub email: String,
}

/// Response to a share request
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub user_id: UserId,
}

/// Request to revoke access
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnshareRequest {
    pub user_id: UserId,
}

/// Request to rename a canvas
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub canvas_id: CanvasId,
    pub name: String,
}

/// Sessions reached by a change that was pushed to the live room
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomNotice {
    pub notified: usize,
}

async fn create_canvas(
    RequireAuth(auth): RequireAuth,
    State(service): State<Arc<CanvasService>>,
) -> ApiResult<CreateCanvasResponse> {
    let canvas_id = service.create(&auth.user_id).await?;
    Ok(Json(ApiResponse::success(CreateCanvasResponse { canvas_id })))
}

async fn update_elements(
    RequireAuth(auth): RequireAuth,
    State(service): State<Arc<CanvasService>>,
    Json(request): Json<UpdateElementsRequest>,
) -> ApiResult<()> {
    service
        .replace_elements(request.canvas_id, &auth.user_id, &request.elements)
        .await?;
    Ok(Json(ApiResponse::success(())))
}

async fn load_canvas(
    RequireAuth(auth): RequireAuth,
    State(service): State<Arc<CanvasService>>,
    Path(id): Path<CanvasId>,
) -> ApiResult<Canvas> {
    let canvas = service.load(id, &auth.user_id).await?;
    Ok(Json(ApiResponse::success(canvas)))
}

async fn share_canvas(
    RequireAuth(auth): RequireAuth,
    State(service): State<Arc<CanvasService>>,
    Path(id): Path<CanvasId>,
    Json(request): Json<ShareRequest>,
) -> ApiResult<ShareResponse> {
    let user_id = service.share(id, &auth.user_id, &request.email).await?;
    Ok(Json(ApiResponse::success(ShareResponse { user_id })))
}

async fn unshare_canvas(
    RequireAuth(auth): RequireAuth,
    State(service): State<Arc<CanvasService>>,
    Path(id): Path<CanvasId>,
    Json(request): Json<UnshareRequest>,
) -> ApiResult<()> {
    service.unshare(id, &auth.user_id, &request.user_id).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn delete_canvas(
    RequireAuth(auth): RequireAuth,
    State(service): State<Arc<CanvasService>>,
    Path(id): Path<CanvasId>,
) -> ApiResult<RoomNotice> {
    let notified = service.delete(id, &auth.user_id).await?;
    Ok(Json(ApiResponse::success(RoomNotice { notified })))
}

async fn list_canvases(
    RequireAuth(auth): RequireAuth,
    State(service): State<Arc<CanvasService>>,
) -> ApiResult<Vec<CanvasSummary>> {
    let canvases = service.list(&auth.user_id).await?;
    Ok(Json(ApiResponse::success(canvases)))
}

async fn rename_canvas(
    RequireAuth(auth): RequireAuth,
    State(service): State<Arc<CanvasService>>,
    Json(request): Json<RenameRequest>,
) -> ApiResult<RoomNotice> {
    let notified = service
        .rename(request.canvas_id, &auth.user_id, &request.name)
        .await?;
    Ok(Json(ApiResponse::success(RoomNotice { notified })))
}

/// Create canvas routes
pub fn canvas_routes(service: Arc<CanvasService>) -> Router {
    Router::new()
        .route("/api/canvas/create", post(create_canvas))
        .route("/api/canvas/update", put(update_elements))
        .route("/api/canvas/load/:id", get(load_canvas))
        .route("/api/canvas/share/:id", put(share_canvas))
        .route("/api/canvas/unshare/:id", put(unshare_canvas))
        .route("/api/canvas/delete/:id", delete(delete_canvas))
        .route("/api/canvas/list", get(list_canvases))
        .route("/api/canvas/update-name", put(rename_canvas))
        .with_state(service)
}

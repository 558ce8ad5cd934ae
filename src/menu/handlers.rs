use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    auth::{AuthUser, StaffAccess},
    menu::{
        catalog::{CatalogError, MenuStatus},
        model::{Category, FoodItem, FoodItemPatch, NewFoodItem},
        search::{filter_items, parse_category_tab},
    },
    notice::{Notice, WithNotice},
    pwa::{interpret, VoiceAction, VoiceReport},
    state::AppState,
};

pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/menu", get(browse))
        .route("/menu/voice-search", post(voice_search))
}

pub fn staff_menu_routes() -> Router<AppState> {
    Router::new()
        .route("/staff/menu/status", get(menu_status))
        .route("/staff/menu", post(create_item))
        .route("/staff/menu/:id", patch(update_item).delete(delete_item))
        .route("/staff/menu/:id/stock", post(toggle_stock))
}

impl CatalogError {
    pub fn rejection(&self) -> (StatusCode, String) {
        let status = match self {
            CatalogError::NotFound => StatusCode::NOT_FOUND,
            CatalogError::Invalid => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub q: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MenuView {
    pub categories: Vec<&'static str>,
    pub items: Vec<FoodItem>,
}

fn category_tabs() -> Vec<&'static str> {
    std::iter::once("All").chain(Category::ALL.iter().map(|c| c.as_str())).collect()
}

#[instrument(skip(state, _user))]
pub async fn browse(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<BrowseParams>,
) -> Result<Json<MenuView>, (StatusCode, String)> {
    let category = parse_category_tab(params.category.as_deref()).map_err(|e| {
        warn!(error = %e, "bad category tab");
        (StatusCode::BAD_REQUEST, e)
    })?;
    let items = state.catalog.items().await;
    Ok(Json(MenuView {
        categories: category_tabs(),
        items: filter_items(&items, params.q.as_deref(), category),
    }))
}

#[derive(Debug, Serialize)]
pub struct VoiceSearchResponse {
    #[serde(flatten)]
    pub action: VoiceAction,
    /// Present when the transcript was used as a search.
    pub items: Option<Vec<FoodItem>>,
}

#[instrument(skip(state, _user, report))]
pub async fn voice_search(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(report): Json<VoiceReport>,
) -> Json<VoiceSearchResponse> {
    let action = interpret(report.into());
    let items = match &action {
        VoiceAction::Search { query } => {
            Some(filter_items(&state.catalog.items().await, Some(query), None))
        }
        _ => None,
    };
    Json(VoiceSearchResponse { action, items })
}

#[instrument(skip(state, _staff))]
pub async fn menu_status(State(state): State<AppState>, _staff: StaffAccess) -> Json<MenuStatus> {
    Json(state.catalog.status().await)
}

#[instrument(skip(state, staff, payload), fields(user_id = %staff.0.id))]
pub async fn create_item(
    State(state): State<AppState>,
    staff: StaffAccess,
    Json(payload): Json<NewFoodItem>,
) -> Result<(StatusCode, Json<WithNotice<FoodItem>>), (StatusCode, String)> {
    let (item, notice) = state.catalog.create(payload).await.map_err(|e| e.rejection())?;
    info!(item_id = %item.id, "menu item added");
    Ok((StatusCode::CREATED, Json(WithNotice { data: item, notice })))
}

#[instrument(skip(state, staff, payload), fields(user_id = %staff.0.id))]
pub async fn update_item(
    State(state): State<AppState>,
    staff: StaffAccess,
    Path(id): Path<String>,
    Json(payload): Json<FoodItemPatch>,
) -> Result<Json<WithNotice<FoodItem>>, (StatusCode, String)> {
    let (item, notice) = state.catalog.update(&id, payload).await.map_err(|e| e.rejection())?;
    Ok(Json(WithNotice { data: item, notice }))
}

#[instrument(skip(state, staff), fields(user_id = %staff.0.id))]
pub async fn toggle_stock(
    State(state): State<AppState>,
    staff: StaffAccess,
    Path(id): Path<String>,
) -> Result<Json<WithNotice<FoodItem>>, (StatusCode, String)> {
    let (item, notice) = state.catalog.toggle_stock(&id).await.map_err(|e| e.rejection())?;
    Ok(Json(WithNotice { data: item, notice }))
}

#[instrument(skip(state, staff), fields(user_id = %staff.0.id))]
pub async fn delete_item(
    State(state): State<AppState>,
    staff: StaffAccess,
    Path(id): Path<String>,
) -> Result<Json<Notice>, (StatusCode, String)> {
    let notice = state.catalog.delete(&id).await.map_err(|e| e.rejection())?;
    Ok(Json(notice))
}

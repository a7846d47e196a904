//! Branch API Handlers

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::api::CurrentUser;
use crate::branches::resolver;
use crate::core::ServerState;
use crate::db::repository::branch;
use crate::utils::{AppError, AppResult};
use shared::models::{
    Branch, BranchCreate, BranchUpdate, DataIsolationMode, Role, SharedEntity, UserBranchAssignment,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub is_main: Option<bool>,
    pub data_isolation_mode: Option<DataIsolationMode>,
    pub share_products: Option<bool>,
    pub share_customers: Option<bool>,
    pub share_inventory: Option<bool>,
    pub share_suppliers: Option<bool>,
    pub share_categories: Option<bool>,
    pub share_employees: Option<bool>,
    pub can_view_other_branches: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub user_id: String,
    pub is_primary: Option<bool>,
}

fn require_manager(user: &CurrentUser) -> AppResult<()> {
    if matches!(user.role, Role::Admin | Role::Manager) {
        Ok(())
    } else {
        Err(AppError::forbidden("Branch administration requires manager role"))
    }
}

/// GET /api/branches - active branches, main branch first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Branch>>> {
    let branches = branch::find_all(state.pool()).await?;
    Ok(Json(branches))
}

/// GET /api/branches/current - the process-wide active branch
pub async fn current(State(state): State<ServerState>) -> AppResult<Json<Option<Branch>>> {
    let branch = state.switcher.active_branch().await?;
    Ok(Json(branch))
}

/// GET /api/branches/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Branch>> {
    let branch = branch::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Branch {}", id)))?;
    Ok(Json(branch))
}

/// GET /api/branches/:id/sharing - effective per-entity visibility under
/// the branch's isolation policy
pub async fn sharing(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BTreeMap<&'static str, bool>>> {
    let branch = branch::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Branch {}", id)))?;
    let map = SharedEntity::ALL
        .iter()
        .map(|&entity| (entity.as_str(), resolver::is_data_shared(Some(&branch), entity)))
        .collect();
    Ok(Json(map))
}

/// POST /api/branches
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateRequest>,
) -> AppResult<Json<Branch>> {
    require_manager(&user)?;
    payload.validate()?;

    let data = BranchCreate {
        name: payload.name,
        is_main: payload.is_main,
        data_isolation_mode: payload.data_isolation_mode,
        share_products: payload.share_products,
        share_customers: payload.share_customers,
        share_inventory: payload.share_inventory,
        share_suppliers: payload.share_suppliers,
        share_categories: payload.share_categories,
        share_employees: payload.share_employees,
        can_view_other_branches: payload.can_view_other_branches,
    };
    let created = branch::create(state.pool(), data).await?;
    tracing::info!(branch_id = created.id, user_id = %user.id, "Branch created");
    Ok(Json(created))
}

/// PUT /api/branches/:id
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<BranchUpdate>,
) -> AppResult<Json<Branch>> {
    require_manager(&user)?;
    let updated = branch::update(state.pool(), id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Branch {}", id)))?;
    Ok(Json(updated))
}

/// POST /api/branches/:id/switch - move the active branch pointer
pub async fn switch(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Branch>> {
    let branch = state.switcher.switch(&user.id, user.role, id).await?;
    Ok(Json(branch))
}

/// GET /api/branches/assignments - the caller's branch memberships
pub async fn my_assignments(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<UserBranchAssignment>>> {
    let assignments = branch::assignments_for_user(state.pool(), &user.id).await?;
    Ok(Json(assignments))
}

/// POST /api/branches/:id/assignments - grant a user access to a branch
pub async fn assign(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRequest>,
) -> AppResult<Json<UserBranchAssignment>> {
    require_manager(&user)?;
    branch::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Branch {}", id)))?;
    let assignment = branch::assign_user(
        state.pool(),
        &payload.user_id,
        id,
        payload.is_primary.unwrap_or(false),
    )
    .await?;
    Ok(Json(assignment))
}

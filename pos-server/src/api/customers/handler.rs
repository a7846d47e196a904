//! Customer API Handlers
//!
//! Classification is derived server-side: handlers load the note
//! history, run the segmentation rules, and persist the result. Clients
//! never write `color_tag` or `is_active` directly.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::api::CurrentUser;
use crate::branches::resolver;
use crate::core::ServerState;
use crate::db::repository::customer::{self, CustomerFilter};
use crate::segmentation;
use crate::utils::{AppError, AppResult};
use shared::models::{
    ColorTag, Customer, CustomerCreate, CustomerNote, CustomerUpdate, LoyaltyLevel, SharedEntity,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub color_tag: Option<ColorTag>,
    pub loyalty_level: Option<LoyaltyLevel>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub loyalty_level: Option<LoyaltyLevel>,
    pub last_visit: Option<i64>,
    pub branch_id: Option<i64>,
    pub is_shared: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NoteRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Customer detail response (customer + note history)
#[derive(serde::Serialize)]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub notes: Vec<CustomerNote>,
}

/// Branch visibility clause for the caller, from the active branch's
/// isolation policy. Customers shared under the policy means no filter.
async fn branch_clause(state: &ServerState, user: &CurrentUser) -> AppResult<String> {
    let branch = state.switcher.active_branch().await?;
    if resolver::is_data_shared(branch.as_ref(), SharedEntity::Customers) {
        return Ok(String::new());
    }
    let can_view = branch
        .as_ref()
        .map(|b| b.can_view_other_branches)
        .unwrap_or(false);
    Ok(resolver::branch_filter_clause(
        branch.as_ref(),
        user.role,
        can_view,
    ))
}

/// GET /api/customers - list with segment filters and branch visibility
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Customer>>> {
    let filter = CustomerFilter {
        color_tag: query.color_tag,
        loyalty_level: query.loyalty_level,
        active: query.active,
        search: query.search,
        branch_clause: branch_clause(&state, &user).await?,
    };
    let customers = customer::find_all(state.pool(), &filter).await?;
    Ok(Json(customers))
}

/// GET /api/customers/inactive - customers outside the 365-day window
pub async fn list_inactive(
    State(state): State<ServerState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = customer::find_inactive_365d(state.pool(), shared::util::now_millis()).await?;
    Ok(Json(customers))
}

/// GET /api/customers/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<CustomerDetail>> {
    let customer = customer::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))?;
    let notes = customer::notes_for(state.pool(), id).await?;
    Ok(Json(CustomerDetail { customer, notes }))
}

/// POST /api/customers
///
/// `color_tag` starts at `new`; the creation-time `is_active` default
/// uses the 365-day predicate (a customer last seen 11 months ago still
/// counts as active here).
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateRequest>,
) -> AppResult<Json<Customer>> {
    payload.validate()?;

    let now = shared::util::now_millis();
    let is_active = match payload.last_visit {
        Some(ts) => !segmentation::is_inactive_365d(ts, now),
        None => true,
    };
    let branch_id = payload.branch_id.or(state.switcher.active_branch_id());
    let data = CustomerCreate {
        name: payload.name,
        phone: payload.phone,
        email: payload.email,
        loyalty_level: payload.loyalty_level,
        last_visit: payload.last_visit,
        branch_id,
        is_shared: payload.is_shared,
    };
    let created = customer::create(state.pool(), data, is_active).await?;
    tracing::info!(customer_id = created.id, user_id = %user.id, "Customer created");
    Ok(Json(created))
}

/// PUT /api/customers/:id
///
/// Runs the classifier over the stored notes, persists the derived
/// fields along with the update, then reconciles `is_active` against
/// the persisted `last_visit` with a second write when the first pass
/// disagrees with the stored row.
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerUpdate>,
) -> AppResult<Json<Customer>> {
    let existing = customer::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))?;
    let notes = customer::notes_for(state.pool(), id).await?;

    let now = shared::util::now_millis();
    let effective_last_visit = payload.last_visit.or(existing.last_visit);
    let classification = segmentation::classify(
        &notes,
        effective_last_visit,
        existing.color_tag,
        existing.is_active,
        now,
    );

    let updated = customer::update(
        state.pool(),
        id,
        &payload,
        classification.color_tag,
        classification.is_active,
    )
    .await?
    .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))?;

    // Reconciliation pass: re-derive from what actually landed in the
    // row and correct the flag if the two disagree
    let persisted_active = match updated.last_visit {
        Some(ts) => segmentation::is_recently_active_90d(ts, now),
        None => updated.is_active,
    };
    if persisted_active != updated.is_active {
        let reconciled = customer::set_active(state.pool(), id, persisted_active)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))?;
        return Ok(Json(reconciled));
    }

    Ok(Json(updated))
}

/// GET /api/customers/:id/notes
pub async fn list_notes(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<CustomerNote>>> {
    customer::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))?;
    let notes = customer::notes_for(state.pool(), id).await?;
    Ok(Json(notes))
}

/// POST /api/customers/:id/notes
///
/// Adding a note can change the segment (a complaint, or the check-in
/// that crosses the VIP threshold), so the classifier reruns afterwards.
pub async fn add_note(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<NoteRequest>,
) -> AppResult<Json<CustomerDetail>> {
    payload.validate()?;

    let existing = customer::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))?;

    customer::add_note(state.pool(), id, &payload.content).await?;
    let notes = customer::notes_for(state.pool(), id).await?;

    let now = shared::util::now_millis();
    let classification = segmentation::classify(
        &notes,
        existing.last_visit,
        existing.color_tag,
        existing.is_active,
        now,
    );
    let customer = if classification.color_tag != existing.color_tag
        || classification.is_active != existing.is_active
    {
        customer::update(
            state.pool(),
            id,
            &CustomerUpdate::default(),
            classification.color_tag,
            classification.is_active,
        )
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))?
    } else {
        existing
    };

    Ok(Json(CustomerDetail { customer, notes }))
}

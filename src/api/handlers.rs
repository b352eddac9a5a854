use crate::{
    api::models::*,
    config::CONFIG,
    core::{
        errors::LedgerError,
        models::{
            audit::{AppLog, GroupAudit},
            expense::Expense,
            group::Group,
            member::MemberId,
            settlement::Settlement,
        },
        services::{GroupBalances, LedgerService},
    },
    infrastructure::{
        logging::in_memory::InMemoryLogging, notification::log::LogDispatcher, storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

pub type AppService = LedgerService<InMemoryLogging, InMemoryStorage, LogDispatcher>;

const DEFAULT_RECENT_LIMIT: usize = 20;

// Define API routes
pub fn api_routes(service: Arc<AppService>) -> Router {
    Router::new()
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/{group_id}", get(get_group).delete(delete_group))
        .route("/groups/{group_id}/members", post(add_member))
        .route(
            "/groups/{group_id}/members/{member_id}",
            axum::routing::delete(remove_member),
        )
        .route("/groups/{group_id}/balances", get(get_group_balances))
        .route("/groups/{group_id}/settlements", get(list_settlements))
        .route("/groups/{group_id}/audits", get(get_group_audits))
        .route("/balances", get(get_all_balances))
        .route("/expenses", post(add_expense))
        .route("/expenses/group/{group_id}", get(list_expenses))
        .route("/expenses/recent", get(recent_expenses))
        .route("/settlements", post(request_settlement))
        .route("/settlements/{settlement_id}", get(get_settlement))
        .route("/settlements/{settlement_id}/outcome", post(report_outcome))
        .route("/logs", get(get_app_logs))
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created successfully", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Duplicate member id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn create_group(
    State(service): State<Arc<AppService>>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let currency = req.currency.unwrap_or(CONFIG.default_currency);
    let group = service
        .create_group(req.name, req.description, currency, req.members)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups",
    responses(
        (status = 200, description = "All groups", body = Vec<Group>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn list_groups(State(service): State<Arc<AppService>>) -> Result<Json<Vec<Group>>, ApiError> {
    Ok(Json(service.list_groups().await?))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group to retrieve")
    ),
    responses(
        (status = 200, description = "Group retrieved successfully", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = service
        .get_group(&group_id)
        .await?
        .ok_or_else(|| LedgerError::GroupNotFound(group_id.clone()))?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group to delete")
    ),
    responses(
        (status = 204, description = "Group deleted successfully"),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_group(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_group(&group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    request_body = AddMemberRequest,
    responses(
        (status = 200, description = "Member added successfully", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn add_member(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = service.add_member(&group_id, req.into()).await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/members/{member_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("member_id" = String, Path, description = "ID of the member to remove")
    ),
    responses(
        (status = 200, description = "Member removed successfully", body = Group),
        (status = 404, description = "Group or member not found", body = ErrorResponse),
        (status = 409, description = "Member is referenced by expenses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn remove_member(
    State(service): State<Arc<AppService>>,
    Path((group_id, member_id)): Path<(String, String)>,
) -> Result<Json<Group>, ApiError> {
    let group = service.remove_member(&group_id, &MemberId(member_id)).await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/balances",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Current balances and suggested transfers", body = GroupBalances),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group_balances(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupBalances>, ApiError> {
    Ok(Json(service.get_balances(&group_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/balances",
    responses(
        (status = 200, description = "Balances of every group", body = Vec<GroupBalances>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_all_balances(
    State(service): State<Arc<AppService>>,
) -> Result<Json<Vec<GroupBalances>>, ApiError> {
    let group_ids: Vec<String> = service.list_groups().await?.into_iter().map(|group| group.id).collect();
    Ok(Json(service.get_balances_for(&group_ids).await?))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/settlements",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Settlement history, oldest first", body = Vec<Settlement>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn list_settlements(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    Ok(Json(service.list_settlements(&group_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/audits",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group audit trail", body = Vec<GroupAudit>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group_audits(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupAudit>>, ApiError> {
    Ok(Json(service.get_group_audits(&group_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = AddExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = Expense),
        (status = 400, description = "Invalid expense", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn add_expense(
    State(service): State<Arc<AppService>>,
    Json(req): Json<AddExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let group = service
        .get_group(&req.group_id)
        .await?
        .ok_or_else(|| LedgerError::GroupNotFound(req.group_id.clone()))?;
    let draft = req.into_draft(group.currency)?;
    let expense = service.create_expense(&group.id, draft).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/expenses/group/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Ledger in the order it was recorded", body = Vec<Expense>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn list_expenses(
    State(service): State<Arc<AppService>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    Ok(Json(service.list_expenses(&group_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/expenses/recent",
    params(RecentExpensesQuery),
    responses(
        (status = 200, description = "Newest expenses across all groups", body = Vec<Expense>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn recent_expenses(
    State(service): State<Arc<AppService>>,
    Query(query): Query<RecentExpensesQuery>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Ok(Json(service.recent_expenses(limit).await?))
}

#[utoipa::path(
    post,
    path = "/api/settlements",
    request_body = RequestSettlementRequest,
    responses(
        (status = 202, description = "Settlement recorded, notifications under way", body = Settlement),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Settlement already pending or group already settled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn request_settlement(
    State(service): State<Arc<AppService>>,
    Json(req): Json<RequestSettlementRequest>,
) -> Result<(StatusCode, Json<Settlement>), ApiError> {
    let settlement = service.request_settlement(&req.group_id).await?;
    Ok((StatusCode::ACCEPTED, Json(settlement)))
}

#[utoipa::path(
    get,
    path = "/api/settlements/{settlement_id}",
    params(
        ("settlement_id" = String, Path, description = "ID of the settlement")
    ),
    responses(
        (status = 200, description = "Settlement retrieved successfully", body = Settlement),
        (status = 404, description = "Settlement not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_settlement(
    State(service): State<Arc<AppService>>,
    Path(settlement_id): Path<String>,
) -> Result<Json<Settlement>, ApiError> {
    Ok(Json(service.get_settlement(&settlement_id).await?))
}

/// Lets an external notifier report back on a settlement it was handed.
#[utoipa::path(
    post,
    path = "/api/settlements/{settlement_id}/outcome",
    params(
        ("settlement_id" = String, Path, description = "ID of the settlement")
    ),
    request_body = NotificationOutcomeRequest,
    responses(
        (status = 200, description = "Outcome recorded", body = Settlement),
        (status = 404, description = "Settlement not found", body = ErrorResponse),
        (status = 409, description = "Settlement already resolved", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn report_outcome(
    State(service): State<Arc<AppService>>,
    Path(settlement_id): Path<String>,
    Json(req): Json<NotificationOutcomeRequest>,
) -> Result<Json<Settlement>, ApiError> {
    let settlement = service
        .report_notification_outcome(&settlement_id, req.into())
        .await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Application audit log", body = Vec<AppLog>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_app_logs(State(service): State<Arc<AppService>>) -> Result<Json<Vec<AppLog>>, ApiError> {
    Ok(Json(service.get_app_logs().await?))
}

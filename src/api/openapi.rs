use utoipa::OpenApi;

use crate::{
    api::models::{
        AddExpenseRequest, AddMemberRequest, CreateGroupRequest, ErrorResponse, NotificationOutcomeRequest,
        RequestSettlementRequest,
    },
    core::{
        balances::Transfer,
        lifecycle::SettlementState,
        models::{
            audit::{AppLog, GroupAudit},
            expense::Expense,
            group::Group,
            member::{Member, MemberId},
            money::{Currency, Money},
            settlement::{MemberBalance, Settlement, SettlementStatus},
        },
        services::GroupBalances,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_group,
        super::handlers::list_groups,
        super::handlers::get_group,
        super::handlers::delete_group,
        super::handlers::add_member,
        super::handlers::remove_member,
        super::handlers::get_group_balances,
        super::handlers::get_all_balances,
        super::handlers::list_settlements,
        super::handlers::get_group_audits,
        super::handlers::add_expense,
        super::handlers::list_expenses,
        super::handlers::recent_expenses,
        super::handlers::request_settlement,
        super::handlers::get_settlement,
        super::handlers::report_outcome,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateGroupRequest,
        AddMemberRequest,
        AddExpenseRequest,
        RequestSettlementRequest,
        NotificationOutcomeRequest,
        ErrorResponse,
        Currency,
        Money,
        MemberId,
        Member,
        Group,
        SettlementState,
        Expense,
        Transfer,
        MemberBalance,
        GroupBalances,
        SettlementStatus,
        Settlement,
        AppLog,
        GroupAudit
    )),
    info(
        title = "Tally API",
        description = "Shared-expense ledger: record expenses, read balances and settle up",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

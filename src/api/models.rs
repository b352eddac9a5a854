use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::{IntoParams, ToSchema};

use crate::core::errors::{FieldError, LedgerError};
use crate::core::models::{
    expense::NewExpense,
    member::{Member, MemberId},
    money::{Currency, Money},
};
use crate::infrastructure::notification::NotificationOutcome;

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub currency: Option<Currency>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

impl From<AddMemberRequest> for Member {
    fn from(req: AddMemberRequest) -> Self {
        Member {
            id: MemberId(req.id),
            name: req.name,
            email: req.email,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AddExpenseRequest {
    #[serde(alias = "group")]
    pub group_id: String,
    pub description: String,
    /// Major units as a decimal string, e.g. `"100.50"`.
    #[schema(example = "100.50")]
    pub amount: String,
    #[serde(alias = "paidBy")]
    pub payer_id: String,
    #[serde(alias = "splitAmong")]
    pub participant_ids: Vec<String>,
}

impl AddExpenseRequest {
    /// Turns the loose payload into a typed draft. Membership is checked
    /// later, under the group lock.
    pub fn into_draft(self, currency: Currency) -> Result<NewExpense, LedgerError> {
        let amount = Money::parse(&self.amount, currency)?;
        let requested = self.participant_ids.len();
        let participants: BTreeSet<MemberId> = self.participant_ids.into_iter().map(MemberId).collect();
        if participants.len() != requested {
            return Err(LedgerError::InvalidInput(
                "participant_ids".to_string(),
                FieldError {
                    field: "participant_ids".to_string(),
                    title: "Duplicate participant".to_string(),
                    description: "each participant may be listed once".to_string(),
                },
            ));
        }
        Ok(NewExpense {
            description: self.description,
            payer: MemberId(self.payer_id),
            amount,
            participants,
        })
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RequestSettlementRequest {
    #[serde(alias = "group")]
    pub group_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct NotificationOutcomeRequest {
    pub success: bool,
    pub reason: Option<String>,
}

impl From<NotificationOutcomeRequest> for NotificationOutcome {
    fn from(req: NotificationOutcomeRequest) -> Self {
        NotificationOutcome::from_success(req.success, req.reason)
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentExpensesQuery {
    /// Defaults to 20.
    pub limit: Option<usize>,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for LedgerError to implement IntoResponse
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LedgerError::InvalidExpense(_)
            | LedgerError::InvalidSplit(_)
            | LedgerError::InvalidAmount(_)
            | LedgerError::AmountOverflow
            | LedgerError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            LedgerError::CurrencyMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::GroupNotFound(_) | LedgerError::MemberNotFound(_) | LedgerError::SettlementNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            LedgerError::Conflict(_)
            | LedgerError::AlreadyGroupMember(_)
            | LedgerError::MemberReferenced(_)
            | LedgerError::SettlementAlreadyResolved(_)
            | LedgerError::InvalidTransition { .. } => StatusCode::CONFLICT,
            LedgerError::StorageError(_) | LedgerError::LoggingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error = match &self.0 {
            LedgerError::InvalidInput(field, detail) => {
                format!("Invalid input for {}: {}", field, detail.description)
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

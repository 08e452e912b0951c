//! HTTP boundary: JSON handlers over the application service.
//!
//! The acting user is taken from the `x-user-id` header; real session
//! authentication lives in an upstream collaborator. Domain errors map to
//! stable machine-readable codes, and a pending payment maps to 202 so
//! clients poll instead of treating it as terminal.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, async_trait};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::Amount;
use crate::booking::BookingError;
use crate::gateway::{FundingError, FundingInit, PaymentProvider};
use crate::inspection::InspectionError;
use crate::ledger::LedgerError;
use crate::model::{BookingId, BookingStatus, HostelId, InspectionId, InspectionStatus, UserId};
use crate::service::{Service, ServiceError, WalletSnapshot};

pub fn router<P>(service: Arc<Service<P>>) -> Router
where
    P: PaymentProvider + 'static,
{
    Router::new()
        .route("/wallet", get(wallet::<P>))
        .route("/wallet/fund/init", post(fund_init::<P>))
        .route("/wallet/verify", post(fund_verify::<P>))
        .route("/wallet/withdraw", post(withdraw::<P>))
        .route("/bookings", post(create_booking::<P>))
        .route("/bookings/:id/confirm", post(confirm_booking::<P>))
        .route("/bookings/:id/cancel", post(cancel_booking::<P>))
        .route("/inspections", post(create_inspection::<P>))
        .with_state(service)
}

/// The authenticated caller, from the `x-user-id` header.
pub struct Actor(pub UserId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .ok_or_else(|| ApiError::unauthenticated("missing x-user-id header"))?;
        let user = header
            .to_str()
            .ok()
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| ApiError::unauthenticated("x-user-id must be a numeric user id"))?;
        Ok(Actor(user))
    }
}

/// User-facing error: an HTTP status plus a stable code the client can
/// switch on.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn unauthenticated(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    #[cfg(test)]
    fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.code, "message": self.message }));
        (self.status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        let (status, code) = match &err {
            ServiceError::UnknownHostel(_) => (StatusCode::NOT_FOUND, "hostel_not_found"),
            ServiceError::Booking(e) => match e {
                BookingError::NotFound(_) => (StatusCode::NOT_FOUND, "booking_not_found"),
                BookingError::DuplicateBooking(_, _) => (StatusCode::CONFLICT, "duplicate_booking"),
                BookingError::InvalidAmount { .. } => (StatusCode::BAD_REQUEST, "invalid_amount"),
                BookingError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
                // Double confirm/cancel surfaces as "already processed".
                BookingError::InvalidState(_, _) => (StatusCode::CONFLICT, "already_processed"),
                BookingError::Ledger(e) => ledger_code(e),
            },
            ServiceError::Inspection(InspectionError::Ledger(e)) => ledger_code(e),
            ServiceError::Funding(e) => match e {
                FundingError::BelowMinimum(_, _) => (StatusCode::BAD_REQUEST, "below_minimum"),
                FundingError::PaymentNotFound(_) => (StatusCode::NOT_FOUND, "payment_not_found"),
                FundingError::PaymentPending(_) => (StatusCode::ACCEPTED, "payment_pending"),
                FundingError::PaymentFailed(_, _) => {
                    (StatusCode::PAYMENT_REQUIRED, "payment_failed")
                }
                FundingError::Provider(_) => (StatusCode::BAD_GATEWAY, "provider_unavailable"),
                FundingError::Ledger(e) => ledger_code(e),
            },
            ServiceError::Ledger(e) => ledger_code(e),
        };
        ApiError::new(status, code, message)
    }
}

fn ledger_code(err: &LedgerError) -> (StatusCode, &'static str) {
    match err {
        LedgerError::InvalidAmount => (StatusCode::BAD_REQUEST, "invalid_amount"),
        LedgerError::InsufficientFunds(_, _, _) => (StatusCode::BAD_REQUEST, "insufficient_funds"),
        LedgerError::InsufficientEscrow(_, _, _) => (StatusCode::CONFLICT, "insufficient_escrow"),
    }
}

#[derive(Debug, Deserialize)]
struct FundInitRequest {
    amount: Amount,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FundInitResponse {
    reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_balance: Option<Amount>,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    reference: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    new_balance: Amount,
}

#[derive(Debug, Deserialize)]
struct WithdrawRequest {
    amount: Amount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRequest {
    hostel_id: HostelId,
    /// What the client believes it is paying; validated against the catalog.
    amount: Option<Amount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingResponse {
    booking_id: BookingId,
    status: BookingStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InspectionRequest {
    hostel_id: HostelId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectionResponse {
    inspection_id: InspectionId,
    status: InspectionStatus,
}

async fn wallet<P: PaymentProvider + 'static>(
    State(service): State<Arc<Service<P>>>,
    Actor(user): Actor,
) -> Json<WalletSnapshot> {
    Json(service.wallet(user).await)
}

async fn fund_init<P: PaymentProvider + 'static>(
    State(service): State<Arc<Service<P>>>,
    Actor(user): Actor,
    Json(req): Json<FundInitRequest>,
) -> Result<Json<FundInitResponse>, ApiError> {
    let init = service.initialize_funding(user, req.amount).await?;
    let response = match init {
        FundingInit::Redirect {
            reference,
            authorization_url,
        } => FundInitResponse {
            reference,
            authorization_url: Some(authorization_url),
            new_balance: None,
        },
        FundingInit::Instant {
            reference,
            new_balance,
        } => FundInitResponse {
            reference,
            authorization_url: None,
            new_balance: Some(new_balance),
        },
    };
    Ok(Json(response))
}

async fn fund_verify<P: PaymentProvider + 'static>(
    State(service): State<Arc<Service<P>>>,
    Actor(_user): Actor,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let new_balance = service.verify_funding(&req.reference).await?;
    Ok(Json(BalanceResponse { new_balance }))
}

async fn withdraw<P: PaymentProvider + 'static>(
    State(service): State<Arc<Service<P>>>,
    Actor(user): Actor,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let new_balance = service.withdraw(user, req.amount).await?;
    Ok(Json(BalanceResponse { new_balance }))
}

async fn create_booking<P: PaymentProvider + 'static>(
    State(service): State<Arc<Service<P>>>,
    Actor(user): Actor,
    Json(req): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let booking = service.book(user, req.hostel_id, req.amount).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            booking_id: booking.id,
            status: booking.status,
        }),
    ))
}

async fn confirm_booking<P: PaymentProvider + 'static>(
    State(service): State<Arc<Service<P>>>,
    Actor(user): Actor,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingResponse>, ApiError> {
    let (booking, _settlement) = service.confirm_booking(id, user).await?;
    Ok(Json(BookingResponse {
        booking_id: booking.id,
        status: booking.status,
    }))
}

async fn cancel_booking<P: PaymentProvider + 'static>(
    State(service): State<Arc<Service<P>>>,
    Actor(user): Actor,
    Path(id): Path<BookingId>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = service.cancel_booking(id, user).await?;
    Ok(Json(BookingResponse {
        booking_id: booking.id,
        status: booking.status,
    }))
}

async fn create_inspection<P: PaymentProvider + 'static>(
    State(service): State<Arc<Service<P>>>,
    Actor(user): Actor,
    Json(req): Json<InspectionRequest>,
) -> Result<(StatusCode, Json<InspectionResponse>), ApiError> {
    let inspection = service.request_inspection(user, req.hostel_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(InspectionResponse {
            inspection_id: inspection.id,
            status: inspection.status,
        }),
    ))
}

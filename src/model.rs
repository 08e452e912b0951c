//! Core domain types for the escrow ledger and booking lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Amount;

/// User identifier (tenant or agent).
pub type UserId = u64;

/// Hostel identifier.
pub type HostelId = u64;

/// Booking identifier.
pub type BookingId = u64;

/// Inspection identifier.
pub type InspectionId = u64;

/// Ledger transaction identifier.
pub type TxId = u64;

/// Direction of a ledger entry relative to the wallet it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxDirection {
    Credit,
    Debit,
}

/// What a ledger entry was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxPurpose {
    Funding,
    BookingHold,
    BookingRelease,
    BookingRefund,
    InspectionFee,
    Withdrawal,
    Commission,
}

/// Settlement status of a ledger entry. Confirmed and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// Immutable ledger log entry. Appended on every balance-affecting operation
/// and never destroyed; only `status` may advance during settlement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    pub id: TxId,
    pub user: UserId,
    pub amount: Amount,
    pub direction: TxDirection,
    pub purpose: TxPurpose,
    pub description: String,
    pub status: TxStatus,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a booking. Confirmed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// One tenant's reservation of one hostel unit. `amount` is fixed at
/// creation; the escrow hold is taken atomically with the record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub student: UserId,
    pub hostel: HostelId,
    /// Receiving agent, captured from the catalog entry at creation.
    pub agent: UserId,
    pub amount: Amount,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_open(&self) -> bool {
        self.status == BookingStatus::Pending
    }
}

/// Lifecycle of an inspection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InspectionStatus {
    Paid,
    Completed,
    Cancelled,
}

/// A paid request to visit a hostel. The fee is a direct balance debit with
/// no escrow phase; a zero fee still produces a record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: InspectionId,
    pub student: UserId,
    pub hostel: HostelId,
    pub amount: Amount,
    pub status: InspectionStatus,
    pub created_at: DateTime<Utc>,
}

/// Priced catalog entry, immutable at the moment a booking or inspection
/// references it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hostel {
    pub id: HostelId,
    pub agent: UserId,
    /// Total package: rent + caution fee + agent fee.
    pub price: Amount,
    pub inspection_fee: Amount,
}

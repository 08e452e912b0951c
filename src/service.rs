//! Application service: one serialized front door over the ledger, booking
//! state machine, inspection processor and payment gateway.
//!
//! Request handlers run concurrently; every financial transition goes
//! through the single state mutex here, so concurrent confirm/cancel on one
//! booking resolve to exactly one winner and concurrent verifications of one
//! reference credit exactly once. The client-side store is a cache of this
//! state, never the other way around.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::Amount;
use crate::booking::{BookingError, Bookings};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::gateway::{FundingError, FundingInit, Gateway, PaymentProvider};
use crate::inspection::{InspectionError, Inspections};
use crate::ledger::{Ledger, LedgerError, Settlement};
use crate::model::{Booking, BookingId, HostelId, Inspection, TxPurpose, TxRecord, UserId};
use crate::notify::{Dispatcher, Notification};

/// Error returned by any boundary operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("hostel {0} not found")]
    UnknownHostel(HostelId),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Inspection(#[from] InspectionError),

    #[error(transparent)]
    Funding(#[from] FundingError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Read model for `GET /wallet`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub balance: Amount,
    pub escrow_balance: Amount,
    pub transactions: Vec<TxRecord>,
}

struct State<P> {
    ledger: Ledger,
    bookings: Bookings,
    inspections: Inspections,
    gateway: Gateway<P>,
}

/// The serialized application core shared by all request handlers.
pub struct Service<P> {
    state: Mutex<State<P>>,
    catalog: Catalog,
    notifications: Dispatcher,
    commission_rate_bps: u32,
}

impl<P: PaymentProvider> Service<P> {
    pub fn new(
        catalog: Catalog,
        provider: P,
        config: &Config,
        notifications: Dispatcher,
    ) -> Self {
        Self {
            state: Mutex::new(State {
                ledger: Ledger::new(),
                bookings: Bookings::new(),
                inspections: Inspections::new(),
                gateway: Gateway::new(provider, config.min_funding, config.provider_timeout),
            }),
            catalog,
            notifications,
            commission_rate_bps: config.commission_rate_bps,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Commission the platform has collected across all settlements.
    pub async fn platform_commission(&self) -> Amount {
        self.state.lock().await.ledger.commission_total()
    }

    /// Open a checkout session to fund a wallet.
    pub async fn initialize_funding(
        &self,
        user: UserId,
        amount: Amount,
    ) -> Result<FundingInit, ServiceError> {
        let mut state = self.state.lock().await;
        let State {
            ledger, gateway, ..
        } = &mut *state;

        let init = gateway.initialize_funding(ledger, user, amount).await?;
        if let FundingInit::Instant { new_balance, .. } = &init {
            self.notify(
                user,
                "Wallet funded",
                format!("Your wallet balance is now {new_balance}"),
            );
        }
        Ok(init)
    }

    /// Verify a funding payment by provider reference. Safe to call any
    /// number of times; the wallet is credited exactly once per reference.
    pub async fn verify_funding(&self, reference: &str) -> Result<Amount, ServiceError> {
        let mut state = self.state.lock().await;
        let State {
            ledger, gateway, ..
        } = &mut *state;

        let funded = gateway.verify_funding(ledger, reference).await?;
        self.notify(
            funded.user,
            "Wallet funded",
            format!("Your wallet balance is now {}", funded.new_balance),
        );
        Ok(funded.new_balance)
    }

    /// Withdraw spendable funds. Returns the new balance.
    pub async fn withdraw(&self, user: UserId, amount: Amount) -> Result<Amount, ServiceError> {
        let mut state = self.state.lock().await;
        state
            .ledger
            .debit(user, amount, TxPurpose::Withdrawal, "wallet withdrawal")?;

        let new_balance = state.ledger.wallet(user).balance();
        self.notify(
            user,
            "Withdrawal processed",
            format!("{amount} has left your wallet"),
        );
        Ok(new_balance)
    }

    /// Current wallet position and transaction history.
    pub async fn wallet(&self, user: UserId) -> WalletSnapshot {
        let state = self.state.lock().await;
        let wallet = state.ledger.wallet(user);
        WalletSnapshot {
            balance: wallet.balance(),
            escrow_balance: wallet.escrow(),
            transactions: state.ledger.transactions_for(user).cloned().collect(),
        }
    }

    /// Reserve a hostel: the package price moves from the tenant's balance
    /// into escrow atomically with the booking record.
    pub async fn book(
        &self,
        student: UserId,
        hostel_id: HostelId,
        claimed_amount: Option<Amount>,
    ) -> Result<Booking, ServiceError> {
        let hostel = self
            .catalog
            .get(hostel_id)
            .ok_or(ServiceError::UnknownHostel(hostel_id))?;

        let mut state = self.state.lock().await;
        let State {
            ledger, bookings, ..
        } = &mut *state;

        let booking = bookings
            .create(ledger, student, hostel, claimed_amount)?
            .clone();

        self.notify(
            hostel.agent,
            "New booking",
            format!("Hostel {hostel_id} was reserved; funds are held in escrow"),
        );
        self.notify(
            student,
            "Booking placed",
            format!("{} is held in escrow for hostel {hostel_id}", booking.amount),
        );
        Ok(booking)
    }

    /// Tenant confirms move-in; escrow settles to the agent.
    pub async fn confirm_booking(
        &self,
        id: BookingId,
        actor: UserId,
    ) -> Result<(Booking, Settlement), ServiceError> {
        let mut state = self.state.lock().await;
        let State {
            ledger, bookings, ..
        } = &mut *state;

        let (booking, settlement) = bookings.confirm(ledger, id, actor, self.commission_rate_bps)?;
        let booking = booking.clone();

        self.notify(
            booking.agent,
            "Booking settled",
            format!("{} has been paid out for booking {id}", settlement.payout),
        );
        self.notify(booking.student, "Move-in confirmed", format!("Booking {id} is settled"));
        Ok((booking, settlement))
    }

    /// Cancel an open booking; escrow returns to the tenant in full.
    pub async fn cancel_booking(
        &self,
        id: BookingId,
        actor: UserId,
    ) -> Result<Booking, ServiceError> {
        let mut state = self.state.lock().await;
        let State {
            ledger, bookings, ..
        } = &mut *state;

        let booking = bookings.cancel(ledger, id, actor)?.clone();

        self.notify(
            booking.student,
            "Booking cancelled",
            format!("{} has been refunded to your wallet", booking.amount),
        );
        self.notify(
            booking.agent,
            "Booking cancelled",
            format!("Booking {id} for hostel {} was cancelled", booking.hostel),
        );
        Ok(booking)
    }

    /// Pay the inspection fee for a hostel visit.
    pub async fn request_inspection(
        &self,
        student: UserId,
        hostel_id: HostelId,
    ) -> Result<Inspection, ServiceError> {
        let hostel = self
            .catalog
            .get(hostel_id)
            .ok_or(ServiceError::UnknownHostel(hostel_id))?;

        let mut state = self.state.lock().await;
        let State {
            ledger,
            inspections,
            ..
        } = &mut *state;

        let inspection = inspections.pay(ledger, student, hostel)?.clone();

        self.notify(
            hostel.agent,
            "Inspection requested",
            format!("A visit to hostel {hostel_id} has been paid for"),
        );
        Ok(inspection)
    }

    fn notify(&self, recipient: UserId, title: &str, message: String) {
        self.notifications
            .dispatch(Notification::new(recipient, title, message));
    }
}

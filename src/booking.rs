//! Booking state machine: PENDING -> CONFIRMED | CANCELLED.
//!
//! Creation takes the escrow hold atomically with the PENDING record, and
//! the two terminal transitions are mutually exclusive: whichever of confirm
//! or cancel runs second fails `InvalidState` with zero ledger effect.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::Amount;
use crate::ledger::{Ledger, LedgerError, Settlement};
use crate::model::{Booking, BookingId, BookingStatus, Hostel, HostelId, UserId};

/// Error returned by booking transitions.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("booking {0} not found")]
    NotFound(BookingId),

    #[error("user {0} already has an open booking for hostel {1}")]
    DuplicateBooking(UserId, HostelId),

    /// The client-supplied amount disagrees with the catalog price. Client
    /// amounts are never trusted; the listed package price governs.
    #[error("invalid amount: claimed {claimed}, hostel {hostel} is listed at {price}")]
    InvalidAmount {
        hostel: HostelId,
        claimed: Amount,
        price: Amount,
    },

    #[error("user {actor} may not act on booking {id} held by user {student}")]
    Forbidden {
        id: BookingId,
        actor: UserId,
        student: UserId,
    },

    #[error("booking {0} is already {1:?}")]
    InvalidState(BookingId, BookingStatus),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// All bookings, keyed by id.
#[derive(Debug, Default)]
pub struct Bookings {
    bookings: HashMap<BookingId, Booking>,
    next_id: BookingId,
}

impl Bookings {
    pub fn new() -> Self {
        Self {
            bookings: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.get(&id)
    }

    /// Bookings made by one tenant, in no particular order.
    pub fn for_student(&self, student: UserId) -> impl Iterator<Item = &Booking> + '_ {
        self.bookings.values().filter(move |b| b.student == student)
    }

    /// Reserve a hostel: hold the package price in escrow and record the
    /// booking as one commit point. If the hold fails no booking exists, and
    /// the map insert cannot fail, so there is never a row without a hold.
    ///
    /// `claimed_amount` is what the client believes it is paying; it must
    /// match the catalog price exactly or the booking is rejected.
    pub fn create(
        &mut self,
        ledger: &mut Ledger,
        student: UserId,
        hostel: &Hostel,
        claimed_amount: Option<Amount>,
    ) -> Result<&Booking, BookingError> {
        if let Some(open) = self
            .bookings
            .values()
            .find(|b| b.student == student && b.hostel == hostel.id && b.is_open())
        {
            return Err(BookingError::DuplicateBooking(student, open.hostel));
        }

        if let Some(claimed) = claimed_amount {
            if claimed != hostel.price {
                return Err(BookingError::InvalidAmount {
                    hostel: hostel.id,
                    claimed,
                    price: hostel.price,
                });
            }
        }

        let id = self.next_id;
        ledger.hold_to_escrow(
            student,
            hostel.price,
            format!("escrow hold for booking {id} (hostel {})", hostel.id),
        )?;

        self.next_id += 1;
        let booking = Booking {
            id,
            student,
            hostel: hostel.id,
            agent: hostel.agent,
            amount: hostel.price,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        info!(booking = id, student, hostel = hostel.id, amount = %hostel.price, "booking created");
        Ok(self.bookings.entry(id).or_insert(booking))
    }

    /// Tenant confirms move-in: escrow settles to the agent at the
    /// commission rate in effect now.
    pub fn confirm(
        &mut self,
        ledger: &mut Ledger,
        id: BookingId,
        actor: UserId,
        rate_bps: u32,
    ) -> Result<(&Booking, Settlement), BookingError> {
        let booking = self
            .bookings
            .get_mut(&id)
            .ok_or(BookingError::NotFound(id))?;

        // Only the tenant may confirm move-in.
        if actor != booking.student {
            return Err(BookingError::Forbidden {
                id,
                actor,
                student: booking.student,
            });
        }

        if !booking.is_open() {
            return Err(BookingError::InvalidState(id, booking.status));
        }

        let settlement = ledger.release_escrow(
            booking.student,
            booking.amount,
            booking.agent,
            rate_bps,
            format!("settlement for booking {id}"),
        )?;

        booking.status = BookingStatus::Confirmed;
        info!(booking = id, payout = %settlement.payout, commission = %settlement.commission, "booking confirmed");
        Ok((&*booking, settlement))
    }

    /// Cancel an open booking: the full escrowed amount returns to the
    /// tenant. The tenant or the receiving agent may cancel.
    pub fn cancel(
        &mut self,
        ledger: &mut Ledger,
        id: BookingId,
        actor: UserId,
    ) -> Result<&Booking, BookingError> {
        let booking = self
            .bookings
            .get_mut(&id)
            .ok_or(BookingError::NotFound(id))?;

        if actor != booking.student && actor != booking.agent {
            return Err(BookingError::Forbidden {
                id,
                actor,
                student: booking.student,
            });
        }

        if !booking.is_open() {
            return Err(BookingError::InvalidState(id, booking.status));
        }

        ledger.refund_escrow(
            booking.student,
            booking.amount,
            format!("refund for cancelled booking {id}"),
        )?;

        booking.status = BookingStatus::Cancelled;
        info!(booking = id, student = booking.student, "booking cancelled");
        Ok(&*booking)
    }
}

//! Inspection fee processing: a one-shot balance debit with no escrow phase.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::ledger::{Ledger, LedgerError};
use crate::model::{Hostel, Inspection, InspectionId, InspectionStatus, TxPurpose, UserId};

/// Error returned when paying for an inspection.
#[derive(Debug, Error)]
pub enum InspectionError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// All inspection requests, keyed by id.
#[derive(Debug, Default)]
pub struct Inspections {
    inspections: HashMap<InspectionId, Inspection>,
    next_id: InspectionId,
}

impl Inspections {
    pub fn new() -> Self {
        Self {
            inspections: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, id: InspectionId) -> Option<&Inspection> {
        self.inspections.get(&id)
    }

    pub fn for_student(&self, student: UserId) -> impl Iterator<Item = &Inspection> + '_ {
        self.inspections
            .values()
            .filter(move |i| i.student == student)
    }

    /// Pay for a hostel visit. The fee is debited straight from the
    /// spendable balance; a zero fee skips the ledger entirely but still
    /// produces a PAID record. There is no refund path.
    pub fn pay(
        &mut self,
        ledger: &mut Ledger,
        student: UserId,
        hostel: &Hostel,
    ) -> Result<&Inspection, InspectionError> {
        let id = self.next_id;

        if !hostel.inspection_fee.is_zero() {
            ledger.debit(
                student,
                hostel.inspection_fee,
                TxPurpose::InspectionFee,
                format!("inspection fee for hostel {}", hostel.id),
            )?;
        }

        self.next_id += 1;
        let inspection = Inspection {
            id,
            student,
            hostel: hostel.id,
            amount: hostel.inspection_fee,
            status: InspectionStatus::Paid,
            created_at: Utc::now(),
        };
        info!(inspection = id, student, hostel = hostel.id, fee = %hostel.inspection_fee, "inspection paid");
        Ok(self.inspections.entry(id).or_insert(inspection))
    }
}

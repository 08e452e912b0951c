pub mod amount;
pub mod api;
pub mod booking;
pub mod catalog;
pub mod commission;
pub mod config;
pub mod gateway;
pub mod inspection;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod service;

pub use amount::Amount;
pub use ledger::Ledger;
pub use model::{BookingId, HostelId, InspectionId, TxId, UserId};
pub use service::Service;

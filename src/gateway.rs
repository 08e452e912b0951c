//! Payment gateway adapter: the only component that talks to the external
//! checkout provider, and the owner of the processed-reference set that
//! makes funding verification idempotent.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::Amount;
use crate::ledger::{Ledger, LedgerError};
use crate::model::{TxId, TxPurpose, UserId};

/// Transport-level failure talking to the provider.
#[derive(Debug, Error)]
#[error("payment provider unreachable: {0}")]
pub struct ProviderError(pub String);

/// How the client should proceed after a checkout session is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkout {
    /// Client must complete checkout at this URL and then call verify.
    Redirect { authorization_url: String },
    /// Provider settled the payment during initialization.
    Instant,
}

/// Provider-side view of a payment, looked up by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Settled upstream for this amount.
    Settled(Amount),
    Pending,
    NotFound,
    Failed(String),
}

/// The external checkout network. Outbound calls may be slow or hang; the
/// adapter wraps every call in a timeout.
pub trait PaymentProvider: Send + Sync {
    fn initialize(
        &self,
        reference: &str,
        amount: Amount,
    ) -> impl Future<Output = Result<Checkout, ProviderError>> + Send;

    fn lookup(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<PaymentStatus, ProviderError>> + Send;
}

impl<P: PaymentProvider> PaymentProvider for std::sync::Arc<P> {
    fn initialize(
        &self,
        reference: &str,
        amount: Amount,
    ) -> impl Future<Output = Result<Checkout, ProviderError>> + Send {
        (**self).initialize(reference, amount)
    }

    fn lookup(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<PaymentStatus, ProviderError>> + Send {
        (**self).lookup(reference)
    }
}

/// Error returned by funding operations.
#[derive(Debug, Error)]
pub enum FundingError {
    #[error("amount {0} is below the funding minimum of {1}")]
    BelowMinimum(Amount, Amount),

    #[error("no payment found for reference {0}")]
    PaymentNotFound(String),

    /// Not terminal: the caller should poll verify again.
    #[error("payment {0} has not settled yet")]
    PaymentPending(String),

    #[error("payment {0} failed: {1}")]
    PaymentFailed(String, String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Result of opening a funding session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingInit {
    Redirect {
        reference: String,
        authorization_url: String,
    },
    Instant {
        reference: String,
        new_balance: Amount,
    },
}

/// Outcome of a successful verification: whose wallet was credited and
/// where it now stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Funded {
    pub user: UserId,
    pub new_balance: Amount,
}

#[derive(Debug, Clone, Copy)]
struct FundingSession {
    user: UserId,
    amount: Amount,
}

/// Bridges checkout sessions to ledger credits.
///
/// A reference is credited at most once: `processed` maps every settled
/// reference to the ledger entry it produced, and verification short-circuits
/// on a repeat before any provider call.
pub struct Gateway<P> {
    provider: P,
    min_funding: Amount,
    call_timeout: Duration,
    sessions: HashMap<String, FundingSession>,
    processed: HashMap<String, TxId>,
}

impl<P: PaymentProvider> Gateway<P> {
    pub fn new(provider: P, min_funding: Amount, call_timeout: Duration) -> Self {
        Self {
            provider,
            min_funding,
            call_timeout,
            sessions: HashMap::new(),
            processed: HashMap::new(),
        }
    }

    /// Open a checkout session for the given amount. Returns the redirect
    /// URL, or the new balance if the provider settled instantly.
    pub async fn initialize_funding(
        &mut self,
        ledger: &mut Ledger,
        user: UserId,
        amount: Amount,
    ) -> Result<FundingInit, FundingError> {
        if amount < self.min_funding {
            return Err(FundingError::BelowMinimum(amount, self.min_funding));
        }

        let reference = Uuid::new_v4().to_string();
        let checkout = tokio::time::timeout(
            self.call_timeout,
            self.provider.initialize(&reference, amount),
        )
        .await
        .map_err(|_| ProviderError("checkout initialization timed out".into()))??;

        self.sessions
            .insert(reference.clone(), FundingSession { user, amount });
        info!(user, reference, amount = %amount, "funding session opened");

        match checkout {
            Checkout::Redirect { authorization_url } => Ok(FundingInit::Redirect {
                reference,
                authorization_url,
            }),
            Checkout::Instant => {
                let funded = self.settle(ledger, &reference, user, amount)?;
                Ok(FundingInit::Instant {
                    reference,
                    new_balance: funded.new_balance,
                })
            }
        }
    }

    /// Verify a funding payment by reference and credit the wallet.
    ///
    /// Idempotent: a reference that has already been credited returns the
    /// current balance without touching the ledger or the provider. An
    /// outbound timeout or transport failure is reported as pending, never
    /// as failure, so an upstream success is never under-credited.
    pub async fn verify_funding(
        &mut self,
        ledger: &mut Ledger,
        reference: &str,
    ) -> Result<Funded, FundingError> {
        if self.processed.contains_key(reference) {
            let session = self.sessions[reference];
            info!(reference, "funding already verified, repeat is a no-op");
            return Ok(Funded {
                user: session.user,
                new_balance: ledger.wallet(session.user).balance(),
            });
        }

        let session = *self
            .sessions
            .get(reference)
            .ok_or_else(|| FundingError::PaymentNotFound(reference.to_string()))?;

        let status = match tokio::time::timeout(self.call_timeout, self.provider.lookup(reference))
            .await
        {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!(reference, error = %e, "provider lookup failed, treating as pending");
                return Err(FundingError::PaymentPending(reference.to_string()));
            }
            Err(_) => {
                warn!(reference, "provider lookup timed out, treating as pending");
                return Err(FundingError::PaymentPending(reference.to_string()));
            }
        };

        match status {
            PaymentStatus::Settled(amount) => {
                if amount != session.amount {
                    warn!(
                        reference,
                        requested = %session.amount,
                        settled = %amount,
                        "provider settled a different amount than requested"
                    );
                }
                self.settle(ledger, reference, session.user, amount)
            }
            PaymentStatus::Pending => Err(FundingError::PaymentPending(reference.to_string())),
            PaymentStatus::NotFound => Err(FundingError::PaymentNotFound(reference.to_string())),
            PaymentStatus::Failed(reason) => {
                Err(FundingError::PaymentFailed(reference.to_string(), reason))
            }
        }
    }

    /// Credit a settled reference exactly once and remember it.
    fn settle(
        &mut self,
        ledger: &mut Ledger,
        reference: &str,
        user: UserId,
        amount: Amount,
    ) -> Result<Funded, FundingError> {
        let tx = ledger.credit(
            user,
            amount,
            TxPurpose::Funding,
            format!("wallet funding {reference}"),
        )?;
        self.processed.insert(reference.to_string(), tx);
        info!(user, reference, tx, amount = %amount, "funding credited");
        Ok(Funded {
            user,
            new_balance: ledger.wallet(user).balance(),
        })
    }
}

/// In-memory provider for development and tests. Payments sit pending until
/// settled or failed through the sandbox hooks, mimicking a checkout the
/// user completes out of band.
#[derive(Debug, Default)]
pub struct SandboxProvider {
    payments: Mutex<HashMap<String, PaymentStatus>>,
    instant: bool,
}

impl SandboxProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sandbox that settles every payment during initialization, so a
    /// development flow needs no out-of-band checkout step.
    pub fn instant_settling() -> Self {
        Self {
            payments: Mutex::new(HashMap::new()),
            instant: true,
        }
    }

    /// Mark a pending payment as settled upstream.
    pub fn settle(&self, reference: &str, amount: Amount) {
        self.payments
            .lock()
            .unwrap()
            .insert(reference.to_string(), PaymentStatus::Settled(amount));
    }

    /// Mark a pending payment as failed upstream.
    pub fn fail(&self, reference: &str, reason: &str) {
        self.payments
            .lock()
            .unwrap()
            .insert(reference.to_string(), PaymentStatus::Failed(reason.to_string()));
    }
}

impl PaymentProvider for SandboxProvider {
    async fn initialize(
        &self,
        reference: &str,
        amount: Amount,
    ) -> Result<Checkout, ProviderError> {
        let mut payments = self.payments.lock().unwrap();
        if self.instant {
            payments.insert(reference.to_string(), PaymentStatus::Settled(amount));
            Ok(Checkout::Instant)
        } else {
            payments.insert(reference.to_string(), PaymentStatus::Pending);
            Ok(Checkout::Redirect {
                authorization_url: format!("https://checkout.sandbox.invalid/{reference}"),
            })
        }
    }

    async fn lookup(&self, reference: &str) -> Result<PaymentStatus, ProviderError> {
        let payments = self.payments.lock().unwrap();
        Ok(payments
            .get(reference)
            .cloned()
            .unwrap_or(PaymentStatus::NotFound))
    }
}

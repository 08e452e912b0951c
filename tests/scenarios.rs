//! End-to-end flows over the application service: the booking lifecycle,
//! funding verification idempotency, and the races the service mutex must
//! resolve deterministically.

use std::sync::Arc;

use hostelpay::booking::BookingError;
use hostelpay::catalog::Catalog;
use hostelpay::config::Config;
use hostelpay::gateway::{FundingError, FundingInit, SandboxProvider};
use hostelpay::model::{BookingStatus, Hostel, TxPurpose, UserId};
use hostelpay::notify::{Dispatcher, TracingNotifier};
use hostelpay::service::ServiceError;
use hostelpay::{Amount, Service};

const TENANT: UserId = 1;
const AGENT: UserId = 2;

fn minor(value: u64) -> Amount {
    Amount::from_minor(value)
}

fn catalog() -> Catalog {
    Catalog::new([
        Hostel {
            id: 7,
            agent: AGENT,
            price: minor(7_000),
            inspection_fee: minor(200),
        },
        Hostel {
            id: 8,
            agent: AGENT,
            price: minor(5_000),
            inspection_fee: Amount::ZERO,
        },
        Hostel {
            id: 9,
            agent: AGENT,
            price: minor(500),
            inspection_fee: Amount::ZERO,
        },
    ])
}

/// Service over an instant-settling provider: funding credits on init.
fn instant_service() -> Arc<Service<SandboxProvider>> {
    let config = Config::from_vars(|_| None).unwrap();
    Arc::new(Service::new(
        catalog(),
        SandboxProvider::instant_settling(),
        &config,
        Dispatcher::spawn(TracingNotifier),
    ))
}

/// Service over a redirecting provider, with the provider handle kept so
/// tests can settle payments out of band.
fn redirect_service() -> (Arc<Service<Arc<SandboxProvider>>>, Arc<SandboxProvider>) {
    let config = Config::from_vars(|_| None).unwrap();
    let provider = Arc::new(SandboxProvider::new());
    let service = Arc::new(Service::new(
        catalog(),
        provider.clone(),
        &config,
        Dispatcher::spawn(TracingNotifier),
    ));
    (service, provider)
}

async fn fund(service: &Service<SandboxProvider>, user: UserId, amount: u64) {
    let init = service
        .initialize_funding(user, minor(amount))
        .await
        .unwrap();
    assert!(matches!(init, FundingInit::Instant { .. }));
}

#[tokio::test]
async fn booking_confirm_settles_with_commission() {
    // Scenario A: 10,000 funded, hostel priced 7,000, 5% commission.
    let service = instant_service();
    fund(&service, TENANT, 10_000).await;

    let booking = service.book(TENANT, 7, None).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    let wallet = service.wallet(TENANT).await;
    assert_eq!(wallet.balance, minor(3_000));
    assert_eq!(wallet.escrow_balance, minor(7_000));

    let (booking, settlement) = service.confirm_booking(booking.id, TENANT).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(settlement.payout, minor(6_650));
    assert_eq!(settlement.commission, minor(350));

    assert_eq!(service.wallet(TENANT).await.escrow_balance, Amount::ZERO);
    assert_eq!(service.wallet(AGENT).await.balance, minor(6_650));
    assert_eq!(service.platform_commission().await, minor(350));
}

#[tokio::test]
async fn booking_cancel_refunds_in_full() {
    // Scenario B: cancel instead of confirm.
    let service = instant_service();
    fund(&service, TENANT, 10_000).await;

    let booking = service.book(TENANT, 7, None).await.unwrap();
    let booking = service.cancel_booking(booking.id, TENANT).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    let wallet = service.wallet(TENANT).await;
    assert_eq!(wallet.balance, minor(10_000));
    assert_eq!(wallet.escrow_balance, Amount::ZERO);
    assert_eq!(service.platform_commission().await, Amount::ZERO);
}

#[tokio::test]
async fn underfunded_booking_fails_with_balance_unchanged() {
    // Scenario C: balance 400, hold of 500.
    let service = instant_service();
    fund(&service, TENANT, 500).await;
    service.withdraw(TENANT, minor(100)).await.unwrap();

    let result = service.book(TENANT, 9, None).await;
    assert!(matches!(
        result,
        Err(ServiceError::Booking(BookingError::Ledger(_)))
    ));

    let wallet = service.wallet(TENANT).await;
    assert_eq!(wallet.balance, minor(400));
    assert_eq!(wallet.escrow_balance, Amount::ZERO);
}

#[tokio::test]
async fn double_verification_credits_exactly_once() {
    // Scenario D: the same reference verified twice.
    let (service, provider) = redirect_service();

    let init = service
        .initialize_funding(TENANT, minor(5_000))
        .await
        .unwrap();
    let reference = match init {
        FundingInit::Redirect { reference, .. } => reference,
        other => panic!("expected redirect, got {other:?}"),
    };
    provider.settle(&reference, minor(5_000));

    assert_eq!(service.verify_funding(&reference).await.unwrap(), minor(5_000));
    assert_eq!(service.verify_funding(&reference).await.unwrap(), minor(5_000));
    assert_eq!(service.wallet(TENANT).await.balance, minor(5_000));
}

#[tokio::test]
async fn concurrent_verification_credits_exactly_once() {
    let (service, provider) = redirect_service();

    let init = service
        .initialize_funding(TENANT, minor(5_000))
        .await
        .unwrap();
    let reference = match init {
        FundingInit::Redirect { reference, .. } => reference,
        other => panic!("expected redirect, got {other:?}"),
    };
    provider.settle(&reference, minor(5_000));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        let reference = reference.clone();
        handles.push(tokio::spawn(async move {
            service.verify_funding(&reference).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    let wallet = service.wallet(TENANT).await;
    assert_eq!(wallet.balance, minor(5_000));
    assert_eq!(
        wallet
            .transactions
            .iter()
            .filter(|tx| tx.purpose == TxPurpose::Funding)
            .count(),
        1
    );
}

#[tokio::test]
async fn verification_before_settlement_is_pending() {
    let (service, _provider) = redirect_service();

    let init = service
        .initialize_funding(TENANT, minor(5_000))
        .await
        .unwrap();
    let reference = match init {
        FundingInit::Redirect { reference, .. } => reference,
        other => panic!("expected redirect, got {other:?}"),
    };

    let result = service.verify_funding(&reference).await;
    assert!(matches!(
        result,
        Err(ServiceError::Funding(FundingError::PaymentPending(_)))
    ));
    assert_eq!(service.wallet(TENANT).await.balance, Amount::ZERO);
}

#[tokio::test]
async fn concurrent_confirms_settle_exactly_once() {
    // Scenario E: two racing confirms, one winner.
    let service = instant_service();
    fund(&service, TENANT, 10_000).await;
    let booking = service.book(TENANT, 7, None).await.unwrap();

    let a = {
        let service = service.clone();
        let id = booking.id;
        tokio::spawn(async move { service.confirm_booking(id, TENANT).await })
    };
    let b = {
        let service = service.clone();
        let id = booking.id;
        tokio::spawn(async move { service.confirm_booking(id, TENANT).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(ServiceError::Booking(BookingError::InvalidState(_, _)))
    )));

    // Exactly one settlement side effect.
    assert_eq!(service.wallet(AGENT).await.balance, minor(6_650));
    assert_eq!(service.platform_commission().await, minor(350));
    assert_eq!(service.wallet(TENANT).await.escrow_balance, Amount::ZERO);
}

#[tokio::test]
async fn racing_confirm_and_cancel_resolve_to_one_terminal_state() {
    let service = instant_service();
    fund(&service, TENANT, 10_000).await;
    let booking = service.book(TENANT, 7, None).await.unwrap();

    let confirm = {
        let service = service.clone();
        let id = booking.id;
        tokio::spawn(async move { service.confirm_booking(id, TENANT).await.map(|_| ()) })
    };
    let cancel = {
        let service = service.clone();
        let id = booking.id;
        tokio::spawn(async move { service.cancel_booking(id, TENANT).await.map(|_| ()) })
    };

    let results = [confirm.await.unwrap(), cancel.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

    // Either way the books balance: escrow is empty and the tenant's funds
    // went to exactly one of {agent+platform, tenant}.
    let tenant = service.wallet(TENANT).await;
    let agent = service.wallet(AGENT).await;
    let commission = service.platform_commission().await;
    assert_eq!(tenant.escrow_balance, Amount::ZERO);
    assert_eq!(
        tenant.balance + agent.balance + commission,
        minor(10_000)
    );
}

#[tokio::test]
async fn conservation_holds_across_a_busy_day() {
    let service = instant_service();
    let students = [1, 3, 4];
    for user in students {
        fund(&service, user, 10_000).await;
    }

    // User 1 books and confirms, user 3 books and cancels, user 4 inspects
    // and withdraws.
    let b1 = service.book(1, 7, None).await.unwrap();
    service.confirm_booking(b1.id, 1).await.unwrap();

    let b3 = service.book(3, 8, None).await.unwrap();
    service.cancel_booking(b3.id, 3).await.unwrap();

    service.request_inspection(4, 7).await.unwrap();
    service.withdraw(4, minor(2_000)).await.unwrap();

    let funded = minor(30_000);
    let withdrawn = minor(2_000);
    let mut held = Amount::ZERO;
    for user in [1, 2, 3, 4] {
        let wallet = service.wallet(user).await;
        held = held + wallet.balance + wallet.escrow_balance;
    }
    // The inspection fee sits in no wallet yet; it was debited without a
    // matching credit, mirroring a platform-side receivable.
    let inspection_fee = minor(200);
    assert_eq!(
        held + service.platform_commission().await + withdrawn + inspection_fee,
        funded
    );
}

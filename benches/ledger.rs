use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hostelpay::model::{TxPurpose, UserId};
use hostelpay::{Amount, Ledger};

/// One full wallet lifecycle: fund, hold the package price in escrow, then
/// settle to an agent at 5% commission.
fn booking_cycle(ledger: &mut Ledger, tenant: UserId, agent: UserId) {
    ledger
        .credit(tenant, Amount::from_minor(10_000), TxPurpose::Funding, "funding")
        .unwrap();
    ledger
        .hold_to_escrow(tenant, Amount::from_minor(7_000), "hold")
        .unwrap();
    ledger
        .release_escrow(tenant, Amount::from_minor(7_000), agent, 500, "settlement")
        .unwrap();
}

fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger");

    for tenants in [100u64, 1_000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("booking_cycles", tenants),
            &tenants,
            |b, &tenants| {
                b.iter(|| {
                    let mut ledger = Ledger::new();
                    for tenant in 1..=tenants {
                        booking_cycle(&mut ledger, tenant, tenant + tenants);
                    }
                    black_box(ledger.commission_total())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ledger);
criterion_main!(benches);

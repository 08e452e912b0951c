//! Commission and payout split, applied when escrow is released to an agent.

use crate::Amount;

/// Platform-wide commission rate in basis points (5%).
pub const COMMISSION_RATE_BPS: u32 = 500;

const BPS_DENOMINATOR: u128 = 10_000;

/// Split a settled amount into the agent payout and the platform commission.
///
/// `payout + commission == amount` for every input: the commission is the
/// rounded (half-up) share and the payout is the exact remainder, so any
/// rounding residue lands on the commission side.
pub fn split(amount: Amount, rate_bps: u32) -> (Amount, Amount) {
    let raw = amount.minor() as u128 * rate_bps as u128;
    let commission = ((raw + BPS_DENOMINATOR / 2) / BPS_DENOMINATOR) as u64;
    let commission = Amount::from_minor(commission.min(amount.minor()));
    let payout = amount
        .checked_sub(commission)
        .unwrap_or(Amount::ZERO);
    (payout, commission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_percent_of_seven_thousand() {
        let (payout, commission) = split(Amount::from_minor(7_000), COMMISSION_RATE_BPS);
        assert_eq!(commission, Amount::from_minor(350));
        assert_eq!(payout, Amount::from_minor(6_650));
    }

    #[test]
    fn zero_amount_splits_to_zero() {
        let (payout, commission) = split(Amount::ZERO, COMMISSION_RATE_BPS);
        assert_eq!(payout, Amount::ZERO);
        assert_eq!(commission, Amount::ZERO);
    }

    #[test]
    fn zero_rate_pays_out_everything() {
        let (payout, commission) = split(Amount::from_minor(9_999), 0);
        assert_eq!(payout, Amount::from_minor(9_999));
        assert_eq!(commission, Amount::ZERO);
    }

    #[test]
    fn full_rate_pays_out_nothing() {
        let (payout, commission) = split(Amount::from_minor(123), 10_000);
        assert_eq!(payout, Amount::ZERO);
        assert_eq!(commission, Amount::from_minor(123));
    }

    #[test]
    fn rounding_residue_goes_to_commission() {
        // 5% of 10 minor units is 0.5, rounded up to 1.
        let (payout, commission) = split(Amount::from_minor(10), COMMISSION_RATE_BPS);
        assert_eq!(commission, Amount::from_minor(1));
        assert_eq!(payout, Amount::from_minor(9));
    }

    #[test]
    fn identity_holds_across_amounts_and_rates() {
        for amount in (0..5_000).chain([u64::MAX / BPS_DENOMINATOR as u64]) {
            for rate in [0, 1, 250, 500, 3_333, 9_999, 10_000] {
                let amount = Amount::from_minor(amount);
                let (payout, commission) = split(amount, rate);
                assert_eq!(payout + commission, amount, "amount={amount} rate={rate}");
            }
        }
    }
}

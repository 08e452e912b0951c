use crate::Amount;

/// A user's wallet: spendable balance plus funds held in escrow pending
/// booking resolution. Both buckets are non-negative by construction; the
/// ledger verifies sufficiency before calling any mutator here.
#[derive(Debug, Default, Clone, Copy)]
pub struct Wallet {
    balance: Amount,
    escrow: Amount,
}

impl Wallet {
    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn escrow(&self) -> Amount {
        self.escrow
    }

    /// Total value held for the user, spendable or not.
    pub fn total(&self) -> Amount {
        self.balance + self.escrow
    }

    pub(super) fn credit(&mut self, amount: Amount) {
        self.balance += amount;
    }

    pub(super) fn debit(&mut self, amount: Amount) {
        self.balance -= amount;
    }

    /// Move spendable funds into the escrow bucket as one step.
    pub(super) fn hold(&mut self, amount: Amount) {
        self.balance -= amount;
        self.escrow += amount;
    }

    /// Remove settled funds from escrow (they land in the agent's wallet,
    /// not back here).
    pub(super) fn release(&mut self, amount: Amount) {
        self.escrow -= amount;
    }

    /// Move escrowed funds back to the spendable bucket as one step.
    pub(super) fn refund(&mut self, amount: Amount) {
        self.escrow -= amount;
        self.balance += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_default_is_empty() {
        let wallet = Wallet::default();
        assert_eq!(wallet.balance(), Amount::ZERO);
        assert_eq!(wallet.escrow(), Amount::ZERO);
        assert_eq!(wallet.total(), Amount::ZERO);
    }

    #[test]
    fn hold_conserves_total() {
        let mut wallet = Wallet::default();
        wallet.credit(Amount::from_minor(10_000));
        wallet.hold(Amount::from_minor(7_000));

        assert_eq!(wallet.balance(), Amount::from_minor(3_000));
        assert_eq!(wallet.escrow(), Amount::from_minor(7_000));
        assert_eq!(wallet.total(), Amount::from_minor(10_000));
    }

    #[test]
    fn refund_restores_spendable_balance() {
        let mut wallet = Wallet::default();
        wallet.credit(Amount::from_minor(10_000));
        wallet.hold(Amount::from_minor(7_000));
        wallet.refund(Amount::from_minor(7_000));

        assert_eq!(wallet.balance(), Amount::from_minor(10_000));
        assert_eq!(wallet.escrow(), Amount::ZERO);
    }

    #[test]
    fn release_drops_total_by_settled_amount() {
        let mut wallet = Wallet::default();
        wallet.credit(Amount::from_minor(10_000));
        wallet.hold(Amount::from_minor(7_000));
        wallet.release(Amount::from_minor(7_000));

        assert_eq!(wallet.balance(), Amount::from_minor(3_000));
        assert_eq!(wallet.escrow(), Amount::ZERO);
        assert_eq!(wallet.total(), Amount::from_minor(3_000));
    }
}

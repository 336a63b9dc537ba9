//! Account ledger: admission-controlled balance mutation.
//!
//! Every mutation is a single check-then-mutate step. When the admission
//! check fails the account is left exactly as it was and the reason is
//! returned to the caller; nothing is ever half applied.
//!
//! # Admission rules
//!
//! - Credits are always admitted (as long as the balance stays representable).
//! - Checking accounts may be debited down to `-overdraft_limit_cents`.
//! - Savings accounts may not be debited below `minimum_balance_cents`, and
//!   refuse direct withdrawals once they are at or below that minimum.

use chrono::Utc;
use serde::Serialize;

use crate::models::account::{Account, AccountKind};

/// A non-negative amount of money in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Returns `None` for negative values.
    pub fn from_cents(cents: i64) -> Option<Self> {
        (cents >= 0).then_some(Self(cents))
    }

    pub fn cents(self) -> i64 {
        self.0
    }
}

/// Why a ledger operation was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum DeclineReason {
    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Debit would take the balance below the minimum balance")]
    BelowMinimumBalance,

    #[error("Withdrawals are not allowed on this account")]
    WithdrawalNotAllowed,

    #[error("Balance would overflow")]
    BalanceOverflow,
}

impl DeclineReason {
    pub fn code(&self) -> &'static str {
        match self {
            DeclineReason::InsufficientFunds => "insufficient_funds",
            DeclineReason::BelowMinimumBalance => "below_minimum_balance",
            DeclineReason::WithdrawalNotAllowed => "withdrawal_not_allowed",
            DeclineReason::BalanceOverflow => "balance_overflow",
        }
    }
}

impl Account {
    /// Balance after crediting `amount`, if the credit is admitted.
    fn credited_balance(&self, amount: Amount) -> Result<i64, DeclineReason> {
        self.balance_cents
            .checked_add(amount.cents())
            .ok_or(DeclineReason::BalanceOverflow)
    }

    /// Balance after debiting `amount`, if the debit is admitted.
    fn debited_balance(&self, amount: Amount) -> Result<i64, DeclineReason> {
        let after = self
            .balance_cents
            .checked_sub(amount.cents())
            .ok_or(DeclineReason::InsufficientFunds)?;

        match self.kind {
            AccountKind::Checking {
                overdraft_limit_cents,
            } => {
                if after >= -overdraft_limit_cents.max(0) {
                    Ok(after)
                } else {
                    Err(DeclineReason::InsufficientFunds)
                }
            }
            AccountKind::Savings {
                minimum_balance_cents,
            } => {
                if after >= minimum_balance_cents {
                    Ok(after)
                } else {
                    Err(DeclineReason::BelowMinimumBalance)
                }
            }
        }
    }

    fn set_balance(&mut self, balance_cents: i64) {
        self.balance_cents = balance_cents;
        self.updated_at = Utc::now();
    }

    pub fn can_credit(&self, amount: Amount) -> bool {
        self.credited_balance(amount).is_ok()
    }

    pub fn credit(&mut self, amount: Amount) -> Result<(), DeclineReason> {
        let balance = self.credited_balance(amount)?;
        self.set_balance(balance);
        Ok(())
    }

    pub fn can_debit(&self, amount: Amount) -> bool {
        self.debited_balance(amount).is_ok()
    }

    /// Debit `amount`, or leave the balance untouched if not admitted.
    pub fn debit(&mut self, amount: Amount) -> Result<(), DeclineReason> {
        let balance = self.debited_balance(amount)?;
        self.set_balance(balance);
        Ok(())
    }

    /// Coarse check that does not depend on the amount.
    pub fn can_withdraw(&self) -> bool {
        match self.kind {
            AccountKind::Checking { .. } => true,
            AccountKind::Savings {
                minimum_balance_cents,
            } => self.balance_cents > minimum_balance_cents,
        }
    }

    /// Withdraw cash: `can_withdraw` and then `can_debit` must both hold.
    pub fn withdraw(&mut self, amount: Amount) -> Result<(), DeclineReason> {
        if !self.can_withdraw() {
            return Err(DeclineReason::WithdrawalNotAllowed);
        }
        self.debit(amount)
    }
}

/// Move `amount` from `src` to `dst`.
///
/// Both admission checks run before either balance is touched, so on error
/// neither account has changed.
pub fn transfer(src: &mut Account, dst: &mut Account, amount: Amount) -> Result<(), DeclineReason> {
    let src_balance = src.debited_balance(amount)?;
    let dst_balance = dst.credited_balance(amount)?;

    src.set_balance(src_balance);
    dst.set_balance(dst_balance);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn account(kind: AccountKind, balance_cents: i64) -> Account {
        let mut account = Account::new(Uuid::new_v4(), kind);
        account.balance_cents = balance_cents;
        account
    }

    fn checking(balance_cents: i64, overdraft_limit_cents: i64) -> Account {
        account(
            AccountKind::Checking {
                overdraft_limit_cents,
            },
            balance_cents,
        )
    }

    fn savings(balance_cents: i64, minimum_balance_cents: i64) -> Account {
        account(
            AccountKind::Savings {
                minimum_balance_cents,
            },
            balance_cents,
        )
    }

    fn amount(cents: i64) -> Amount {
        Amount::from_cents(cents).unwrap()
    }

    #[test]
    fn negative_amounts_are_not_representable() {
        assert_eq!(Amount::from_cents(-1), None);
        assert_eq!(Amount::from_cents(0), Some(Amount::ZERO));
    }

    #[test]
    fn checking_overdraft_boundary() {
        let account = checking(100, 50);
        assert!(account.can_debit(amount(140)));
        assert!(account.can_debit(amount(150)));
        assert!(!account.can_debit(amount(160)));
    }

    #[test]
    fn checking_debit_may_go_negative_within_overdraft() {
        let mut account = checking(100, 50);
        account.debit(amount(140)).unwrap();
        assert_eq!(account.balance_cents, -40);
    }

    #[test]
    fn savings_debit_stops_at_minimum_balance() {
        let mut account = savings(15_000, 10_000);
        assert_eq!(
            account.debit(amount(5_001)),
            Err(DeclineReason::BelowMinimumBalance)
        );
        assert_eq!(account.balance_cents, 15_000);

        account.debit(amount(5_000)).unwrap();
        assert_eq!(account.balance_cents, 10_000);
    }

    #[test]
    fn savings_at_minimum_refuses_any_withdrawal() {
        let mut account = savings(10_000, 10_000);
        assert!(!account.can_withdraw());
        assert_eq!(
            account.withdraw(Amount::ZERO),
            Err(DeclineReason::WithdrawalNotAllowed)
        );
        assert!(savings(10_001, 10_000).can_withdraw());
    }

    #[test]
    fn checking_can_always_withdraw_but_still_respects_overdraft() {
        let mut account = checking(0, 0);
        assert!(account.can_withdraw());
        assert_eq!(
            account.withdraw(amount(1)),
            Err(DeclineReason::InsufficientFunds)
        );
        assert_eq!(account.balance_cents, 0);
    }

    #[test]
    fn transfer_between_unconstrained_accounts() {
        let mut src = checking(100, 0);
        let mut dst = checking(0, 0);

        transfer(&mut src, &mut dst, amount(50)).unwrap();

        assert_eq!(src.balance_cents, 50);
        assert_eq!(dst.balance_cents, 50);
    }

    #[test]
    fn declined_transfer_touches_neither_account() {
        let mut src = savings(100, 100);
        let mut dst = checking(0, 0);

        assert_eq!(
            transfer(&mut src, &mut dst, amount(1)),
            Err(DeclineReason::BelowMinimumBalance)
        );
        assert_eq!(src.balance_cents, 100);
        assert_eq!(dst.balance_cents, 0);
    }

    #[test]
    fn transfer_declined_when_destination_would_overflow() {
        let mut src = checking(10, 0);
        let mut dst = checking(i64::MAX, 0);

        assert_eq!(
            transfer(&mut src, &mut dst, amount(10)),
            Err(DeclineReason::BalanceOverflow)
        );
        assert_eq!(src.balance_cents, 10);
        assert_eq!(dst.balance_cents, i64::MAX);
    }

    fn any_account() -> impl Strategy<Value = Account> {
        (any::<bool>(), -1_000_000i64..1_000_000, 0i64..100_000).prop_map(
            |(is_checking, balance, policy)| {
                if is_checking {
                    checking(balance.max(-policy), policy)
                } else {
                    savings(balance.max(policy), policy)
                }
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn credit_adds_exactly_the_amount(
            mut account in any_account(),
            cents in 0i64..10_000_000
        ) {
            let before = account.balance_cents;
            prop_assert!(account.can_credit(amount(cents)));
            account.credit(amount(cents)).unwrap();
            prop_assert_eq!(account.balance_cents, before + cents);
        }

        #[test]
        fn inadmissible_debit_leaves_balance_unchanged(
            mut account in any_account(),
            cents in 0i64..10_000_000
        ) {
            let before = account.balance_cents;
            let admitted = account.can_debit(amount(cents));
            let result = account.debit(amount(cents));

            prop_assert_eq!(admitted, result.is_ok());
            if admitted {
                prop_assert_eq!(account.balance_cents, before - cents);
            } else {
                prop_assert_eq!(account.balance_cents, before);
            }
        }

        #[test]
        fn balance_never_crosses_policy_floor(
            mut account in any_account(),
            debits in prop::collection::vec(0i64..500_000, 1..20)
        ) {
            for cents in debits {
                let _ = account.debit(amount(cents));
                match account.kind {
                    AccountKind::Checking { overdraft_limit_cents } => {
                        prop_assert!(account.balance_cents >= -overdraft_limit_cents);
                    }
                    AccountKind::Savings { minimum_balance_cents } => {
                        prop_assert!(account.balance_cents >= minimum_balance_cents);
                    }
                }
            }
        }

        #[test]
        fn transfer_is_all_or_nothing(
            mut src in any_account(),
            mut dst in any_account(),
            cents in 0i64..2_000_000
        ) {
            let (src_before, dst_before) = (src.balance_cents, dst.balance_cents);

            match transfer(&mut src, &mut dst, amount(cents)) {
                Ok(()) => {
                    prop_assert_eq!(src.balance_cents, src_before - cents);
                    prop_assert_eq!(dst.balance_cents, dst_before + cents);
                }
                Err(_) => {
                    prop_assert_eq!(src.balance_cents, src_before);
                    prop_assert_eq!(dst.balance_cents, dst_before);
                }
            }
        }
    }
}

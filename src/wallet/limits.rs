//! Spending limits, usage tracking and direct withdrawals
//!
//! Limits and usage are keyed by (member, category, period). Usage never
//! rolls over on its own; the owner resets it explicitly.

use crate::wallet::error::WalletError;
use crate::wallet::ledger::FamilyWallet;
use crate::wallet::types::{
    check_memo, Amount, Category, Context, LimitKey, Period, Principal, Role,
};

impl FamilyWallet {
    /// Set the ceiling for `who` in a category and period (owner only)
    pub fn set_limit(
        &mut self,
        ctx: &Context,
        who: Principal,
        category: &str,
        limit: Amount,
        period: u64,
    ) -> Result<(), WalletError> {
        self.require_owner(&ctx.caller)?;
        let category: Category = category.parse()?;
        let period = Period::try_from(period)?;
        if limit == 0 {
            return Err(WalletError::InvalidAmount);
        }

        log::info!("Limit set: {} {}/{} = {}", who, category, period, limit);
        self.limits.insert(LimitKey::new(&who, category, period), limit);
        Ok(())
    }

    /// Zero the usage counter for `who` (owner only)
    ///
    /// Category and period are not validated. A key that does not parse can
    /// never have accumulated usage, so it is accepted as a no-op.
    pub fn reset_usage(
        &mut self,
        ctx: &Context,
        who: &Principal,
        category: &str,
        period: u64,
    ) -> Result<(), WalletError> {
        self.require_owner(&ctx.caller)?;

        let (Ok(category), Ok(period)) = (category.parse::<Category>(), Period::try_from(period))
        else {
            log::debug!("Usage reset for unknown key {}/{}/{}", who, category, period);
            return Ok(());
        };

        self.usage.insert(LimitKey::new(who, category, period), 0);
        log::info!("Usage reset: {} {}/{}", who, category, period);
        Ok(())
    }

    /// Configured ceiling, if any
    pub fn get_limit(&self, who: &Principal, category: Category, period: Period) -> Option<Amount> {
        self.limits
            .get(&LimitKey::new(who, category, period))
            .copied()
    }

    /// Recorded usage, if any
    pub fn get_usage(&self, who: &Principal, category: Category, period: Period) -> Option<Amount> {
        self.usage
            .get(&LimitKey::new(who, category, period))
            .copied()
    }

    /// Limit minus usage, never below zero
    pub fn remaining_allowance(
        &self,
        who: &Principal,
        category: Category,
        period: Period,
    ) -> Amount {
        let limit = self.get_limit(who, category, period).unwrap_or(0);
        let used = self.get_usage(who, category, period).unwrap_or(0);
        limit.saturating_sub(used)
    }

    pub(crate) fn record_usage(
        &mut self,
        who: &Principal,
        category: Category,
        period: Period,
        amount: Amount,
    ) {
        let used = self
            .usage
            .entry(LimitKey::new(who, category, period))
            .or_insert(0);
        *used = used.saturating_add(amount);
    }

    /// Withdraw directly from the pool
    ///
    /// Owners bypass limits. Members spend from their remaining allowance and
    /// must go through a proposal once it is exhausted. Viewers cannot
    /// withdraw.
    pub fn withdraw(
        &mut self,
        ctx: &Context,
        amount: Amount,
        memo: &str,
        category: &str,
        period: u64,
    ) -> Result<(), WalletError> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount);
        }
        check_memo(memo)?;
        let category: Category = category.parse()?;
        let period = Period::try_from(period)?;

        if self.is_paused {
            return Err(WalletError::WalletPaused);
        }

        let role = self.require_active(&ctx.caller)?.role;
        let insufficient = WalletError::InsufficientBalance {
            available: self.total_balance,
            requested: amount,
        };

        match role {
            Role::Owner => {
                if self.total_balance < amount {
                    return Err(insufficient);
                }
            }
            Role::Member => {
                let limit = self.get_limit(&ctx.caller, category, period).unwrap_or(0);
                if self.remaining_allowance(&ctx.caller, category, period) < amount {
                    return Err(if limit > 0 {
                        WalletError::OverLimit
                    } else {
                        WalletError::ApprovalRequired
                    });
                }
                if self.total_balance < amount {
                    return Err(insufficient);
                }
                self.record_usage(&ctx.caller, category, period, amount);
            }
            Role::Viewer => return Err(WalletError::Unauthorized),
        }

        self.total_balance -= amount;
        self.debit_balance(&ctx.caller, amount);

        log::info!(
            "Withdrawal: {} took {} for {} ({})",
            ctx.caller,
            amount,
            category,
            memo
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::config::WalletConfig;

    const OWNER: &str = "ST1OWNER";
    const ALICE: &str = "ST1ALICE";

    fn ctx(caller: &str) -> Context {
        Context::new(caller, 0)
    }

    /// Wallet with 2000 from Alice and a 200 weekly bills limit for her
    fn funded_wallet() -> FamilyWallet {
        let mut wallet =
            FamilyWallet::new(Principal::new(OWNER), 0, WalletConfig::default()).unwrap();
        wallet.deposit(&ctx(ALICE), 2000).unwrap();
        wallet
            .set_limit(&ctx(OWNER), Principal::new(ALICE), "bills", 200, 604_800)
            .unwrap();
        wallet
    }

    #[test]
    fn test_set_limit() {
        let wallet = funded_wallet();
        let alice = Principal::new(ALICE);

        assert_eq!(wallet.get_limit(&alice, Category::Bills, Period::Week), Some(200));
        assert_eq!(wallet.get_limit(&alice, Category::Bills, Period::Day), None);
        assert_eq!(wallet.get_limit(&alice, Category::Fun, Period::Week), None);
    }

    #[test]
    fn test_set_limit_validation() {
        let mut wallet = funded_wallet();
        let before = wallet.clone();

        let result = wallet.set_limit(&ctx(ALICE), Principal::new(ALICE), "bills", 1000, 604_800);
        assert!(matches!(result, Err(WalletError::Unauthorized)));

        let result = wallet.set_limit(&ctx(OWNER), Principal::new(ALICE), "travel", 10, 604_800);
        assert!(matches!(result, Err(WalletError::InvalidCategory(_))));

        let result = wallet.set_limit(&ctx(OWNER), Principal::new(ALICE), "fun", 10, 3600);
        assert!(matches!(result, Err(WalletError::InvalidPeriod(3600))));

        let result = wallet.set_limit(&ctx(OWNER), Principal::new(ALICE), "fun", 0, 86_400);
        assert!(matches!(result, Err(WalletError::InvalidAmount)));

        assert_eq!(wallet, before);
    }

    #[test]
    fn test_member_withdraw_within_limit() {
        let mut wallet = funded_wallet();
        let alice = Principal::new(ALICE);

        wallet.withdraw(&ctx(ALICE), 150, "electric", "bills", 604_800).unwrap();

        assert_eq!(wallet.get_total_balance(), 1850);
        assert_eq!(wallet.get_member_balance(&alice), 1850);
        assert_eq!(wallet.get_usage(&alice, Category::Bills, Period::Week), Some(150));
        assert_eq!(wallet.remaining_allowance(&alice, Category::Bills, Period::Week), 50);
    }

    #[test]
    fn test_member_withdraw_over_limit() {
        let mut wallet = funded_wallet();
        let before = wallet.clone();

        let result = wallet.withdraw(&ctx(ALICE), 300, "memo", "bills", 604_800);
        assert!(matches!(result, Err(WalletError::OverLimit)));
        assert_eq!(wallet, before);
        assert_eq!(wallet.get_total_balance(), 2000);
    }

    #[test]
    fn test_member_withdraw_exhausts_limit() {
        let mut wallet = funded_wallet();

        wallet.withdraw(&ctx(ALICE), 200, "memo", "bills", 604_800).unwrap();
        let result = wallet.withdraw(&ctx(ALICE), 1, "memo", "bills", 604_800);
        assert!(matches!(result, Err(WalletError::OverLimit)));
    }

    #[test]
    fn test_member_withdraw_without_limit() {
        let mut wallet = funded_wallet();

        let result = wallet.withdraw(&ctx(ALICE), 10, "memo", "fun", 604_800);
        assert!(matches!(result, Err(WalletError::ApprovalRequired)));

        // Limits are per period too
        let result = wallet.withdraw(&ctx(ALICE), 10, "memo", "bills", 86_400);
        assert!(matches!(result, Err(WalletError::ApprovalRequired)));
    }

    #[test]
    fn test_member_withdraw_pool_short() {
        let mut wallet = funded_wallet();
        wallet.withdraw(&ctx(OWNER), 1900, "", "other", 86_400).unwrap();
        let before = wallet.clone();

        let result = wallet.withdraw(&ctx(ALICE), 150, "memo", "bills", 604_800);
        assert!(matches!(
            result,
            Err(WalletError::InsufficientBalance {
                available: 100,
                requested: 150
            })
        ));
        assert_eq!(wallet, before);
    }

    #[test]
    fn test_owner_withdraw_bypasses_limits() {
        let mut wallet = funded_wallet();
        let owner = Principal::new(OWNER);

        wallet.withdraw(&ctx(OWNER), 1500, "car repair", "transport", 2_592_000).unwrap();

        assert_eq!(wallet.get_total_balance(), 500);
        assert_eq!(wallet.get_member_balance(&owner), -1500);
        assert_eq!(wallet.get_usage(&owner, Category::Transport, Period::Month), None);
    }

    #[test]
    fn test_owner_withdraw_insufficient_balance() {
        let mut wallet =
            FamilyWallet::new(Principal::new(OWNER), 0, WalletConfig::default()).unwrap();

        let result = wallet.withdraw(&ctx(OWNER), 100, "groceries", "bills", 604_800);
        assert!(matches!(
            result,
            Err(WalletError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_withdraw_validation_order() {
        let mut wallet = funded_wallet();
        let long_memo = "x".repeat(35);

        assert!(matches!(
            wallet.withdraw(&ctx(ALICE), 0, &long_memo, "nope", 1),
            Err(WalletError::InvalidAmount)
        ));
        assert!(matches!(
            wallet.withdraw(&ctx(ALICE), 10, &long_memo, "nope", 1),
            Err(WalletError::InvalidMemo { len: 35 })
        ));
        assert!(matches!(
            wallet.withdraw(&ctx(ALICE), 10, "memo", "invalid", 1),
            Err(WalletError::InvalidCategory(_))
        ));
        assert!(matches!(
            wallet.withdraw(&ctx(ALICE), 10, "memo", "bills", 1),
            Err(WalletError::InvalidPeriod(1))
        ));
    }

    #[test]
    fn test_withdraw_when_paused() {
        let mut wallet = funded_wallet();
        wallet.pause_wallet(&ctx(OWNER), true).unwrap();

        let result = wallet.withdraw(&ctx(ALICE), 100, "memo", "bills", 604_800);
        assert!(matches!(result, Err(WalletError::WalletPaused)));

        let result = wallet.withdraw(&ctx(OWNER), 100, "memo", "bills", 604_800);
        assert!(matches!(result, Err(WalletError::WalletPaused)));
    }

    #[test]
    fn test_withdraw_unauthorized() {
        let mut wallet = funded_wallet();
        wallet
            .add_member(&ctx(OWNER), Principal::new("ST1VIEWER"), "viewer")
            .unwrap();

        let result = wallet.withdraw(&ctx("ST1FAKE"), 100, "memo", "bills", 604_800);
        assert!(matches!(result, Err(WalletError::Unauthorized)));

        let result = wallet.withdraw(&ctx("ST1VIEWER"), 100, "memo", "bills", 604_800);
        assert!(matches!(result, Err(WalletError::Unauthorized)));

        wallet.remove_member(&ctx(OWNER), &Principal::new(ALICE)).unwrap();
        let result = wallet.withdraw(&ctx(ALICE), 100, "memo", "bills", 604_800);
        assert!(matches!(result, Err(WalletError::Unauthorized)));
    }

    #[test]
    fn test_reset_usage() {
        let mut wallet = funded_wallet();
        let alice = Principal::new(ALICE);
        wallet.withdraw(&ctx(ALICE), 200, "memo", "bills", 604_800).unwrap();

        let result = wallet.reset_usage(&ctx(ALICE), &alice, "bills", 604_800);
        assert!(matches!(result, Err(WalletError::Unauthorized)));

        wallet.reset_usage(&ctx(OWNER), &alice, "bills", 604_800).unwrap();
        assert_eq!(wallet.get_usage(&alice, Category::Bills, Period::Week), Some(0));
        assert!(wallet.withdraw(&ctx(ALICE), 200, "memo", "bills", 604_800).is_ok());
    }

    #[test]
    fn test_reset_usage_unknown_key_is_noop() {
        let mut wallet = funded_wallet();
        let before = wallet.clone();

        wallet
            .reset_usage(&ctx(OWNER), &Principal::new(ALICE), "invalid", 1)
            .unwrap();
        assert_eq!(wallet, before);
    }
}

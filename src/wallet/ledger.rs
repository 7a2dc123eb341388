//! Family wallet ledger
//!
//! The single state aggregate behind every wallet operation. This file holds
//! the state container, the membership registry and the balance ledger; the
//! limit tracker and proposal engine extend the same type in sibling modules.

use crate::wallet::config::WalletConfig;
use crate::wallet::error::WalletError;
use crate::wallet::proposal::Proposal;
use crate::wallet::types::{Amount, Balance, Context, Height, LimitKey, Member, Principal, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shared-custody wallet state
///
/// All mutation goes through `&mut self` methods that validate first and
/// mutate last, so a failed call leaves the ledger untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyWallet {
    pub(crate) config: WalletConfig,
    /// Authoritative spendable pool
    pub(crate) total_balance: Amount,
    pub(crate) is_paused: bool,
    pub(crate) next_proposal_id: u64,
    pub(crate) members: BTreeMap<Principal, Member>,
    pub(crate) balances: BTreeMap<Principal, Balance>,
    #[serde(with = "entries")]
    pub(crate) limits: BTreeMap<LimitKey, Amount>,
    #[serde(with = "entries")]
    pub(crate) usage: BTreeMap<LimitKey, Amount>,
    pub(crate) proposals: BTreeMap<u64, Proposal>,
}

impl FamilyWallet {
    /// Create a wallet owned by `owner`
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration cannot work
    pub fn new(
        owner: Principal,
        height: Height,
        config: WalletConfig,
    ) -> Result<Self, WalletError> {
        config.validate()?;

        let mut members = BTreeMap::new();
        members.insert(owner.clone(), Member::new(Role::Owner, height));
        let mut balances = BTreeMap::new();
        balances.insert(owner.clone(), 0);

        log::info!(
            "Wallet created by {} (threshold {}, max {} members)",
            owner,
            config.approval_threshold,
            config.max_members
        );

        Ok(Self {
            config,
            total_balance: 0,
            is_paused: false,
            next_proposal_id: 0,
            members,
            balances,
            limits: BTreeMap::new(),
            usage: BTreeMap::new(),
            proposals: BTreeMap::new(),
        })
    }

    /// Create a wallet with the default configuration
    pub fn with_defaults(owner: Principal, height: Height) -> Result<Self, WalletError> {
        Self::new(owner, height, WalletConfig::default())
    }

    // =========================================================================
    // Authorization helpers
    // =========================================================================

    pub(crate) fn require_owner(&self, caller: &Principal) -> Result<(), WalletError> {
        match self.members.get(caller) {
            Some(member) if member.is_active_owner() => Ok(()),
            _ => Err(WalletError::Unauthorized),
        }
    }

    pub(crate) fn require_active(&self, caller: &Principal) -> Result<&Member, WalletError> {
        self.members
            .get(caller)
            .filter(|m| m.active)
            .ok_or(WalletError::Unauthorized)
    }

    pub(crate) fn debit_balance(&mut self, who: &Principal, amount: Amount) {
        *self.balances.entry(who.clone()).or_insert(0) -= Balance::from(amount);
    }

    // =========================================================================
    // Membership registry
    // =========================================================================

    /// Register `who` with the given role (owner only)
    ///
    /// Only `member` and `viewer` can be granted; there is one owner.
    pub fn add_member(
        &mut self,
        ctx: &Context,
        who: Principal,
        role: &str,
    ) -> Result<(), WalletError> {
        self.require_owner(&ctx.caller)?;

        let role: Role = role.parse()?;
        if role == Role::Owner {
            return Err(WalletError::InvalidRole(role.to_string()));
        }

        if self.members.contains_key(&who) {
            return Err(WalletError::AlreadyMember(who));
        }

        log::info!("Member added: {} as {} at height {}", who, role, ctx.height);
        self.members.insert(who, Member::new(role, ctx.height));
        Ok(())
    }

    /// Deactivate `who` (owner only); the record and balance are kept
    pub fn remove_member(&mut self, ctx: &Context, who: &Principal) -> Result<(), WalletError> {
        self.require_owner(&ctx.caller)?;

        let member = self
            .members
            .get_mut(who)
            .ok_or_else(|| WalletError::MemberNotFound(who.clone()))?;
        member.active = false;

        log::info!("Member deactivated: {}", who);
        Ok(())
    }

    /// Re-enable a previously removed member (owner only)
    pub fn reactivate_member(&mut self, ctx: &Context, who: &Principal) -> Result<(), WalletError> {
        self.require_owner(&ctx.caller)?;

        let member = self
            .members
            .get(who)
            .ok_or_else(|| WalletError::MemberNotFound(who.clone()))?;
        if member.active {
            return Err(WalletError::AlreadyMember(who.clone()));
        }

        if self.active_member_count() >= self.config.max_members {
            return Err(WalletError::MaxMembersExceeded {
                max: self.config.max_members,
            });
        }

        if let Some(member) = self.members.get_mut(who) {
            member.active = true;
        }
        log::info!("Member reactivated: {}", who);
        Ok(())
    }

    /// Get the registry entry for `who`
    pub fn get_member(&self, who: &Principal) -> Option<&Member> {
        self.members.get(who)
    }

    /// All registry entries, active or not, ordered by identity
    pub fn members(&self) -> Vec<(&Principal, &Member)> {
        self.members.iter().collect()
    }

    /// Number of active members
    pub fn active_member_count(&self) -> usize {
        self.members.values().filter(|m| m.active).count()
    }

    // =========================================================================
    // Balance ledger
    // =========================================================================

    /// Add funds to the pool
    ///
    /// A first-time caller becomes a `member`, subject to the active member
    /// cap. Existing records, active or not, just top up their balance.
    pub fn deposit(&mut self, ctx: &Context, amount: Amount) -> Result<(), WalletError> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount);
        }

        if self.is_paused {
            return Err(WalletError::WalletPaused);
        }

        let is_new = !self.members.contains_key(&ctx.caller);
        if is_new && self.active_member_count() >= self.config.max_members {
            return Err(WalletError::MaxMembersExceeded {
                max: self.config.max_members,
            });
        }

        let new_total = self
            .total_balance
            .checked_add(amount)
            .ok_or(WalletError::Overflow)?;
        let current = self.get_member_balance(&ctx.caller);
        let new_balance = current
            .checked_add(Balance::from(amount))
            .ok_or(WalletError::Overflow)?;

        if is_new {
            self.members
                .insert(ctx.caller.clone(), Member::new(Role::Member, ctx.height));
            log::info!("New member joined by deposit: {}", ctx.caller);
        }
        self.balances.insert(ctx.caller.clone(), new_balance);
        self.total_balance = new_total;

        log::debug!("Deposit of {} from {}", amount, ctx.caller);
        Ok(())
    }

    /// Total spendable pool
    pub fn get_total_balance(&self) -> Amount {
        self.total_balance
    }

    /// Contribution balance of `who` (0 if unknown)
    pub fn get_member_balance(&self, who: &Principal) -> Balance {
        self.balances.get(who).copied().unwrap_or(0)
    }

    // =========================================================================
    // Administrative
    // =========================================================================

    /// Halt or resume deposits and withdrawals (owner only)
    pub fn pause_wallet(&mut self, ctx: &Context, pause: bool) -> Result<(), WalletError> {
        self.require_owner(&ctx.caller)?;
        self.is_paused = pause;
        log::info!("Wallet {} by {}", if pause { "paused" } else { "resumed" }, ctx.caller);
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }
}

/// Serialize a structured-key map as a list of `{ key, value }` entries
mod entries {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    struct Entry<K, V> {
        key: K,
        value: V,
    }

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter().map(|(key, value)| Entry { key, value }))
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry<K, V>>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.key, e.value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "ST1OWNER";
    const ALICE: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

    fn create_test_wallet() -> FamilyWallet {
        FamilyWallet::with_defaults(Principal::new(OWNER), 0).unwrap()
    }

    fn ctx(caller: &str) -> Context {
        Context::new(caller, 0)
    }

    #[test]
    fn test_wallet_creation() {
        let wallet = create_test_wallet();
        let owner = wallet.get_member(&Principal::new(OWNER)).unwrap();

        assert_eq!(owner.role, Role::Owner);
        assert!(owner.active);
        assert_eq!(wallet.get_total_balance(), 0);
        assert_eq!(wallet.active_member_count(), 1);
        assert!(!wallet.is_paused());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = WalletConfig {
            approval_threshold: 0,
            ..Default::default()
        };
        let result = FamilyWallet::new(Principal::new(OWNER), 0, config);
        assert!(matches!(result, Err(WalletError::InvalidConfig(_))));
    }

    #[test]
    fn test_deposit_creates_member() {
        let mut wallet = create_test_wallet();

        wallet.deposit(&Context::new(ALICE, 7), 1000).unwrap();

        assert_eq!(wallet.get_total_balance(), 1000);
        assert_eq!(wallet.get_member_balance(&Principal::new(ALICE)), 1000);
        let member = wallet.get_member(&Principal::new(ALICE)).unwrap();
        assert_eq!(member.role, Role::Member);
        assert!(member.active);
        assert_eq!(member.joined_at, 7);
    }

    #[test]
    fn test_repeat_deposit_accumulates() {
        let mut wallet = create_test_wallet();

        wallet.deposit(&ctx(ALICE), 1000).unwrap();
        wallet.deposit(&ctx(ALICE), 250).unwrap();

        assert_eq!(wallet.get_total_balance(), 1250);
        assert_eq!(wallet.get_member_balance(&Principal::new(ALICE)), 1250);
        assert_eq!(wallet.active_member_count(), 2);
    }

    #[test]
    fn test_deposit_zero_amount() {
        let mut wallet = create_test_wallet();
        let before = wallet.clone();

        let result = wallet.deposit(&ctx(ALICE), 0);
        assert!(matches!(result, Err(WalletError::InvalidAmount)));
        assert_eq!(wallet, before);
    }

    #[test]
    fn test_deposit_when_paused() {
        let mut wallet = create_test_wallet();
        wallet.pause_wallet(&ctx(OWNER), true).unwrap();
        let before = wallet.clone();

        let result = wallet.deposit(&ctx(ALICE), 100);
        assert!(matches!(result, Err(WalletError::WalletPaused)));
        assert_eq!(wallet, before);

        wallet.pause_wallet(&ctx(OWNER), false).unwrap();
        assert!(wallet.deposit(&ctx(ALICE), 100).is_ok());
    }

    #[test]
    fn test_deposit_over_max_members() {
        let mut wallet = create_test_wallet();

        // Owner plus nine depositors fills the ten slots
        for i in 0..9 {
            wallet.deposit(&ctx(&format!("ST1MEMBER{}", i)), 100).unwrap();
        }
        assert_eq!(wallet.active_member_count(), 10);

        let before = wallet.clone();
        let result = wallet.deposit(&ctx("ST1NEW"), 100);
        assert!(matches!(
            result,
            Err(WalletError::MaxMembersExceeded { max: 10 })
        ));
        assert_eq!(wallet, before);

        // Existing members can still top up
        wallet.deposit(&ctx("ST1MEMBER3"), 50).unwrap();
        assert_eq!(wallet.get_member_balance(&Principal::new("ST1MEMBER3")), 150);
    }

    #[test]
    fn test_deposit_overflow() {
        let mut wallet = create_test_wallet();
        wallet.deposit(&ctx(ALICE), u64::MAX).unwrap();
        let before = wallet.clone();

        let result = wallet.deposit(&ctx(OWNER), 1);
        assert!(matches!(result, Err(WalletError::Overflow)));
        assert_eq!(wallet, before);
    }

    #[test]
    fn test_add_member() {
        let mut wallet = create_test_wallet();

        wallet
            .add_member(&Context::new(OWNER, 12), Principal::new("ST1VIEWER"), "viewer")
            .unwrap();

        let member = wallet.get_member(&Principal::new("ST1VIEWER")).unwrap();
        assert_eq!(member.role, Role::Viewer);
        assert_eq!(member.joined_at, 12);
        assert!(member.active);
    }

    #[test]
    fn test_add_member_non_owner() {
        let mut wallet = create_test_wallet();
        wallet.deposit(&ctx(ALICE), 100).unwrap();

        let result = wallet.add_member(&ctx(ALICE), Principal::new("ST1MEMBER"), "member");
        assert!(matches!(result, Err(WalletError::Unauthorized)));
    }

    #[test]
    fn test_add_member_invalid_role() {
        let mut wallet = create_test_wallet();

        let result = wallet.add_member(&ctx(OWNER), Principal::new("ST1MEMBER"), "owner");
        assert!(matches!(result, Err(WalletError::InvalidRole(_))));

        let result = wallet.add_member(&ctx(OWNER), Principal::new("ST1MEMBER"), "admin");
        assert!(matches!(result, Err(WalletError::InvalidRole(_))));
        assert!(wallet.get_member(&Principal::new("ST1MEMBER")).is_none());
    }

    #[test]
    fn test_add_existing_member() {
        let mut wallet = create_test_wallet();

        wallet
            .add_member(&ctx(OWNER), Principal::new("ST1MEMBER"), "member")
            .unwrap();
        let result = wallet.add_member(&ctx(OWNER), Principal::new("ST1MEMBER"), "member");
        assert!(matches!(result, Err(WalletError::AlreadyMember(_))));

        // Inactive records still count as registered
        wallet
            .remove_member(&ctx(OWNER), &Principal::new("ST1MEMBER"))
            .unwrap();
        let result = wallet.add_member(&ctx(OWNER), Principal::new("ST1MEMBER"), "viewer");
        assert!(matches!(result, Err(WalletError::AlreadyMember(_))));
    }

    #[test]
    fn test_remove_member() {
        let mut wallet = create_test_wallet();
        wallet.deposit(&ctx(ALICE), 500).unwrap();

        wallet.remove_member(&ctx(OWNER), &Principal::new(ALICE)).unwrap();

        let member = wallet.get_member(&Principal::new(ALICE)).unwrap();
        assert!(!member.active);
        assert_eq!(member.role, Role::Member);
        assert_eq!(wallet.get_member_balance(&Principal::new(ALICE)), 500);
        assert_eq!(wallet.active_member_count(), 1);
    }

    #[test]
    fn test_remove_non_member() {
        let mut wallet = create_test_wallet();

        let result = wallet.remove_member(&ctx(OWNER), &Principal::new("ST1FAKE"));
        assert!(matches!(result, Err(WalletError::MemberNotFound(_))));
    }

    #[test]
    fn test_removed_owner_loses_authority() {
        let mut wallet = create_test_wallet();
        wallet.remove_member(&ctx(OWNER), &Principal::new(OWNER)).unwrap();

        let result = wallet.pause_wallet(&ctx(OWNER), true);
        assert!(matches!(result, Err(WalletError::Unauthorized)));
    }

    #[test]
    fn test_inactive_member_deposit_stays_inactive() {
        let mut wallet = create_test_wallet();
        wallet.deposit(&ctx(ALICE), 100).unwrap();
        wallet.remove_member(&ctx(OWNER), &Principal::new(ALICE)).unwrap();

        wallet.deposit(&ctx(ALICE), 100).unwrap();

        assert_eq!(wallet.get_member_balance(&Principal::new(ALICE)), 200);
        assert!(!wallet.get_member(&Principal::new(ALICE)).unwrap().active);
    }

    #[test]
    fn test_reactivate_member() {
        let mut wallet = create_test_wallet();
        let alice = Principal::new(ALICE);
        wallet.deposit(&ctx(ALICE), 100).unwrap();

        let result = wallet.reactivate_member(&ctx(OWNER), &alice);
        assert!(matches!(result, Err(WalletError::AlreadyMember(_))));

        wallet.remove_member(&ctx(OWNER), &alice).unwrap();
        wallet.reactivate_member(&ctx(OWNER), &alice).unwrap();
        assert!(wallet.get_member(&alice).unwrap().active);

        let result = wallet.reactivate_member(&ctx(OWNER), &Principal::new("ST1FAKE"));
        assert!(matches!(result, Err(WalletError::MemberNotFound(_))));
    }

    #[test]
    fn test_reactivate_respects_cap() {
        let config = WalletConfig {
            max_members: 2,
            ..Default::default()
        };
        let mut wallet = FamilyWallet::new(Principal::new(OWNER), 0, config).unwrap();
        wallet.deposit(&ctx(ALICE), 100).unwrap();
        wallet.remove_member(&ctx(OWNER), &Principal::new(ALICE)).unwrap();
        wallet.deposit(&ctx("ST1BOB"), 100).unwrap();

        let result = wallet.reactivate_member(&ctx(OWNER), &Principal::new(ALICE));
        assert!(matches!(
            result,
            Err(WalletError::MaxMembersExceeded { max: 2 })
        ));
    }

    #[test]
    fn test_pause_non_owner() {
        let mut wallet = create_test_wallet();
        wallet.deposit(&ctx(ALICE), 100).unwrap();

        let result = wallet.pause_wallet(&ctx(ALICE), true);
        assert!(matches!(result, Err(WalletError::Unauthorized)));
        assert!(!wallet.is_paused());
    }

    #[test]
    fn test_json_roundtrip_preserves_state() {
        let mut wallet = create_test_wallet();
        wallet.deposit(&ctx(ALICE), 2000).unwrap();
        wallet
            .set_limit(&ctx(OWNER), Principal::new(ALICE), "bills", 200, 604_800)
            .unwrap();
        wallet
            .create_proposal(&ctx(ALICE), 300, "bills", "rent", 604_800)
            .unwrap();

        let json = serde_json::to_string(&wallet).unwrap();
        let restored: FamilyWallet = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, wallet);
    }
}

//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Supply conservation: Σ(balances) == total_supply
//! - Zero address never holds a balance
//! - Rejected operations are inert (no state change, no event)
//! - Allowance algebra: approve overwrites, increase adds, full decrease zeroes

use proptest::prelude::*;
use token_ledger::{
    spawn_ledger_actor, AccountId, Amount, Error, InitParams, Metrics, TokenEvent, TokenLedger,
};

const INITIAL_SUPPLY: u64 = 100;

/// Accounts 1..=4 plus the zero address
fn account_strategy() -> impl Strategy<Value = AccountId> {
    prop_oneof![
        1 => Just(AccountId::ZERO),
        6 => (1u64..=4).prop_map(AccountId::from_low_u64),
    ]
}

/// Small amounts so that balance and allowance edges are hit often
fn amount_strategy() -> impl Strategy<Value = Amount> {
    prop_oneof![
        4 => (0u64..=120).prop_map(Amount::from),
        1 => Just(Amount::MAX),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Transfer(AccountId, AccountId, Amount),
    TransferFrom(AccountId, AccountId, AccountId, Amount),
    Approve(AccountId, AccountId, Amount),
    Increase(AccountId, AccountId, Amount),
    Decrease(AccountId, AccountId, Amount),
    Mint(AccountId, Amount),
    Burn(AccountId, Amount),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let a = account_strategy;
    prop_oneof![
        (a(), a(), amount_strategy()).prop_map(|(f, t, v)| Op::Transfer(f, t, v)),
        (a(), a(), a(), amount_strategy()).prop_map(|(s, f, t, v)| Op::TransferFrom(s, f, t, v)),
        (a(), a(), amount_strategy()).prop_map(|(o, s, v)| Op::Approve(o, s, v)),
        (a(), a(), amount_strategy()).prop_map(|(o, s, v)| Op::Increase(o, s, v)),
        (a(), a(), amount_strategy()).prop_map(|(o, s, v)| Op::Decrease(o, s, v)),
        (a(), amount_strategy()).prop_map(|(t, v)| Op::Mint(t, v)),
        (a(), amount_strategy()).prop_map(|(f, v)| Op::Burn(f, v)),
    ]
}

fn apply(ledger: &mut TokenLedger, op: &Op) -> token_ledger::Result<Vec<TokenEvent>> {
    match *op {
        Op::Transfer(from, to, v) => ledger.transfer(from, to, v),
        Op::TransferFrom(spender, from, to, v) => ledger.transfer_from(spender, from, to, v),
        Op::Approve(owner, spender, v) => ledger.approve(owner, spender, v),
        Op::Increase(owner, spender, v) => ledger.increase_allowance(owner, spender, v),
        Op::Decrease(owner, spender, v) => ledger.decrease_allowance(owner, spender, v),
        Op::Mint(to, v) => ledger.mint(to, v),
        Op::Burn(from, v) => ledger.burn(from, v),
    }
}

/// Observable state over every account the strategies can name
fn observe(ledger: &TokenLedger) -> (Amount, Vec<Amount>, Vec<Amount>, usize) {
    let accounts: Vec<AccountId> = std::iter::once(AccountId::ZERO)
        .chain((1u64..=4).map(AccountId::from_low_u64))
        .collect();
    let balances = accounts.iter().map(|a| ledger.balance_of(*a)).collect();
    let allowances = accounts
        .iter()
        .flat_map(|o| accounts.iter().map(move |s| (*o, *s)))
        .map(|(o, s)| ledger.allowance(o, s))
        .collect();
    (ledger.total_supply(), balances, allowances, ledger.events().len())
}

fn create_test_ledger() -> TokenLedger {
    let params = InitParams::new("My Token", "MTKN")
        .with_initial_mint(AccountId::from_low_u64(1), Amount::from(INITIAL_SUPPLY));
    TokenLedger::initialize(params).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: supply is conserved and rejected calls change nothing
    #[test]
    fn prop_supply_conserved_and_rejections_inert(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut ledger = create_test_ledger();

        for op in &ops {
            let before = observe(&ledger);
            match apply(&mut ledger, op) {
                Ok(events) => {
                    prop_assert!(!events.is_empty());
                    let log = ledger.events();
                    prop_assert_eq!(&log[log.len() - events.len()..], events.as_slice());
                }
                Err(_) => {
                    prop_assert_eq!(observe(&ledger), before);
                }
            }
            prop_assert!(ledger.check_supply_invariant().is_ok());
            prop_assert_eq!(ledger.balance_of(AccountId::ZERO), Amount::zero());
        }
    }

    /// Property: approve overwrites rather than adds
    #[test]
    fn prop_approve_idempotent(first in amount_strategy(), second in amount_strategy()) {
        let mut ledger = create_test_ledger();
        let owner = AccountId::from_low_u64(1);
        let spender = AccountId::from_low_u64(2);

        ledger.approve(owner, spender, first).unwrap();
        ledger.approve(owner, spender, second).unwrap();
        ledger.approve(owner, spender, second).unwrap();
        prop_assert_eq!(ledger.allowance(owner, spender), second);
    }

    /// Property: increases are additive from zero
    #[test]
    fn prop_increase_additive(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let mut ledger = create_test_ledger();
        let owner = AccountId::from_low_u64(1);
        let spender = AccountId::from_low_u64(2);

        ledger.increase_allowance(owner, spender, Amount::from(a)).unwrap();
        let events = ledger.increase_allowance(owner, spender, Amount::from(b)).unwrap();

        let total = Amount::from(a) + Amount::from(b);
        prop_assert_eq!(ledger.allowance(owner, spender), total);
        prop_assert_eq!(events, vec![TokenEvent::approval(owner, spender, total)]);
    }

    /// Property: decreasing by the full allowance always yields zero
    #[test]
    fn prop_decrease_round_trip(value in amount_strategy()) {
        let mut ledger = create_test_ledger();
        let owner = AccountId::from_low_u64(1);
        let spender = AccountId::from_low_u64(2);

        ledger.approve(owner, spender, value).unwrap();
        let current = ledger.allowance(owner, spender);
        let events = ledger.decrease_allowance(owner, spender, current).unwrap();

        prop_assert_eq!(ledger.allowance(owner, spender), Amount::zero());
        prop_assert_eq!(events, vec![TokenEvent::approval(owner, spender, Amount::zero())]);
    }

    /// Property: transfer_from reports the balance error whenever the balance is short
    #[test]
    fn prop_transfer_from_precedence(allowance in 0u64..=200, value in 0u64..=200) {
        let mut ledger = create_test_ledger();
        let owner = AccountId::from_low_u64(1);
        let spender = AccountId::from_low_u64(2);
        let to = AccountId::from_low_u64(3);

        ledger.approve(owner, spender, Amount::from(allowance)).unwrap();
        let result = ledger.transfer_from(spender, owner, to, Amount::from(value));

        if value > INITIAL_SUPPLY {
            prop_assert!(
                matches!(result, Err(Error::InsufficientBalance { .. })),
                "expected balance error, got {:?}",
                result
            );
        } else if value > allowance {
            prop_assert!(
                matches!(result, Err(Error::InsufficientAllowance { .. })),
                "expected allowance error, got {:?}",
                result
            );
        } else {
            prop_assert!(result.is_ok());
            prop_assert_eq!(ledger.allowance(owner, spender), Amount::from(allowance - value));
            prop_assert_eq!(ledger.balance_of(to), Amount::from(value));
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn holder() -> AccountId {
        AccountId::from_low_u64(1)
    }

    fn recipient() -> AccountId {
        AccountId::from_low_u64(2)
    }

    fn spender() -> AccountId {
        AccountId::from_low_u64(3)
    }

    #[test]
    fn test_initial_supply_scenario() {
        let ledger = create_test_ledger();
        assert_eq!(ledger.balance_of(holder()), Amount::from(100));
        assert_eq!(ledger.total_supply(), Amount::from(100));
    }

    #[test]
    fn test_delegated_spend_scenario() {
        let mut ledger = create_test_ledger();
        ledger.approve(holder(), spender(), Amount::from(100)).unwrap();
        let events = ledger
            .transfer_from(spender(), holder(), recipient(), Amount::from(100))
            .unwrap();

        assert_eq!(ledger.balance_of(holder()), Amount::zero());
        assert_eq!(ledger.balance_of(recipient()), Amount::from(100));
        assert_eq!(ledger.allowance(holder(), spender()), Amount::zero());
        assert_eq!(
            events,
            vec![
                TokenEvent::transfer(holder(), recipient(), Amount::from(100)),
                TokenEvent::approval(holder(), spender(), Amount::zero()),
            ]
        );
    }

    #[test]
    fn test_overdraft_scenario() {
        let mut ledger = create_test_ledger();
        let err = ledger
            .transfer(holder(), recipient(), Amount::from(101))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(holder()), Amount::from(100));
    }

    #[test]
    fn test_mint_then_burn_scenario() {
        let mut ledger = create_test_ledger();
        ledger.drain_events();
        ledger.mint(recipient(), Amount::from(50)).unwrap();
        ledger.burn(holder(), Amount::from(100)).unwrap();

        assert_eq!(ledger.total_supply(), Amount::from(50));
        assert_eq!(ledger.balance_of(holder()), Amount::zero());
        assert_eq!(
            ledger.drain_events(),
            vec![
                TokenEvent::transfer(AccountId::ZERO, recipient(), Amount::from(50)),
                TokenEvent::transfer(holder(), AccountId::ZERO, Amount::from(100)),
            ]
        );
    }

    #[test]
    fn test_decrease_below_zero_scenario() {
        let mut ledger = create_test_ledger();
        let first = ledger
            .decrease_allowance(holder(), spender(), Amount::one())
            .unwrap_err();
        ledger.approve(holder(), spender(), Amount::zero()).unwrap();
        let second = ledger
            .decrease_allowance(holder(), spender(), Amount::one())
            .unwrap_err();

        assert!(matches!(first, Error::AllowanceUnderflow { .. }));
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_approve_zero_spender_scenario() {
        let mut ledger = create_test_ledger();
        ledger.drain_events();
        let err = ledger
            .approve(holder(), AccountId::ZERO, Amount::from(100))
            .unwrap_err();

        assert!(matches!(err, Error::ZeroAddress(_)));
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_extreme_value_edges() {
        let mut ledger = TokenLedger::initialize(
            InitParams::new("My Token", "MTKN").with_initial_mint(holder(), Amount::MAX),
        )
        .unwrap();

        // Self transfer_from of the whole supply spends the allowance only
        ledger.approve(holder(), holder(), Amount::MAX).unwrap();
        ledger
            .transfer_from(holder(), holder(), holder(), Amount::MAX)
            .unwrap();
        assert_eq!(ledger.balance_of(holder()), Amount::MAX);
        assert_eq!(ledger.allowance(holder(), holder()), Amount::zero());

        let err = ledger.mint(recipient(), Amount::one()).unwrap_err();
        assert!(matches!(err, Error::Overflow));
        assert_eq!(ledger.total_supply(), Amount::MAX);

        let err = ledger
            .decrease_allowance(holder(), AccountId::ZERO, Amount::one())
            .unwrap_err();
        assert!(matches!(err, Error::AllowanceUnderflow { .. }));
        ledger.check_supply_invariant().unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_handles_serialize() {
        let metrics = Metrics::new().unwrap();
        let (handle, task) = spawn_ledger_actor(create_test_ledger(), 8, metrics.clone());

        // Fund four senders, then let them pay each other concurrently
        for n in 2..=5u64 {
            handle
                .transfer(holder(), AccountId::from_low_u64(n), Amount::from(20))
                .await
                .unwrap();
        }

        let mut workers = Vec::new();
        for n in 2..=5u64 {
            let handle = handle.clone();
            workers.push(tokio::spawn(async move {
                let from = AccountId::from_low_u64(n);
                let to = AccountId::from_low_u64(if n == 5 { 2 } else { n + 1 });
                for _ in 0..10 {
                    let _ = handle.transfer(from, to, Amount::from(3)).await;
                }
            }));
        }
        for worker in workers {
            worker.await.unwrap();
        }

        handle.check_supply_invariant().await.unwrap();
        assert_eq!(handle.total_supply().await.unwrap(), Amount::from(100));

        let events = handle.drain_events().await.unwrap();
        let committed = metrics
            .operations_total
            .with_label_values(&["transfer"])
            .get();
        // genesis mint + every committed transfer
        assert_eq!(events.len() as u64, committed + 1);

        handle.shutdown().await.unwrap();
        let ledger = task.await.unwrap();
        assert!(ledger.events().is_empty());
    }
}
